use super::error::QueueError;
use super::types::*;
use crate::collaboration::types::{NodeId, OrganizationId};

use async_trait::async_trait;

/// The task-queue collaborator.
///
/// It is the sole source of truth for task lifecycle: the orchestrator creates and
/// polls tasks through it, node workers claim and complete runs through it.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Creates one task with one run per target. Returns once the task is stored;
    /// does not wait for any target to start.
    async fn create_task(&self, task: NewTask) -> Result<TaskHandle, QueueError>;

    /// Current status of every run of a task, one report per target.
    async fn poll(&self, task_id: &TaskId) -> Result<Vec<RunReport>, QueueError>;

    /// Organizations participating in the collaboration this queue serves.
    async fn list_organizations(&self) -> Result<Vec<OrganizationId>, QueueError>;

    /// Claims the next available run for `organization`, if any.
    async fn claim_run(
        &self,
        organization: OrganizationId,
        worker: &NodeId,
    ) -> Result<Option<ClaimedRun>, QueueError>;

    /// Extends the lease of a running run.
    async fn renew_lease(&self, run_id: &RunId) -> Result<(), QueueError>;

    /// Records the terminal outcome of a run. Only the worker currently holding the run
    /// may complete it.
    async fn complete_run(
        &self,
        run_id: &RunId,
        worker: &NodeId,
        outcome: RunOutcome,
    ) -> Result<(), QueueError>;
}
