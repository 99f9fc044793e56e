use super::types::{RunId, RunStatus, TaskId};
use crate::collaboration::types::{NodeId, OrganizationId, SessionId};

/// Failures reported by a `TaskQueue` implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueueError {
    #[error("task has no target organizations")]
    EmptyTargets,

    #[error("organization {0} is not part of the collaboration")]
    UnknownTarget(OrganizationId),

    #[error("session '{0}' is not known")]
    UnknownSession(SessionId),

    #[error("malformed task: {0}")]
    Malformed(String),

    #[error("task {0} not found")]
    UnknownTask(TaskId),

    #[error("run {0} not found")]
    UnknownRun(RunId),

    #[error("run {run_id} is not running (status: {status:?})")]
    NotRunning { run_id: RunId, status: RunStatus },

    /// The run's lease expired and it now belongs to another worker.
    #[error("run {run_id} is no longer assigned to worker {worker}")]
    NotAssigned { run_id: RunId, worker: NodeId },

    /// A remote queue answered with an error status.
    #[error("queue rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("queue unreachable: {0}")]
    Unreachable(String),
}

impl QueueError {
    /// Whether the error comes from request validation rather than transport or state.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            QueueError::EmptyTargets
                | QueueError::UnknownTarget(_)
                | QueueError::UnknownSession(_)
                | QueueError::Malformed(_)
                | QueueError::Rejected { .. }
        )
    }
}
