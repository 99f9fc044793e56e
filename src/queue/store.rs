//! In-Memory Task Queue
//!
//! A single-process implementation of `TaskQueue`. Tasks and runs live in `DashMap`s so
//! the orchestrator, the HTTP handlers and many node workers can use it concurrently.
//!
//! ## Responsibilities
//! - **Validation**: rejecting tasks with no targets, unknown targets, unknown sessions or
//!   an empty method name.
//! - **Fan-out**: creating exactly one run per target organization.
//! - **Leasing**: handing runs to workers with an expiring lease, so a crashed worker's
//!   run becomes claimable again (at-least-once execution).

use super::backend::TaskQueue;
use super::error::QueueError;
use super::types::*;
use crate::collaboration::types::{Collaboration, NodeId, OrganizationId};

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;

const DEFAULT_LEASE: Duration = Duration::from_secs(30);

pub struct InMemoryTaskQueue {
    collaboration: Collaboration,
    /// Immutable task definitions.
    tasks: DashMap<TaskId, Task>,
    /// Mutable per-target state. Structure: `Run ID -> RunEntry`.
    runs: DashMap<RunId, RunEntry>,
    /// Index of runs per task, in target order.
    task_runs: DashMap<TaskId, Vec<RunId>>,
    lease: Duration,
}

impl InMemoryTaskQueue {
    pub fn new(collaboration: Collaboration) -> Self {
        Self {
            collaboration,
            tasks: DashMap::new(),
            runs: DashMap::new(),
            task_runs: DashMap::new(),
            lease: DEFAULT_LEASE,
        }
    }

    /// Overrides the lease granted on claim and renewal.
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub fn collaboration(&self) -> &Collaboration {
        &self.collaboration
    }

    pub fn get_task(&self, task_id: &TaskId) -> Option<Task> {
        self.tasks.get(task_id).map(|task| task.clone())
    }

    pub fn get_run(&self, run_id: &RunId) -> Option<RunEntry> {
        self.runs.get(run_id).map(|run| run.clone())
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Counts runs per status: (pending, running, completed, failed).
    pub fn run_status_counts(&self) -> (usize, usize, usize, usize) {
        let mut pending = 0;
        let mut running = 0;
        let mut completed = 0;
        let mut failed = 0;

        for entry in self.runs.iter() {
            match entry.status {
                RunStatus::Pending => pending += 1,
                RunStatus::Running => running += 1,
                RunStatus::Completed => completed += 1,
                RunStatus::Failed { .. } => failed += 1,
            }
        }

        (pending, running, completed, failed)
    }

    fn validate(&self, request: &NewTask) -> Result<(), QueueError> {
        if request.targets.is_empty() {
            return Err(QueueError::EmptyTargets);
        }
        if request.input.method.trim().is_empty() {
            return Err(QueueError::Malformed("method name is empty".to_string()));
        }
        if let Some(step) = request
            .preprocessing
            .iter()
            .find(|step| step.method.trim().is_empty())
        {
            return Err(QueueError::Malformed(format!(
                "pre-processing step has an empty method name ({:?})",
                step
            )));
        }
        if let Some(unknown) = self.collaboration.first_unknown(request.targets.iter()) {
            return Err(QueueError::UnknownTarget(unknown));
        }
        if let Some(session) = &request.session
            && !self.collaboration.has_session(session)
        {
            return Err(QueueError::UnknownSession(session.clone()));
        }
        Ok(())
    }

    fn lease_deadline(&self) -> u64 {
        now_ms() + self.lease.as_millis() as u64
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn create_task(&self, request: NewTask) -> Result<TaskHandle, QueueError> {
        self.validate(&request)?;

        let task = Task::from_request(request);
        let task_id = task.id.clone();
        let created_at = task.created_at;

        let entries: Vec<RunEntry> = task
            .targets
            .iter()
            .map(|organization| RunEntry {
                run_id: RunId::new(),
                task_id: task_id.clone(),
                organization: *organization,
                status: RunStatus::Pending,
                result: None,
                assigned_to: None,
                created_at,
                lease_expires: None,
            })
            .collect();

        tracing::info!(
            task_id = %task_id,
            method = %task.input.method,
            targets = entries.len(),
            "Created task"
        );

        // Task definition first, so a worker never claims a run without one.
        self.task_runs.insert(
            task_id.clone(),
            entries.iter().map(|entry| entry.run_id.clone()).collect(),
        );
        self.tasks.insert(task_id.clone(), task);
        for entry in entries {
            self.runs.insert(entry.run_id.clone(), entry);
        }

        Ok(TaskHandle { task_id })
    }

    async fn poll(&self, task_id: &TaskId) -> Result<Vec<RunReport>, QueueError> {
        let run_ids = self
            .task_runs
            .get(task_id)
            .map(|ids| ids.clone())
            .ok_or_else(|| QueueError::UnknownTask(task_id.clone()))?;

        let mut reports = Vec::with_capacity(run_ids.len());
        for run_id in run_ids {
            if let Some(run) = self.runs.get(&run_id) {
                reports.push(RunReport {
                    target: run.organization,
                    status: run.status.clone(),
                    result: run.result.clone(),
                });
            }
        }

        Ok(reports)
    }

    async fn list_organizations(&self) -> Result<Vec<OrganizationId>, QueueError> {
        Ok(self.collaboration.organizations.iter().copied().collect())
    }

    async fn claim_run(
        &self,
        organization: OrganizationId,
        worker: &NodeId,
    ) -> Result<Option<ClaimedRun>, QueueError> {
        let now = now_ms();

        let mut candidates: Vec<(u64, RunId)> = self
            .runs
            .iter()
            .filter(|entry| entry.organization == organization && entry.is_claimable(now))
            .map(|entry| (entry.created_at, entry.key().clone()))
            .collect();
        candidates.sort();

        for (_, run_id) in candidates {
            let Some(mut run) = self.runs.get_mut(&run_id) else {
                continue;
            };

            // Another worker might have raced us between listing and locking.
            if !run.is_claimable(now_ms()) {
                continue;
            }

            let Some(task) = self.get_task(&run.task_id) else {
                tracing::warn!(run_id = %run_id, "Run without task definition, skipping");
                continue;
            };

            if run.status == RunStatus::Running {
                tracing::warn!(
                    run_id = %run_id,
                    previous = ?run.assigned_to,
                    "Lease expired, reassigning run"
                );
            }

            run.status = RunStatus::Running;
            run.assigned_to = Some(worker.clone());
            run.lease_expires = Some(self.lease_deadline());

            tracing::debug!(run_id = %run_id, organization = %organization, "Claimed run");

            return Ok(Some(ClaimedRun {
                run_id,
                organization,
                task,
            }));
        }

        Ok(None)
    }

    async fn renew_lease(&self, run_id: &RunId) -> Result<(), QueueError> {
        let mut run = self
            .runs
            .get_mut(run_id)
            .ok_or_else(|| QueueError::UnknownRun(run_id.clone()))?;

        if run.status != RunStatus::Running {
            return Err(QueueError::NotRunning {
                run_id: run_id.clone(),
                status: run.status.clone(),
            });
        }

        run.lease_expires = Some(self.lease_deadline());
        tracing::trace!(run_id = %run_id, "Renewed lease");
        Ok(())
    }

    async fn complete_run(
        &self,
        run_id: &RunId,
        worker: &NodeId,
        outcome: RunOutcome,
    ) -> Result<(), QueueError> {
        let mut run = self
            .runs
            .get_mut(run_id)
            .ok_or_else(|| QueueError::UnknownRun(run_id.clone()))?;

        if run.status != RunStatus::Running {
            return Err(QueueError::NotRunning {
                run_id: run_id.clone(),
                status: run.status.clone(),
            });
        }

        if run.assigned_to.as_ref() != Some(worker) {
            tracing::warn!(run_id = %run_id, worker = %worker, "Outcome from a worker that lost the run");
            return Err(QueueError::NotAssigned {
                run_id: run_id.clone(),
                worker: worker.clone(),
            });
        }

        match outcome {
            RunOutcome::Completed { result } => {
                run.status = RunStatus::Completed;
                run.result = Some(result);
                tracing::info!(run_id = %run_id, organization = %run.organization, "Run completed");
            }
            RunOutcome::Failed { error } => {
                tracing::error!(
                    run_id = %run_id,
                    organization = %run.organization,
                    error = %error,
                    "Run failed"
                );
                run.status = RunStatus::Failed { error };
            }
        }
        run.lease_expires = None;

        Ok(())
    }
}
