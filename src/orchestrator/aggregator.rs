use super::combine::{Combine, CombinedResult, TargetResult};
use crate::error::FederationError;
use crate::queue::TaskQueue;
use crate::queue::types::{RunReport, RunStatus, TaskHandle};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Waits for a task's runs and folds their partial results.
#[derive(Clone)]
pub struct Aggregator {
    queue: Arc<dyn TaskQueue>,
    poll_interval: Duration,
    /// `None` waits as long as it takes.
    max_wait: Option<Duration>,
}

impl Aggregator {
    pub fn new(queue: Arc<dyn TaskQueue>) -> Self {
        Self {
            queue,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Polls until every run of the task is terminal.
    pub async fn wait_for_results(&self, handle: &TaskHandle) -> Result<Vec<RunReport>, FederationError> {
        let started = Instant::now();

        loop {
            let reports = self.queue.poll(&handle.task_id).await?;
            let pending = reports.iter().filter(|report| !report.status.is_terminal()).count();

            if !reports.is_empty() && pending == 0 {
                tracing::debug!(task_id = %handle.task_id, runs = reports.len(), "All runs finished");
                return Ok(reports);
            }

            let mut sleep = self.poll_interval;
            if let Some(max_wait) = self.max_wait {
                let waited = started.elapsed();
                if waited >= max_wait {
                    tracing::warn!(task_id = %handle.task_id, pending, "Gave up waiting for runs");
                    return Err(FederationError::WaitTimedOut {
                        task_id: handle.task_id.clone(),
                        waited,
                    });
                }
                sleep = sleep.min(max_wait - waited);
            }

            tracing::trace!(task_id = %handle.task_id, pending, "Waiting for runs");
            tokio::time::sleep(sleep).await;
        }
    }

    pub async fn await_and_combine<C: Combine + ?Sized>(
        &self,
        handle: &TaskHandle,
        combine: &C,
    ) -> Result<CombinedResult, FederationError> {
        let reports = self.wait_for_results(handle).await?;
        combine_reports(reports, combine)
    }
}

/// Applies the partial-failure policy to finished runs, then calls `combine` once.
///
/// Without `tolerates_missing`, any failed target fails the whole job with
/// `PartialFailure` naming every failed target.
pub fn combine_reports<C: Combine + ?Sized>(
    reports: Vec<RunReport>,
    combine: &C,
) -> Result<CombinedResult, FederationError> {
    let mut partials = Vec::with_capacity(reports.len());
    let mut failed = BTreeMap::new();

    for report in reports {
        match report.status {
            RunStatus::Completed => match report.result {
                Some(result) => partials.push(TargetResult {
                    target: report.target,
                    result,
                }),
                None if combine.tolerates_missing() => {
                    failed.insert(report.target, "completed without a result".to_string());
                }
                None => {
                    return Err(FederationError::MalformedPartial {
                        target: report.target,
                        message: "completed without a result".to_string(),
                    });
                }
            },
            RunStatus::Failed { error } => {
                failed.insert(report.target, error);
            }
            RunStatus::Pending | RunStatus::Running => {
                failed.insert(report.target, "run did not finish".to_string());
            }
        }
    }

    if !failed.is_empty() {
        if !combine.tolerates_missing() {
            return Err(FederationError::PartialFailure { failed });
        }
        tracing::warn!(
            excluded = ?failed.keys().collect::<Vec<_>>(),
            "Combining without failed targets"
        );
    }

    let contributors: BTreeSet<_> = partials.iter().map(|partial| partial.target).collect();
    let result = combine.combine(&partials)?;

    Ok(CombinedResult {
        result,
        contributors,
        excluded: failed,
    })
}
