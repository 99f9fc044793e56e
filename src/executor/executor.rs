//! Worker Pool Implementation
//!
//! Manages the lifecycle of run execution on a data node. It spawns background workers that
//! continuously poll the task queue for runs addressed to this node's organization.
//!
//! ## Responsibilities
//! - **Polling**: asking the queue for the next claimable run of our organization.
//! - **Lease Management**: a sidecar task renews the run's lease while it executes.
//! - **Execution**: resolving the method in the `JobRegistry` and running it against the
//!   node's dataset, its environment, or an orchestrator, depending on the job kind.

use super::registry::{JobHandler, JobRegistry, NodeContext, RegisteredJob};
use super::types::*;
use crate::collaboration::types::{NodeId, OrganizationId};
use crate::config::{DatabaseCatalog, ProxyConfig};
use crate::dataset::Dataset;
use crate::error::FederationError;
use crate::orchestrator::orchestrator::{CentralContext, Orchestrator};
use crate::queue::TaskQueue;
use crate::queue::error::QueueError;
use crate::queue::types::*;

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Method used to turn a database locator into the node's dataset.
pub const EXTRACTION_METHOD: &str = "read_csv";

/// The engine that drives run execution for one organization.
pub struct TaskExecutor {
    /// Source of runs.
    queue: Arc<dyn TaskQueue>,
    /// Registry containing the code for every method a run can name.
    registry: Arc<JobRegistry>,
    organization: OrganizationId,
    node_id: NodeId,
    proxy: ProxyConfig,
    catalog: DatabaseCatalog,
    /// Number of concurrent workers.
    worker_count: usize,
    /// Sleep between polls when the queue has nothing for us.
    idle_interval: Duration,
    /// Renewal period; must stay well below the queue's lease (30s).
    renew_interval: Duration,
}

impl TaskExecutor {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        registry: Arc<JobRegistry>,
        organization: OrganizationId,
        catalog: DatabaseCatalog,
        proxy: ProxyConfig,
        worker_count: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue,
            registry,
            organization,
            node_id: NodeId::new(),
            proxy,
            catalog,
            worker_count: worker_count.max(1),
            idle_interval: Duration::from_millis(100),
            renew_interval: Duration::from_secs(10),
        })
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn organization(&self) -> OrganizationId {
        self.organization
    }

    /// Spawns the worker tasks and returns immediately.
    /// Each worker runs independently in an infinite loop.
    pub async fn start(self: Arc<Self>) {
        tracing::info!(
            organization = %self.organization,
            node = %self.node_id,
            "Starting {} run workers",
            self.worker_count
        );

        for worker_id in 0..self.worker_count {
            let executor = self.clone();
            tokio::spawn(async move {
                executor.worker_loop(worker_id).await;
            });
        }
    }

    async fn worker_loop(self: Arc<Self>, worker_id: usize) {
        tracing::info!("Worker {} started", worker_id);

        loop {
            match self.run_once().await {
                Ok(true) => continue,
                Ok(false) => {
                    // Sleep if no work to avoid busy-waiting
                    tokio::time::sleep(self.idle_interval).await;
                }
                Err(e) => {
                    tracing::warn!("Worker {} failed to claim a run: {}", worker_id, e);
                    tokio::time::sleep(self.idle_interval * 10).await;
                }
            }
        }
    }

    /// Claims and executes at most one run. Returns whether a run was claimed.
    ///
    /// Central runs are detached from the calling worker: they wait on federated runs that may
    /// target this same node, so holding the worker slot would starve those runs. A detached
    /// run renews its own lease and reports its own outcome.
    pub async fn run_once(self: &Arc<Self>) -> Result<bool, QueueError> {
        let Some(claimed) = self.queue.claim_run(self.organization, &self.node_id).await? else {
            return Ok(false);
        };

        tracing::info!(
            run_id = %claimed.run_id,
            task_id = %claimed.task.id,
            method = %claimed.task.input.method,
            "Claimed run"
        );

        if self.registry.kind_of(&claimed.task.input.method) == Some(JobKind::Central) {
            tracing::debug!(run_id = %claimed.run_id, "Detaching central run from worker");
            let executor = self.clone();
            tokio::spawn(async move {
                executor.execute_with_lease(&claimed.run_id, &claimed.task).await;
            });
            return Ok(true);
        }

        self.execute_with_lease(&claimed.run_id, &claimed.task).await;
        Ok(true)
    }

    /// Wraps the actual execution with lease management.
    ///
    /// If the worker hangs the renewal stops with it and the run is eventually reclaimed.
    async fn execute_with_lease(&self, run_id: &RunId, task: &Task) {
        let renewal_handle = self.spawn_lease_renewal(run_id);

        let outcome = match self.execute_run(task).await {
            Ok(result) => RunOutcome::Completed { result },
            Err(e) => {
                tracing::warn!(run_id = %run_id, task_id = %task.id, "Run failed: {}", e);
                RunOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        renewal_handle.abort();

        match self.queue.complete_run(run_id, &self.node_id, outcome).await {
            Ok(()) => tracing::debug!(run_id = %run_id, "Run reported"),
            Err(e) => tracing::error!(run_id = %run_id, "Failed to report run: {}", e),
        }
    }

    fn spawn_lease_renewal(&self, run_id: &RunId) -> tokio::task::JoinHandle<()> {
        let queue = self.queue.clone();
        let run_id = run_id.clone();
        let interval = self.renew_interval;

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                match queue.renew_lease(&run_id).await {
                    Ok(()) => tracing::trace!(run_id = %run_id, "Renewed lease"),
                    Err(_) => {
                        // Run might have finished or been reassigned
                        tracing::trace!(run_id = %run_id, "Run no longer needs lease renewal");
                        break;
                    }
                }
            }
        })
    }

    /// Resolves the task's method and runs it according to its kind.
    pub async fn execute_run(&self, task: &Task) -> Result<PartialResult, FederationError> {
        let job = self
            .registry
            .get(&task.input.method)
            .ok_or_else(|| FederationError::UnknownMethod(task.input.method.clone()))?;
        let args = job.bind(&task.input)?;

        match &job.handler {
            JobHandler::Federated(partial) => {
                let dataset = self.prepare_dataset(task)?;
                tracing::debug!(
                    method = %task.input.method,
                    rows = dataset.row_count(),
                    "Running partial"
                );
                partial(&dataset, &args)
            }
            JobHandler::Diagnostic(diagnostic) => {
                let node = NodeContext {
                    organization: self.organization,
                    proxy: self.proxy.clone(),
                };
                diagnostic(args, node).await
            }
            JobHandler::Central(central) => {
                let orchestrator = Arc::new(Orchestrator::new(
                    self.queue.clone(),
                    self.registry.clone(),
                ));
                let context = CentralContext {
                    orchestrator,
                    session: task.session.clone(),
                    database: task.database.clone(),
                    preprocessing: task.preprocessing.clone(),
                };
                central(args, context).await
            }
            JobHandler::Extraction(_) | JobHandler::PreProcessing(_) => {
                Err(FederationError::InvalidArguments {
                    method: task.input.method.clone(),
                    message: format!("a {} job cannot run on its own", job.kind()),
                })
            }
        }
    }

    /// Extracts the task's database and applies its pre-processing steps in declared order.
    fn prepare_dataset(&self, task: &Task) -> Result<Dataset, FederationError> {
        let locator = self.catalog.resolve(task.database.as_deref())?;
        let extraction = self.registry.require(EXTRACTION_METHOD, JobKind::DataExtraction)?;
        let mut dataset = run_extraction(&extraction, locator)?;

        for step in &task.preprocessing {
            let job = self.registry.require(&step.method, JobKind::PreProcessing)?;
            let args = job.bind(step)?;
            if let JobHandler::PreProcessing(transform) = &job.handler {
                tracing::debug!(method = %step.method, "Applying pre-processing step");
                dataset = transform(dataset, &args)?;
            }
        }

        Ok(dataset)
    }
}

fn run_extraction(job: &RegisteredJob, locator: &str) -> Result<Dataset, FederationError> {
    let input = TaskInput::new(job.name.clone()).arg(Value::String(locator.to_string()));
    let args = job.bind(&input)?;
    match &job.handler {
        JobHandler::Extraction(extract) => extract(&args),
        _ => Err(FederationError::InvalidArguments {
            method: job.name.clone(),
            message: "is not an extraction job".to_string(),
        }),
    }
}
