use super::aggregator::Aggregator;
use super::combine::{Combine, CombinedResult};
use super::dispatcher::Dispatcher;
use crate::collaboration::types::{OrganizationId, SessionId};
use crate::error::FederationError;
use crate::executor::registry::JobRegistry;
use crate::queue::TaskQueue;
use crate::queue::types::{NewTask, TaskInput};

use std::collections::BTreeSet;
use std::sync::Arc;

/// A federated job as the orchestrator's caller describes it.
#[derive(Debug, Clone)]
pub struct FederatedJob {
    pub name: String,
    pub input: TaskInput,
    pub preprocessing: Vec<TaskInput>,
    /// `None` targets every organization of the collaboration.
    pub targets: Option<BTreeSet<OrganizationId>>,
    pub session: Option<SessionId>,
    pub database: Option<String>,
}

impl FederatedJob {
    pub fn new(input: TaskInput) -> Self {
        Self {
            name: input.method.clone(),
            input,
            preprocessing: Vec::new(),
            targets: None,
            session: None,
            database: None,
        }
    }

    pub fn targets(mut self, targets: Option<BTreeSet<OrganizationId>>) -> Self {
        self.targets = targets;
        self
    }

    pub fn session(mut self, session: Option<SessionId>) -> Self {
        self.session = session;
        self
    }

    pub fn database(mut self, database: Option<String>) -> Self {
        self.database = database;
        self
    }

    pub fn preprocess(mut self, step: TaskInput) -> Self {
        self.preprocessing.push(step);
        self
    }
}

/// Dispatch, wait, combine.
pub struct Orchestrator {
    queue: Arc<dyn TaskQueue>,
    dispatcher: Dispatcher,
    aggregator: Aggregator,
}

impl Orchestrator {
    pub fn new(queue: Arc<dyn TaskQueue>, registry: Arc<JobRegistry>) -> Self {
        Self {
            dispatcher: Dispatcher::new(queue.clone(), registry),
            aggregator: Aggregator::new(queue.clone()),
            queue,
        }
    }

    pub fn with_aggregator(mut self, aggregator: Aggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Every organization taking part in the collaboration.
    pub async fn discover_targets(&self) -> Result<BTreeSet<OrganizationId>, FederationError> {
        let organizations = self.queue.list_organizations().await?;
        Ok(organizations.into_iter().collect())
    }

    pub async fn run<C: Combine + ?Sized>(
        &self,
        job: FederatedJob,
        combine: &C,
    ) -> Result<CombinedResult, FederationError> {
        let targets = match job.targets {
            Some(targets) => targets,
            None => self.discover_targets().await?,
        };

        let handle = self
            .dispatcher
            .dispatch(NewTask {
                name: job.name,
                description: String::new(),
                targets,
                input: job.input,
                preprocessing: job.preprocessing,
                database: job.database,
                session: job.session,
            })
            .await?;

        let combined = self.aggregator.await_and_combine(&handle, combine).await?;
        tracing::info!(
            task_id = %handle.task_id,
            contributors = combined.contributors.len(),
            excluded = combined.excluded.len(),
            "Combined partial results"
        );
        Ok(combined)
    }
}

/// What a central job runs with: an orchestrator plus the context of the task that
/// started it, so the federated jobs it dispatches see the same data.
#[derive(Clone)]
pub struct CentralContext {
    pub orchestrator: Arc<Orchestrator>,
    pub session: Option<SessionId>,
    pub database: Option<String>,
    pub preprocessing: Vec<TaskInput>,
}
