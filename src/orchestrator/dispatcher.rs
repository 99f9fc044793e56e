use crate::collaboration::types::{OrganizationId, SessionId};
use crate::error::{DispatchError, FederationError};
use crate::executor::registry::JobRegistry;
use crate::executor::types::JobKind;
use crate::queue::TaskQueue;
use crate::queue::types::{NewTask, TaskHandle, TaskInput};

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Creates tasks on the queue after checking them against the local registry.
///
/// One call creates exactly one task, addressed to exactly the given targets. Nothing is
/// retried: a rejected or unreachable queue is returned to the caller as is.
#[derive(Clone)]
pub struct Dispatcher {
    queue: Arc<dyn TaskQueue>,
    registry: Arc<JobRegistry>,
}

impl Dispatcher {
    pub fn new(queue: Arc<dyn TaskQueue>, registry: Arc<JobRegistry>) -> Self {
        Self { queue, registry }
    }

    pub async fn dispatch(&self, task: NewTask) -> Result<TaskHandle, DispatchError> {
        if task.targets.is_empty() {
            return Err(DispatchError::EmptyTargets);
        }

        self.check(&task.input, &[JobKind::Federated, JobKind::Central])?;
        for step in &task.preprocessing {
            self.check(step, &[JobKind::PreProcessing])?;
        }

        let method = task.input.method.clone();
        let targets = task.targets.len();
        let handle = self.queue.create_task(task).await.map_err(|e| {
            tracing::warn!(method = %method, "Task creation failed: {}", e);
            DispatchError::Rejected(e)
        })?;

        tracing::info!(task_id = %handle.task_id, method = %method, targets, "Dispatched task");
        Ok(handle)
    }

    /// Shorthand for a task with no pre-processing, named after its method.
    pub async fn dispatch_method(
        &self,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
        targets: BTreeSet<OrganizationId>,
        session: Option<SessionId>,
    ) -> Result<TaskHandle, DispatchError> {
        self.dispatch(NewTask {
            name: method.to_string(),
            description: String::new(),
            targets,
            input: TaskInput {
                method: method.to_string(),
                args,
                kwargs,
            },
            preprocessing: Vec::new(),
            database: None,
            session,
        })
        .await
    }

    fn check(&self, input: &TaskInput, allowed: &[JobKind]) -> Result<(), DispatchError> {
        let job = self
            .registry
            .get(&input.method)
            .ok_or_else(|| DispatchError::UnknownMethod(input.method.clone()))?;

        if !allowed.contains(&job.kind()) {
            return Err(DispatchError::NotDispatchable {
                method: input.method.clone(),
                kind: job.kind(),
            });
        }

        job.bind(input).map(|_| ()).map_err(|e| match e {
            FederationError::InvalidArguments { method, message } => {
                DispatchError::InvalidArguments { method, message }
            }
            other => DispatchError::InvalidArguments {
                method: input.method.clone(),
                message: other.to_string(),
            },
        })
    }
}
