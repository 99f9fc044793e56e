//! Error taxonomy of the federated computation core.

use crate::collaboration::types::OrganizationId;
use crate::dataset::error::DatasetError;
use crate::executor::types::JobKind;
use crate::queue::error::QueueError;
use crate::queue::types::TaskId;
use std::collections::BTreeMap;
use std::time::Duration;

/// Task creation failed, either locally (validation) or at the queue.
///
/// Never retried by this crate; the caller decides.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("a task needs at least one target organization")]
    EmptyTargets,

    #[error("method '{0}' is not registered")]
    UnknownMethod(String),

    #[error("method '{method}' is a {kind} job and cannot be dispatched to nodes")]
    NotDispatchable { method: String, kind: JobKind },

    #[error("invalid arguments for '{method}': {message}")]
    InvalidArguments { method: String, message: String },

    #[error("task queue rejected creation")]
    Rejected(#[source] QueueError),
}

/// Errors surfaced by partial executors, the aggregator and the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum FederationError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A required column is absent from the node's dataset.
    #[error("column '{column}' not found in dataset")]
    MissingColumn { column: String },

    /// A column holds values of a type the job cannot use.
    #[error("column '{column}' has an incompatible type: {message}")]
    IncompatibleType { column: String, message: String },

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("method '{0}' is not registered")]
    UnknownMethod(String),

    #[error("invalid arguments for '{method}': {message}")]
    InvalidArguments { method: String, message: String },

    #[error("failed to encode result: {0}")]
    Encode(String),

    /// One or more targets finished in `error` instead of `done`.
    #[error("{} target(s) did not produce a result: {}", failed.len(), format_failed(failed))]
    PartialFailure {
        failed: BTreeMap<OrganizationId, String>,
    },

    #[error("target {target} returned a malformed partial result: {message}")]
    MalformedPartial {
        target: OrganizationId,
        message: String,
    },

    /// The combined count over all partials is zero.
    #[error("no rows contributed to the aggregate")]
    EmptyAggregate,

    #[error("gave up waiting for task {task_id} after {waited:?}")]
    WaitTimedOut { task_id: TaskId, waited: Duration },

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl FederationError {
    /// Targets named by a `PartialFailure`, empty for every other variant.
    pub fn failed_targets(&self) -> Vec<OrganizationId> {
        match self {
            FederationError::PartialFailure { failed } => failed.keys().copied().collect(),
            _ => Vec::new(),
        }
    }
}

impl From<DatasetError> for FederationError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::MissingColumn { column } => FederationError::MissingColumn { column },
            DatasetError::IncompatibleType { column, message } => {
                FederationError::IncompatibleType { column, message }
            }
            other => FederationError::Dataset(other.to_string()),
        }
    }
}

fn format_failed(failed: &BTreeMap<OrganizationId, String>) -> String {
    failed
        .iter()
        .map(|(target, reason)| format!("{} ({})", target, reason))
        .collect::<Vec<_>>()
        .join(", ")
}
