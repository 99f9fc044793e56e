use crate::collaboration::types::{NodeId, OrganizationId, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A partial result: the flat mapping one node returns for one run.
pub type PartialResult = serde_json::Map<String, serde_json::Value>;

/// Unique identifier of a task, assigned by the queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier of one (task, target) run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Method name plus the arguments it is invoked with.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskInput {
    pub method: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
    #[serde(default)]
    pub kwargs: serde_json::Map<String, serde_json::Value>,
}

impl TaskInput {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }
}

/// Request to create a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub targets: BTreeSet<OrganizationId>,
    pub input: TaskInput,
    /// Pre-processing steps applied on each node, in order, before `input` runs.
    #[serde(default)]
    pub preprocessing: Vec<TaskInput>,
    /// Label of the node-side database the partial operates on.
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub session: Option<SessionId>,
}

/// A stored task. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    pub targets: BTreeSet<OrganizationId>,
    pub input: TaskInput,
    pub preprocessing: Vec<TaskInput>,
    pub database: Option<String>,
    pub session: Option<SessionId>,
    /// Timestamp (ms) of creation.
    pub created_at: u64,
}

impl Task {
    pub fn from_request(request: NewTask) -> Self {
        Self {
            id: TaskId::new(),
            name: request.name,
            description: request.description,
            targets: request.targets,
            input: request.input,
            preprocessing: request.preprocessing,
            database: request.database,
            session: request.session,
            created_at: now_ms(),
        }
    }
}

/// Returned by task creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskHandle {
    pub task_id: TaskId,
}

/// Lifecycle state of one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RunStatus {
    /// Created, not yet picked up by a worker of the target organization.
    Pending,
    /// Claimed by a worker. Accompanied by a `lease_expires` timestamp in `RunEntry`.
    Running,
    /// The partial executor returned a result.
    Completed,
    /// The partial executor (or the node runtime) failed.
    Failed { error: String },
}

impl RunEntry {
    /// Pending runs, and Running runs whose lease has expired, can be claimed.
    pub fn is_claimable(&self, now: u64) -> bool {
        match self.status {
            RunStatus::Pending => true,
            RunStatus::Running => self.lease_expires.is_some_and(|lease| now > lease),
            _ => false,
        }
    }
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed { .. })
    }
}

/// Queue-side bookkeeping for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEntry {
    pub run_id: RunId,
    pub task_id: TaskId,
    pub organization: OrganizationId,
    pub status: RunStatus,
    pub result: Option<PartialResult>,
    /// The node currently processing this run (if Running).
    pub assigned_to: Option<NodeId>,
    /// Timestamp (ms) when the run was created.
    pub created_at: u64,
    /// Timestamp (ms) when the current lease expires.
    /// If `now > lease_expires`, the run is considered abandoned and can be reclaimed.
    pub lease_expires: Option<u64>,
}

/// What the orchestrator sees for one target when polling a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub target: OrganizationId,
    pub status: RunStatus,
    pub result: Option<PartialResult>,
}

/// A run handed to a node worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimedRun {
    pub run_id: RunId,
    pub organization: OrganizationId,
    pub task: Task,
}

/// Final report of a node worker for a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed { result: PartialResult },
    Failed { error: String },
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
