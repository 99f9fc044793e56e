//! Network Protocol Definitions
//!
//! Defines the Data Transfer Objects (DTOs) and endpoints of the queue server, used by the
//! orchestrator (create, poll) and by node workers (claim, renew, complete).

use super::error::QueueError;
use super::types::*;
use crate::collaboration::types::{NodeId, OrganizationId};
use serde::{Deserialize, Serialize};

pub const ENDPOINT_CREATE_TASK: &str = "/task";
pub const ENDPOINT_TASK_RUNS: &str = "/task/{id}/runs";
pub const ENDPOINT_ORGANIZATIONS: &str = "/organizations";
pub const ENDPOINT_CLAIM_RUN: &str = "/run/claim";
pub const ENDPOINT_RENEW_LEASE: &str = "/run/{id}/lease";
pub const ENDPOINT_COMPLETE_RUN: &str = "/run/{id}/complete";

/// Substitutes the `{id}` placeholder of an endpoint template.
pub fn endpoint_with_id(template: &str, id: &str) -> String {
    template.replace("{id}", id)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PollResponse {
    pub task_id: TaskId,
    pub runs: Vec<RunReport>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrganizationsResponse {
    pub organizations: Vec<OrganizationId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimRunRequest {
    pub organization: OrganizationId,
    pub worker: NodeId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimRunResponse {
    pub run: Option<ClaimedRun>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteRunRequest {
    pub worker: NodeId,
    pub outcome: RunOutcome,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&QueueError> for ErrorResponse {
    fn from(err: &QueueError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}
