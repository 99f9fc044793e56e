use crate::collaboration::types::{OrganizationId, SessionId};
use crate::error::FederationError;
use crate::executor::types::JobArgs;
use crate::orchestrator::{AverageCombiner, CombinedResult, FederatedJob, Orchestrator};
use crate::orchestrator::orchestrator::CentralContext;
use crate::queue::types::{PartialResult, TaskInput};

use serde_json::Value;
use std::collections::BTreeSet;

/// Global mean of `column` across `organizations` (all of them when `None`).
pub async fn average(
    orchestrator: &Orchestrator,
    column: &str,
    organizations: Option<BTreeSet<OrganizationId>>,
    session: Option<SessionId>,
    database: Option<String>,
    preprocessing: Vec<TaskInput>,
) -> Result<CombinedResult, FederationError> {
    let mut job = FederatedJob::new(TaskInput::new("federated_avg").arg(column))
        .targets(organizations)
        .session(session)
        .database(database);
    job.name = format!("average of {}", column);
    job.preprocessing = preprocessing;

    orchestrator.run(job, &AverageCombiner::default()).await
}

pub async fn central_average(args: JobArgs, context: CentralContext) -> Result<PartialResult, FederationError> {
    let column = args.str("column_name")?.to_string();
    let organizations = match args.get("organizations") {
        None => None,
        Some(value) => Some(parse_organizations(&args, value)?),
    };

    let combined = average(
        &context.orchestrator,
        &column,
        organizations,
        context.session,
        context.database,
        context.preprocessing,
    )
    .await?;
    Ok(combined.result)
}

fn parse_organizations(args: &JobArgs, value: &Value) -> Result<BTreeSet<OrganizationId>, FederationError> {
    let invalid = || FederationError::InvalidArguments {
        method: args.method().to_string(),
        message: "organizations must be a list of organization ids".to_string(),
    };
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|id| id.as_u64().map(OrganizationId).ok_or_else(invalid))
        .collect()
}
