use crate::error::FederationError;
use crate::executor::registry::NodeContext;
use crate::executor::types::JobArgs;
use crate::probe::{ProbeSettings, run_probe};
use crate::queue::types::PartialResult;

use serde_json::Value;
use std::time::Duration;

/// Runs the reachability probe against the node's configured proxy.
pub async fn network_probe(args: JobArgs, node: NodeContext) -> Result<PartialResult, FederationError> {
    let sleep = args.f64_or("sleep", 0.0)?;
    let sleep = Duration::try_from_secs_f64(sleep).map_err(|_| FederationError::InvalidArguments {
        method: args.method().to_string(),
        message: format!("sleep must be a non-negative number of seconds, got {}", sleep),
    })?;

    tracing::info!(organization = %node.organization, proxy = %node.proxy.display_address(), "Probing network");
    let report = run_probe(&ProbeSettings::new(node.proxy).with_sleep(sleep)).await;

    match serde_json::to_value(&report) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(FederationError::Encode(format!("probe report encoded as {}", other))),
        Err(e) => Err(FederationError::Encode(e.to_string())),
    }
}
