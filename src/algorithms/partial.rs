//! Partial executors: one node's dataset in, a small aggregate out.

use crate::dataset::{DType, Dataset};
use crate::error::FederationError;
use crate::executor::types::JobArgs;
use crate::queue::types::PartialResult;

use serde_json::{Value, json};

/// `{"sum": Σ column}` as an integer, nulls skipped.
pub fn sum(dataset: &Dataset, args: &JobArgs) -> Result<PartialResult, FederationError> {
    let column = dataset.column(args.str("column")?)?;
    Ok(partial([("sum", json!(column.integer_sum()?))]))
}

/// `{"len": rows}`; nulls count as rows.
pub fn count(dataset: &Dataset, args: &JobArgs) -> Result<PartialResult, FederationError> {
    let column = dataset.column(args.str("column")?)?;
    Ok(partial([("len", json!(column.len()))]))
}

pub fn echo(_dataset: &Dataset, args: &JobArgs) -> Result<PartialResult, FederationError> {
    Ok(partial([("echo", args.value("input")?.clone())]))
}

/// Sufficient statistics for a mean: `{"len": rows, "data": Σ column}`.
///
/// `data` stays an integer for integer columns so the central sum is exact.
pub fn federated_avg(dataset: &Dataset, args: &JobArgs) -> Result<PartialResult, FederationError> {
    let column = dataset.column(args.str("column")?)?;
    let data = match column.dtype {
        DType::Int => json!(column.integer_sum()?),
        DType::Float | DType::Text => json!(column.float_sum()?),
    };
    Ok(partial([("len", json!(column.len())), ("data", data)]))
}

fn partial<const N: usize>(entries: [(&str, Value); N]) -> PartialResult {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
