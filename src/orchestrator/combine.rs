//! Combination rules: partial results in, one global result out.

use crate::collaboration::types::OrganizationId;
use crate::error::FederationError;
use crate::queue::types::PartialResult;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};

/// The orchestrator's final answer, a flat mapping like `{"average": 3.0}`.
pub type GlobalResult = Map<String, Value>;

/// The partial result of one target that reached `done`.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetResult {
    pub target: OrganizationId,
    pub result: PartialResult,
}

/// A combination rule supplied by the job author.
///
/// `combine` receives exactly one entry per contributing target, in arbitrary order.
/// Implementations must give the same answer for every permutation.
pub trait Combine: Send + Sync {
    fn combine(&self, partials: &[TargetResult]) -> Result<GlobalResult, FederationError>;

    /// Whether the rule accepts a result set with failed targets left out.
    fn tolerates_missing(&self) -> bool {
        false
    }
}

/// What the aggregator hands back: the global result and who it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    pub result: GlobalResult,
    pub contributors: BTreeSet<OrganizationId>,
    /// Targets left out because they failed; only ever non-empty for gap-tolerant rules.
    pub excluded: BTreeMap<OrganizationId, String>,
}

impl CombinedResult {
    pub fn is_complete(&self) -> bool {
        self.excluded.is_empty()
    }
}

/// Sums an integer field across partials: `{"sum": 7}` + `{"sum": 5}` -> `{"sum": 12}`.
#[derive(Debug, Clone)]
pub struct SumCombiner {
    pub key: String,
}

impl SumCombiner {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Combine for SumCombiner {
    fn combine(&self, partials: &[TargetResult]) -> Result<GlobalResult, FederationError> {
        let mut total: i64 = 0;
        for partial in partials {
            let value = field(partial, &self.key)?
                .as_i64()
                .ok_or_else(|| malformed(partial, &format!("'{}' is not an integer", self.key)))?;
            total = total
                .checked_add(value)
                .ok_or_else(|| malformed(partial, "sum overflows i64"))?;
        }

        let mut result = GlobalResult::new();
        result.insert(self.key.clone(), json!(total));
        Ok(result)
    }
}

/// Mean from sufficient statistics: Σ`data` / Σ`len`.
#[derive(Debug, Clone)]
pub struct AverageCombiner {
    pub sum_key: String,
    pub count_key: String,
}

impl Default for AverageCombiner {
    fn default() -> Self {
        Self {
            sum_key: "data".to_string(),
            count_key: "len".to_string(),
        }
    }
}

impl Combine for AverageCombiner {
    fn combine(&self, partials: &[TargetResult]) -> Result<GlobalResult, FederationError> {
        // Integer sums are kept exact so the mean does not depend on arrival order.
        let mut exact: Option<i128> = Some(0);
        let mut terms = Vec::with_capacity(partials.len());
        let mut count: u64 = 0;
        for partial in partials {
            let data = field(partial, &self.sum_key)?;
            let value = data
                .as_f64()
                .ok_or_else(|| malformed(partial, &format!("'{}' is not a number", self.sum_key)))?;
            let integer = data.as_i64().map(i128::from).or_else(|| data.as_u64().map(i128::from));
            exact = match (exact, integer) {
                (Some(total), Some(v)) => total.checked_add(v),
                _ => None,
            };
            terms.push((partial.target, value));

            let len = field(partial, &self.count_key)?.as_u64().ok_or_else(|| {
                malformed(partial, &format!("'{}' is not a non-negative integer", self.count_key))
            })?;
            count = count
                .checked_add(len)
                .ok_or_else(|| malformed(partial, "count overflows u64"))?;
        }

        if count == 0 {
            return Err(FederationError::EmptyAggregate);
        }

        let sum = match exact {
            Some(total) => total as f64,
            None => {
                // Fractional sums are added in target order.
                terms.sort_by_key(|(target, _)| *target);
                terms.iter().map(|(_, value)| value).sum()
            }
        };

        let mut result = GlobalResult::new();
        result.insert("average".to_string(), json!(sum / count as f64));
        Ok(result)
    }
}

/// Gathers one field of every partial, keyed by target: `{"echo": {"1": .., "2": ..}}`.
#[derive(Debug, Clone)]
pub struct CollectCombiner {
    pub key: String,
}

impl CollectCombiner {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Combine for CollectCombiner {
    fn combine(&self, partials: &[TargetResult]) -> Result<GlobalResult, FederationError> {
        let mut collected = Map::new();
        for partial in partials {
            collected.insert(partial.target.to_string(), field(partial, &self.key)?.clone());
        }

        let mut result = GlobalResult::new();
        result.insert(self.key.clone(), Value::Object(collected));
        Ok(result)
    }
}

/// Wraps a rule so the aggregator proceeds without failed targets.
#[derive(Debug, Clone)]
pub struct GapTolerant<C>(pub C);

impl<C: Combine> Combine for GapTolerant<C> {
    fn combine(&self, partials: &[TargetResult]) -> Result<GlobalResult, FederationError> {
        self.0.combine(partials)
    }

    fn tolerates_missing(&self) -> bool {
        true
    }
}

fn field<'a>(partial: &'a TargetResult, key: &str) -> Result<&'a Value, FederationError> {
    partial
        .result
        .get(key)
        .ok_or_else(|| malformed(partial, &format!("missing key '{}'", key)))
}

fn malformed(partial: &TargetResult, message: &str) -> FederationError {
    FederationError::MalformedPartial {
        target: partial.target,
        message: message.to_string(),
    }
}
