//! Orchestrator Module
//!
//! The central role of a federated job: fan a task out to the target organizations,
//! wait for every run to finish, and fold the partial results into one answer.
//!
//! ## Flow
//! ```text
//! Orchestrator::run
//!   -> Dispatcher::dispatch      (one task, exactly the targets asked for)
//!   -> queue                     (runs execute on the nodes, out of our control)
//!   -> Aggregator::await_and_combine
//!        -> wait_for_results     (poll until every run is terminal)
//!        -> combine_reports      (partial-failure policy, then Combine::combine once)
//! ```
//!
//! ## Combining
//! Partials arrive in no particular order, so every `Combine` implementation must be
//! associative and commutative over its inputs. A combiner that can live with missing
//! targets says so through `tolerates_missing`; the result then lists the excluded
//! targets instead of hiding them.
//!
//! Dropping a pending `await_and_combine` abandons the wait. It does not cancel the
//! remote runs.

pub mod aggregator;
pub mod combine;
pub mod dispatcher;
pub mod orchestrator;

pub use aggregator::Aggregator;
pub use combine::{
    AverageCombiner, CollectCombiner, Combine, CombinedResult, GapTolerant, GlobalResult,
    SumCombiner, TargetResult,
};
pub use dispatcher::Dispatcher;
pub use orchestrator::{CentralContext, FederatedJob, Orchestrator};

#[cfg(test)]
mod tests;
