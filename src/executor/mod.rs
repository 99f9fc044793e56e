//! Job Execution Module
//!
//! Everything a data node needs to turn a claimed run into a partial result.
//!
//! ## Architecture Overview
//! The node runtime follows a **Pull-based** model with **Lease** management:
//! 1. **Claiming**: workers poll the task queue for runs addressed to their organization and
//!    claim one, which sets a lease expiration.
//! 2. **Resolution**: the run's method name is looked up in the `JobRegistry`. Each registered
//!    job carries a `JobKind` tag and an argument signature checked when it was registered.
//! 3. **Execution**: federated jobs get the node's dataset (extraction + pre-processing steps
//!    in declared order); diagnostic jobs run without data; central jobs get an orchestrator.
//! 4. **Completion**: the result, or the failure reason, is reported back to the queue while a
//!    sidecar renews the lease for long runs.
//!
//! ## Submodules
//! - **`types`**: job descriptors, argument signatures and bound arguments.
//! - **`registry`**: maps method names to typed handlers.
//! - **`executor`**: the worker pool and run lifecycle (claim -> run -> complete).

pub mod executor;
pub mod registry;
pub mod types;
