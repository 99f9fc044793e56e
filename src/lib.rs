//! Federated Computation Cluster Library
//!
//! Scatter-gather computation over private datasets: a central orchestrator dispatches the
//! same job to the nodes of several organizations, each node computes a small partial
//! statistic over its own data, and the orchestrator combines the partials into one answer.
//! Raw rows never leave a node.
//!
//! ## Architecture Modules
//!
//! - **`orchestrator`**: the central role. `Dispatcher` creates one task per call,
//!   `Aggregator` waits for every run and applies the partial-failure policy, `Combine`
//!   rules fold partials into a global result.
//! - **`executor`**: the node runtime. A `JobRegistry` maps method names to typed handlers
//!   tagged with a `JobKind`; the `TaskExecutor` claims runs and executes them under a lease.
//! - **`algorithms`**: the reference jobs (`sum`, `count`, `echo`, `federated_avg`,
//!   pre-processing steps, `network_probe`, `central_average`).
//! - **`probe`**: the network reachability probe and its scoped default timeout.
//! - **`queue`**: the task-queue contract (`TaskQueue`), an in-memory lease-based
//!   implementation, and its HTTP server and client.
//! - **`dataset`**: the node's tabular data, CSV extraction and pre-processing.
//! - **`collaboration`**, **`config`**, **`error`**: identities, configuration, error taxonomy.

pub mod algorithms;
pub mod collaboration;
pub mod config;
pub mod dataset;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod probe;
pub mod queue;
