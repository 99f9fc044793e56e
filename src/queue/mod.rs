//! Task Queue Module
//!
//! The contract between the orchestrator, the nodes and the service that stores and
//! routes tasks, plus two implementations of it.
//!
//! ## Lifecycle
//! 1. **Creation**: a `NewTask` is validated against the `Collaboration` and stored as one
//!    immutable `Task` with one `Run` per target organization.
//! 2. **Claiming**: node workers pull `Pending` runs addressed to their organization and
//!    take a **lease** on them. A run whose lease expired is claimable again.
//! 3. **Completion**: the worker reports `Completed` with a partial result or `Failed` with
//!    a reason. Both are terminal.
//! 4. **Polling**: the orchestrator reads the per-target status of a task until every run
//!    is terminal.
//!
//! ## Submodules
//! - **`backend`**: the `TaskQueue` trait every implementation satisfies.
//! - **`store`**: in-process implementation backed by `DashMap`.
//! - **`client`**: HTTP implementation talking to a remote queue server.
//! - **`handlers`** / **`protocol`**: the HTTP surface of the queue server.

pub mod backend;
pub mod client;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod store;
pub mod types;

pub use backend::TaskQueue;
