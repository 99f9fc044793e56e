//! Collaboration Module
//!
//! Identities of the parties taking part in a federated computation.
//!
//! ## Core Concepts
//! - **Organization**: an independently operated participant that holds a private dataset
//!   and runs partial jobs on request. Tasks are addressed to organizations.
//! - **Session**: binds a task to a shared dataset context across the participating nodes.
//! - **Collaboration**: the roster of organizations and sessions a task queue accepts work for.
//!   Task creation is validated against it so nothing is ever broadcast to unknown parties.
//! - **NodeId**: identity of one running node process (a worker host), used for run leases.

pub mod types;

#[cfg(test)]
mod tests;
