//! Local Dataset Module
//!
//! The node's private tabular data and the steps that prepare it for a partial job.
//!
//! ## Workflow
//! 1. **Extraction**: `read_csv` turns a source locator into a `Dataset`.
//! 2. **Pre-processing**: explicit transformations (`coerce_column`, `derive_offset_column`)
//!    that consume a dataset and return the transformed one. Pure functions of their input,
//!    no I/O.
//! 3. **Consumption**: partial executors read the dataset and return only aggregates.
//!
//! A `Dataset` is owned by the node runtime for the duration of one run; it is never
//! serialized into a task result.

pub mod error;
pub mod extract;
pub mod preprocess;
pub mod types;

pub use error::DatasetError;
pub use extract::read_csv;
pub use types::{Column, DType, Dataset, Value};

#[cfg(test)]
mod tests;
