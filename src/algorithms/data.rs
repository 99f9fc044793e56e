//! Extraction and pre-processing jobs.

use crate::dataset::preprocess::{coerce_column, derive_offset_column};
use crate::dataset::{DType, Dataset};
use crate::error::FederationError;
use crate::executor::types::JobArgs;

pub const DEFAULT_OFFSET: f64 = 10.0;

pub fn read_csv(args: &JobArgs) -> Result<Dataset, FederationError> {
    let uri = args.str("database_uri")?;
    let dataset = crate::dataset::read_csv(uri)?;
    tracing::debug!(uri, rows = dataset.row_count(), "Extracted dataset");
    Ok(dataset)
}

/// Casts `column` to `dtype`.
pub fn pre_process(dataset: Dataset, args: &JobArgs) -> Result<Dataset, FederationError> {
    let column = args.str("column")?;
    let dtype: DType = args.str("dtype")?.parse()?;
    Ok(coerce_column(dataset, column, dtype)?)
}

/// Adds `new_column = column + offset`.
pub fn pre_process2(dataset: Dataset, args: &JobArgs) -> Result<Dataset, FederationError> {
    let column = args.str("column")?;
    let new_column = args.str("new_column")?;
    let offset = args.f64_or("offset", DEFAULT_OFFSET)?;
    Ok(derive_offset_column(dataset, column, new_column, offset)?)
}
