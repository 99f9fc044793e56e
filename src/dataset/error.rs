#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("column '{column}' not found in dataset")]
    MissingColumn { column: String },

    #[error("column '{column}' has an incompatible type: {message}")]
    IncompatibleType { column: String, message: String },

    #[error("column '{column}' has {found} rows, dataset has {expected}")]
    RowCountMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("unsupported dtype '{0}'")]
    UnsupportedDType(String),

    #[error("failed to read '{locator}': {message}")]
    Read { locator: String, message: String },
}
