//! CSV extraction.
//!
//! A thin adapter from a source locator to a `Dataset`. Column types are inferred from
//! the whole column: all integers gives `Int`, all numbers gives `Float`, anything else
//! `Text`. Empty cells become nulls and do not affect inference.

use super::error::DatasetError;
use super::types::{Column, DType, Dataset, Value};
use std::io::Read;

/// Reads a CSV file with a header row. `file://` prefixes are accepted.
pub fn read_csv(database_uri: &str) -> Result<Dataset, DatasetError> {
    let path = database_uri.strip_prefix("file://").unwrap_or(database_uri);
    let file = std::fs::File::open(path).map_err(|e| DatasetError::Read {
        locator: database_uri.to_string(),
        message: e.to_string(),
    })?;

    let dataset = read_csv_from(file, database_uri)?;
    tracing::debug!(
        source = %database_uri,
        rows = dataset.row_count(),
        columns = ?dataset.column_names(),
        "Extracted dataset"
    );
    Ok(dataset)
}

/// Reads CSV content from any reader. `locator` is only used in error messages.
pub fn read_csv_from<R: Read>(reader: R, locator: &str) -> Result<Dataset, DatasetError> {
    let read_error = |e: csv::Error| DatasetError::Read {
        locator: locator.to_string(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .map_err(read_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(read_error)?;
        for (index, column) in cells.iter_mut().enumerate() {
            column.push(record.get(index).unwrap_or("").to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| infer_column(name, raw))
        .collect();

    Dataset::from_columns(columns)
}

fn infer_column(name: String, raw: Vec<String>) -> Column {
    let present = || raw.iter().filter(|cell| !cell.is_empty());

    let dtype = if present().all(|cell| cell.parse::<i64>().is_ok()) {
        DType::Int
    } else if present().all(|cell| cell.parse::<f64>().is_ok()) {
        DType::Float
    } else {
        DType::Text
    };

    let values = raw
        .into_iter()
        .map(|cell| {
            if cell.is_empty() {
                return Value::Null;
            }
            match dtype {
                DType::Int => cell.parse().map(Value::Int).unwrap_or(Value::Null),
                DType::Float => cell.parse().map(Value::Float).unwrap_or(Value::Null),
                DType::Text => Value::Text(cell),
            }
        })
        .collect();

    Column::new(name, dtype, values)
}
