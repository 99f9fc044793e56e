//! Pre-processing transformations.
//!
//! Each step consumes the dataset and returns the transformed one, so every change to a
//! node's data is an explicit value passed from step to step.

use super::error::DatasetError;
use super::types::{Column, DType, Dataset, Value};

/// Casts `column` to `dtype`.
///
/// Floats cast to int are truncated toward zero. Nulls cannot become ints.
pub fn coerce_column(mut dataset: Dataset, column: &str, dtype: DType) -> Result<Dataset, DatasetError> {
    let target = dataset.column_mut(column)?;
    if target.dtype == dtype {
        return Ok(dataset);
    }

    let values = target
        .values
        .iter()
        .map(|value| cast(value, dtype, column))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(column, from = %target.dtype, to = %dtype, "Coerced column");
    target.values = values;
    target.dtype = dtype;
    Ok(dataset)
}

/// Adds (or replaces) `new_column` as `column + offset`.
///
/// Stays integer when the source is integer and the offset is a whole number.
pub fn derive_offset_column(
    mut dataset: Dataset,
    column: &str,
    new_column: &str,
    offset: f64,
) -> Result<Dataset, DatasetError> {
    let source = dataset.column(column)?;
    let integral = source.dtype == DType::Int && offset.fract() == 0.0;

    let values = source
        .values
        .iter()
        .map(|value| match value {
            Value::Null => Ok(Value::Null),
            Value::Int(v) if integral => v
                .checked_add(offset as i64)
                .map(Value::Int)
                .ok_or_else(|| type_error(column, "integer overflow")),
            Value::Int(v) => Ok(Value::Float(*v as f64 + offset)),
            Value::Float(v) => Ok(Value::Float(v + offset)),
            Value::Text(v) => Err(type_error(column, &format!("cannot add a number to '{}'", v))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let dtype = if integral { DType::Int } else { DType::Float };
    dataset.set_column(Column::new(new_column, dtype, values))?;

    tracing::debug!(column, new_column, offset, "Derived column");
    Ok(dataset)
}

fn cast(value: &Value, dtype: DType, column: &str) -> Result<Value, DatasetError> {
    match (value, dtype) {
        (Value::Null, DType::Int) => Err(type_error(column, "cannot cast null to int")),
        (Value::Null, _) => Ok(Value::Null),

        (Value::Int(v), DType::Int) => Ok(Value::Int(*v)),
        (Value::Float(v), DType::Int) => {
            if v.is_finite() && v.abs() < i64::MAX as f64 {
                Ok(Value::Int(v.trunc() as i64))
            } else {
                Err(type_error(column, &format!("cannot cast {} to int", v)))
            }
        }
        (Value::Text(v), DType::Int) => v
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| type_error(column, &format!("cannot cast '{}' to int", v))),

        (Value::Int(v), DType::Float) => Ok(Value::Float(*v as f64)),
        (Value::Float(v), DType::Float) => Ok(Value::Float(*v)),
        (Value::Text(v), DType::Float) => v
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| type_error(column, &format!("cannot cast '{}' to float", v))),

        (other, DType::Text) => Ok(Value::Text(other.to_string())),
    }
}

fn type_error(column: &str, message: &str) -> DatasetError {
    DatasetError::IncompatibleType {
        column: column.to_string(),
        message: message.to_string(),
    }
}
