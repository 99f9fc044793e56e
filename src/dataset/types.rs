use super::error::DatasetError;
use std::fmt;
use std::str::FromStr;

/// One cell of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::Null => f.write_str("null"),
        }
    }
}

/// Column element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Int,
    Float,
    Text,
}

impl FromStr for DType {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "int64" | "int32" | "integer" => Ok(DType::Int),
            "float" | "float64" | "float32" | "double" => Ok(DType::Float),
            "str" | "string" | "object" | "text" => Ok(DType::Text),
            other => Err(DatasetError::UnsupportedDType(other.to_string())),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Int => "int64",
            DType::Float => "float64",
            DType::Text => "object",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: DType,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: DType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn ints(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self::new(name, DType::Int, values.into_iter().map(Value::Int).collect())
    }

    pub fn floats(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(name, DType::Float, values.into_iter().map(Value::Float).collect())
    }

    pub fn texts<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            name,
            DType::Text,
            values.into_iter().map(|v| Value::Text(v.into())).collect(),
        )
    }

    /// Number of rows, nulls included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Integer sum of the non-null values.
    ///
    /// Float sums are truncated toward zero after summation. Text columns fail.
    pub fn integer_sum(&self) -> Result<i64, DatasetError> {
        match self.dtype {
            DType::Int => self.values.iter().try_fold(0i64, |acc, value| match value {
                Value::Int(v) => acc.checked_add(*v).ok_or_else(|| self.type_error("integer sum overflows i64")),
                Value::Null => Ok(acc),
                other => Err(self.type_error(&format!("unexpected value '{}' in int column", other))),
            }),
            DType::Float => {
                let mut total = 0f64;
                for value in &self.values {
                    match value {
                        Value::Float(v) => total += v,
                        Value::Int(v) => total += *v as f64,
                        Value::Null => {}
                        Value::Text(v) => {
                            return Err(self.type_error(&format!("non-numeric value '{}'", v)));
                        }
                    }
                }
                if !total.is_finite() || total.abs() >= i64::MAX as f64 {
                    return Err(self.type_error("sum cannot be represented as an integer"));
                }
                Ok(total.trunc() as i64)
            }
            DType::Text => Err(self.type_error("values are not numeric")),
        }
    }

    /// Floating point sum of the non-null values.
    pub fn float_sum(&self) -> Result<f64, DatasetError> {
        if self.dtype == DType::Text {
            return Err(self.type_error("values are not numeric"));
        }
        self.values.iter().try_fold(0f64, |acc, value| match value {
            Value::Int(v) => Ok(acc + *v as f64),
            Value::Float(v) => Ok(acc + v),
            Value::Null => Ok(acc),
            Value::Text(v) => Err(self.type_error(&format!("non-numeric value '{}'", v))),
        })
    }

    fn type_error(&self, message: &str) -> DatasetError {
        DatasetError::IncompatibleType {
            column: self.name.clone(),
            message: message.to_string(),
        }
    }
}

/// A node's private table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dataset, checking that names are unique and all columns have the same length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let mut dataset = Self::new();
        for column in columns {
            dataset.push_column(column)?;
        }
        Ok(dataset)
    }

    pub fn push_column(&mut self, column: Column) -> Result<(), DatasetError> {
        if self.has_column(&column.name) {
            return Err(DatasetError::DuplicateColumn(column.name));
        }
        if let Some(first) = self.columns.first()
            && first.len() != column.len()
        {
            return Err(DatasetError::RowCountMismatch {
                expected: first.len(),
                found: column.len(),
                column: column.name,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Inserts `column`, replacing an existing column of the same name in place.
    pub fn set_column(&mut self, column: Column) -> Result<(), DatasetError> {
        let expected = self.row_count();
        if !self.columns.is_empty() && column.len() != expected {
            return Err(DatasetError::RowCountMismatch {
                expected,
                found: column.len(),
                column: column.name,
            });
        }
        match self.columns.iter_mut().find(|existing| existing.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    pub fn column(&self, name: &str) -> Result<&Column, DatasetError> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .ok_or_else(|| DatasetError::MissingColumn {
                column: name.to_string(),
            })
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Result<&mut Column, DatasetError> {
        self.columns
            .iter_mut()
            .find(|column| column.name == name)
            .ok_or_else(|| DatasetError::MissingColumn {
                column: name.to_string(),
            })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }
}
