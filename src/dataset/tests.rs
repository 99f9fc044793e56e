//! Dataset Module Tests
//!
//! ## Test Scopes
//! - **Extraction**: CSV parsing and per-column type inference.
//! - **Aggregation helpers**: integer sums over typed columns.
//! - **Pre-processing**: coercion and derived columns, including their failure modes.

#[cfg(test)]
mod tests {
    use crate::dataset::extract::{read_csv, read_csv_from};
    use crate::dataset::preprocess::{coerce_column, derive_offset_column};
    use crate::dataset::{Column, DType, Dataset, DatasetError, Value};
    use std::io::Write;

    fn people() -> Dataset {
        Dataset::from_columns(vec![
            Column::texts("Name", ["ann", "bob", "cid"]),
            Column::ints("Age", [30, 41, 52]),
            Column::floats("Weight", [60.5, 70.25, 80.0]),
        ])
        .unwrap()
    }

    // ============================================================
    // EXTRACTION
    // ============================================================

    #[test]
    fn test_read_csv_infers_column_types() {
        let content = "Name,Age,Weight\nann,30,60.5\nbob,41,70\ncid,,80.1\n";

        let dataset = read_csv_from(content.as_bytes(), "inline").unwrap();

        assert_eq!(dataset.row_count(), 3);
        assert_eq!(dataset.column("Name").unwrap().dtype, DType::Text);
        assert_eq!(dataset.column("Age").unwrap().dtype, DType::Int);
        assert_eq!(dataset.column("Weight").unwrap().dtype, DType::Float);
        assert_eq!(dataset.column("Age").unwrap().values[2], Value::Null);
    }

    #[test]
    fn test_read_csv_from_file_uri() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Age\n1\n2\n3").unwrap();
        let uri = format!("file://{}", file.path().display());

        let dataset = read_csv(&uri).unwrap();

        assert_eq!(dataset.column("Age").unwrap().integer_sum().unwrap(), 6);
    }

    #[test]
    fn test_read_csv_missing_file_is_read_error() {
        let result = read_csv("/definitely/not/here.csv");

        assert!(matches!(result, Err(DatasetError::Read { .. })));
    }

    // ============================================================
    // SUMS
    // ============================================================

    #[test]
    fn test_integer_sum_skips_nulls() {
        let column = Column::new("x", DType::Int, vec![Value::Int(4), Value::Null, Value::Int(5)]);

        assert_eq!(column.integer_sum().unwrap(), 9);
        assert_eq!(column.len(), 3);
    }

    #[test]
    fn test_float_sum_truncates() {
        let column = Column::floats("x", [1.5, 2.25, -0.5]);

        assert_eq!(column.integer_sum().unwrap(), 3);
    }

    #[test]
    fn test_float_sum_keeps_fraction() {
        let column = Column::new("x", DType::Float, vec![Value::Float(1.5), Value::Null, Value::Float(2.25)]);

        assert_eq!(column.float_sum().unwrap(), 3.75);
    }

    #[test]
    fn test_text_sum_is_type_error() {
        let dataset = people();

        let result = dataset.column("Name").unwrap().integer_sum();

        assert!(matches!(result, Err(DatasetError::IncompatibleType { .. })));
    }

    #[test]
    fn test_missing_column() {
        let dataset = people();

        match dataset.column("Height") {
            Err(DatasetError::MissingColumn { column }) => assert_eq!(column, "Height"),
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn test_columns_must_have_equal_length() {
        let result = Dataset::from_columns(vec![Column::ints("a", [1, 2]), Column::ints("b", [1])]);

        assert!(matches!(result, Err(DatasetError::RowCountMismatch { .. })));
    }

    // ============================================================
    // PRE-PROCESSING
    // ============================================================

    #[test]
    fn test_coerce_float_to_int_truncates() {
        let dataset = coerce_column(people(), "Weight", DType::Int).unwrap();
        let weight = dataset.column("Weight").unwrap();

        assert_eq!(weight.dtype, DType::Int);
        assert_eq!(weight.values, vec![Value::Int(60), Value::Int(70), Value::Int(80)]);
    }

    #[test]
    fn test_coerce_int_to_text() {
        let dataset = coerce_column(people(), "Age", "str".parse().unwrap()).unwrap();

        assert_eq!(dataset.column("Age").unwrap().values[0], Value::Text("30".into()));
    }

    #[test]
    fn test_coerce_text_to_int_fails_on_words() {
        let result = coerce_column(people(), "Name", DType::Int);

        assert!(matches!(result, Err(DatasetError::IncompatibleType { .. })));
    }

    #[test]
    fn test_unknown_dtype() {
        assert!(matches!(
            "complex128".parse::<DType>(),
            Err(DatasetError::UnsupportedDType(_))
        ));
    }

    #[test]
    fn test_derive_offset_column() {
        let dataset = derive_offset_column(people(), "Age", "AgePlus", 10.0).unwrap();
        let derived = dataset.column("AgePlus").unwrap();

        assert_eq!(derived.dtype, DType::Int);
        assert_eq!(derived.values, vec![Value::Int(40), Value::Int(51), Value::Int(62)]);
        // Source column untouched
        assert_eq!(dataset.column("Age").unwrap().values[0], Value::Int(30));
    }

    #[test]
    fn test_derive_offset_column_replaces_existing() {
        let dataset = derive_offset_column(people(), "Age", "Age", 10.0).unwrap();

        assert_eq!(dataset.column_names(), vec!["Name", "Age", "Weight"]);
        assert_eq!(dataset.column("Age").unwrap().values[0], Value::Int(40));
    }

    #[test]
    fn test_derive_from_text_column_fails() {
        let result = derive_offset_column(people(), "Name", "Other", 10.0);

        assert!(matches!(result, Err(DatasetError::IncompatibleType { .. })));
    }
}
