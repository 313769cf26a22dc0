//! Column access helpers shared by the filter and aggregation paths

use arrow::array::{Array, ArrayRef, Float64Array, RecordBatch, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;

use crate::error::QueryError;

/// Look up a column by name
pub fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, QueryError> {
    let idx = batch
        .schema()
        .fields()
        .iter()
        .position(|f| f.name() == name)
        .ok_or_else(|| QueryError::MissingColumn(name.to_string()))?;

    Ok(batch.column(idx))
}

/// Get a Utf8 column by name
pub fn get_str_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, QueryError> {
    column(batch, name)?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| QueryError::ColumnType {
            column: name.to_string(),
            expected: "Utf8",
        })
}

/// Get a numeric column by name as Float64, casting integer and decimal columns
pub fn get_f64_column(batch: &RecordBatch, name: &str) -> Result<Float64Array, QueryError> {
    let col = column(batch, name)?;

    if let Some(values) = col.as_any().downcast_ref::<Float64Array>() {
        return Ok(values.clone());
    }

    if !col.data_type().is_numeric() {
        return Err(QueryError::ColumnType {
            column: name.to_string(),
            expected: "numeric",
        });
    }

    let cast_array = cast(col, &DataType::Float64)?;

    cast_array
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| QueryError::ColumnType {
            column: name.to_string(),
            expected: "Float64",
        })
}

/// Lowercase every value of a string column, keeping nulls
pub fn lowercase(values: &StringArray) -> StringArray {
    values.iter().map(|v| v.map(str::to_lowercase)).collect()
}
