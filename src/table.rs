//! The immutable in-memory sales table
//!
//! Rows are held column-wise in a single Arrow [`RecordBatch`]. The four text
//! columns used for matching (`product`, `city`, `region`, `rep`) are lowercased
//! once when the table is built; nothing else about the values is touched.

use std::sync::Arc;

use arrow::compute::cast;
use arrow_array::{Array, ArrayRef, Float64Array, RecordBatch, RecordBatchOptions, StringArray};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use serde::Deserialize;

use crate::error::LoadError;
use crate::utils::lowercase;

pub const PRODUCT: &str = "product";
pub const CITY: &str = "city";
pub const REGION: &str = "region";
pub const REP: &str = "rep";
pub const SALES: &str = "sales";
pub const DATE: &str = "date";

/// Columns a complete sales table carries, in schema order
pub const REQUIRED_COLUMNS: &[&str] = &[PRODUCT, CITY, REGION, REP, SALES, DATE];

/// Text columns that can appear in a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColumn {
    Product,
    City,
    Region,
    Rep,
}

impl TextColumn {
    pub fn name(self) -> &'static str {
        match self {
            TextColumn::Product => PRODUCT,
            TextColumn::City => CITY,
            TextColumn::Region => REGION,
            TextColumn::Rep => REP,
        }
    }

    fn is_text_column(name: &str) -> bool {
        matches!(name, PRODUCT | CITY | REGION | REP)
    }
}

/// One row of the source dataset, as it appears in the JSON file.
///
/// Every field is optional; a missing field becomes a null cell.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SalesRecord {
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub rep: Option<String>,
    #[serde(default)]
    pub sales: Option<f64>,
    #[serde(default, deserialize_with = "date_text")]
    pub date: Option<String>,
}

impl SalesRecord {
    pub fn new(
        product: &str,
        city: &str,
        region: &str,
        rep: &str,
        sales: f64,
        date: &str,
    ) -> Self {
        Self {
            product: Some(product.to_string()),
            city: Some(city.to_string()),
            region: Some(region.to_string()),
            rep: Some(rep.to_string()),
            sales: Some(sales),
            date: Some(date.to_string()),
        }
    }
}

/// Dates are opaque output values: strings pass through, anything else keeps its JSON text.
fn date_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Canonical schema of a fully populated table
pub fn sales_schema() -> SchemaRef {
    Arc::new(Schema::new(
        REQUIRED_COLUMNS
            .iter()
            .map(|name| Field::new(*name, canonical_type(name), true))
            .collect::<Vec<_>>(),
    ))
}

fn canonical_type(name: &str) -> DataType {
    if name == SALES {
        DataType::Float64
    } else {
        DataType::Utf8
    }
}

/// Read-only sales table shared by every request
#[derive(Debug, Clone)]
pub struct SalesTable {
    batch: RecordBatch,
}

impl SalesTable {
    /// A table with the full schema and no rows
    pub fn empty() -> Self {
        Self {
            batch: RecordBatch::new_empty(sales_schema()),
        }
    }

    /// Build a table from deserialized rows
    pub fn from_records(records: Vec<SalesRecord>) -> Result<Self, LoadError> {
        let product: StringArray = records.iter().map(|r| r.product.as_deref()).collect();
        let city: StringArray = records.iter().map(|r| r.city.as_deref()).collect();
        let region: StringArray = records.iter().map(|r| r.region.as_deref()).collect();
        let rep: StringArray = records.iter().map(|r| r.rep.as_deref()).collect();
        let sales: Float64Array = records.iter().map(|r| r.sales).collect();
        let date: StringArray = records.iter().map(|r| r.date.as_deref()).collect();

        let batch = RecordBatch::try_new(
            sales_schema(),
            vec![
                Arc::new(product),
                Arc::new(city),
                Arc::new(region),
                Arc::new(rep),
                Arc::new(sales),
                Arc::new(date),
            ],
        )?;

        Self::from_batch(batch)
    }

    /// Normalize an arbitrary batch into a sales table.
    ///
    /// Known columns are coerced to their canonical types and the text columns
    /// are lowercased. Unknown columns are dropped; absent columns stay absent.
    pub fn from_batch(batch: RecordBatch) -> Result<Self, LoadError> {
        let schema = batch.schema();
        let mut fields = Vec::with_capacity(REQUIRED_COLUMNS.len());
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(REQUIRED_COLUMNS.len());

        for name in REQUIRED_COLUMNS {
            let Ok(idx) = schema.index_of(name) else {
                continue;
            };
            let target = canonical_type(name);
            let mut column = batch.column(idx).clone();
            if column.data_type() != &target {
                column = cast(&column, &target)?;
            }
            if TextColumn::is_text_column(name) {
                if let Some(values) = column.as_any().downcast_ref::<StringArray>() {
                    column = Arc::new(lowercase(values));
                }
            }
            fields.push(Field::new(*name, target, true));
            columns.push(column);
        }

        let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
        let batch =
            RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options)?;

        Ok(Self { batch })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema().index_of(name).is_ok()
    }
}

impl Default for SalesTable {
    fn default() -> Self {
        Self::empty()
    }
}
