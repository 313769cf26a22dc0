//! Dataset loading: a JSON array of rows, or a Parquet file with column projection

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use arrow::array::RecordBatch;
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatchReader;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use tracing::{info, warn};

use crate::error::LoadError;
use crate::table::{SalesRecord, SalesTable, REQUIRED_COLUMNS};

const BATCH_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Parquet,
}

impl SourceFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(SourceFormat::Json),
            Some("parquet") | Some("pq") => Ok(SourceFormat::Parquet),
            _ => Err(LoadError::UnsupportedFormat {
                path: PathBuf::from(path),
            }),
        }
    }
}

/// Load the dataset, falling back to an empty table on any failure.
///
/// Never fails: a missing or malformed source is logged and yields a table with
/// no rows, so every question still gets a zero-like answer.
pub fn load(path: impl AsRef<Path>) -> SalesTable {
    let path = path.as_ref();
    match read_sales(path) {
        Ok(table) => {
            info!(rows = table.num_rows(), path = %path.display(), "dataset loaded");
            table
        }
        Err(e) => {
            warn!(path = %path.display(), "failed to load dataset, serving an empty table: {}", e);
            SalesTable::empty()
        }
    }
}

/// Read the dataset at `path`
pub fn read_sales(path: impl AsRef<Path>) -> Result<SalesTable, LoadError> {
    let path = path.as_ref();
    match SourceFormat::from_path(path)? {
        SourceFormat::Json => read_json(path),
        SourceFormat::Parquet => read_parquet(path),
    }
}

/// The source is a single JSON array of row objects
fn read_json(path: &Path) -> Result<SalesTable, LoadError> {
    let file = File::open(path)?;
    let records: Vec<SalesRecord> = serde_json::from_reader(BufReader::new(file))?;
    SalesTable::from_records(records)
}

/// Read the sales columns of a parquet file; columns it lacks are skipped
fn read_parquet(path: &Path) -> Result<SalesTable, LoadError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let parquet_schema = builder.parquet_schema();
    let arrow_schema = builder.schema().clone();

    let projection_indices: Vec<usize> = REQUIRED_COLUMNS
        .iter()
        .filter_map(|col_name| {
            arrow_schema
                .fields()
                .iter()
                .position(|f| f.name() == *col_name)
        })
        .collect();

    let projection = ProjectionMask::roots(parquet_schema, projection_indices);

    let reader = builder
        .with_projection(projection)
        .with_batch_size(BATCH_SIZE)
        .build()?;
    let schema = reader.schema();

    let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;
    let batch = concat_batches(&schema, &batches)?;

    SalesTable::from_batch(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_format_from_path() {
        assert_eq!(
            SourceFormat::from_path(Path::new("data/sales.json")).unwrap(),
            SourceFormat::Json
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("sales.PARQUET")).unwrap(),
            SourceFormat::Parquet
        );
        assert!(matches!(
            SourceFormat::from_path(Path::new("sales.csv")),
            Err(LoadError::UnsupportedFormat { .. })
        ));
        assert!(SourceFormat::from_path(Path::new("sales")).is_err());
    }

    #[test]
    fn test_missing_file_loads_empty_table() {
        let table = load("/nonexistent/q-fastapi-llm-query.json");
        assert!(table.is_empty());
        assert!(matches!(
            read_sales("/nonexistent/q-fastapi-llm-query.json"),
            Err(LoadError::Io(_))
        ));
    }
}
