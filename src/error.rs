use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Failure while reading the dataset source at startup.
///
/// Never reaches a caller of [`crate::reader::load`]; it is logged there and the
/// table falls back to empty.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed JSON dataset: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed parquet dataset: {0}")]
    Parquet(#[from] ParquetError),
    #[error(transparent)]
    Arrow(#[from] ArrowError),
    #[error("unsupported dataset format for '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },
}

/// Failure while answering a single question.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("column '{0}' not found")]
    MissingColumn(String),
    #[error("column '{column}' is not {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
    },
    #[error(transparent)]
    Arrow(#[from] ArrowError),
}
