//! salesq: canned-question answering over an in-memory sales table.
//!
//! The dataset is loaded once into an Arrow [`RecordBatch`](arrow::array::RecordBatch)
//! and never mutated. Incoming questions are lowercased and matched against a
//! fixed, ordered rule list; the first matching rule runs one aggregation
//! (sum, mean, distinct count, or top-sale date) and yields a scalar answer.

pub mod aggregator;
pub mod answer;
pub mod config;
pub mod error;
pub mod filter;
pub mod query;
pub mod reader;
pub mod rules;
pub mod server;
pub mod table;
pub mod utils;

pub use answer::{Answer, QueryResponse};
pub use error::{LoadError, QueryError};
pub use query::QueryDispatcher;
pub use table::{SalesRecord, SalesTable};
