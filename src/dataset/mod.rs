//! Tabular data loading
//!
//! Reads uploaded CSV files into a column-major dataset and keeps the most
//! recent one on disk for the schema-assignment step.

pub mod loader;
pub mod snapshot;
pub mod types;

pub use loader::{load, parse_csv_content};
pub use snapshot::{Snapshot, SnapshotStore};
pub use types::{Column, ColumnarDataset, Field, Row, Value};
