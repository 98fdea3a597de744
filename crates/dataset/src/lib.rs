//! Track Dataset Model
//!
//! Provides the record and dataset types shared by the cleaning, feature and
//! inference crates (kept separate to avoid circular deps), plus CSV loading.

mod error;
pub mod fixtures;
mod loader;
mod observe;
mod record;
mod schema;
mod table;
mod value;

pub use error::DatasetError;
pub use loader::{read_csv, CsvFileLoader, DataLoader};
pub use observe::ObservabilitySink;
pub use record::Record;
pub use schema::{
    track_schema, Column, ColumnKind, Schema, DENYLISTED_COLUMNS, HIGH_CARDINALITY_COLUMNS,
    IDENTIFIER_COLUMN, TARGET_COLUMN,
};
pub use table::Dataset;
pub use value::Value;
