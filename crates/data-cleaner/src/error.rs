//! Schema Error Types

use dataset::ColumnKind;
use thiserror::Error;

/// A column the cleaner or a later stage relies on is unusable
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Required column not present
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Column present with an unexpected kind
    #[error("Column '{column}' is {actual}, expected one of {expected:?}")]
    WrongKind {
        column: String,
        expected: Vec<ColumnKind>,
        actual: ColumnKind,
    },
}
