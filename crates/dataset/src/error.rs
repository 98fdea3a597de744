//! Dataset Error Types

use crate::schema::ColumnKind;
use thiserror::Error;

/// Errors while building or loading a dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Source file problem
    #[error("Cannot read {path}: {message}")]
    Io { path: String, message: String },

    /// Source is not a CSV file
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// Malformed CSV content
    #[error("CSV error at line {line}: {message}")]
    Csv { line: u64, message: String },

    /// Cell does not parse as its declared kind
    #[error("Column '{column}' value '{value}' is not a valid {kind}{}", line_suffix(.line))]
    InvalidValue {
        column: String,
        value: String,
        kind: ColumnKind,
        /// Source line, when the cell came from a file
        line: Option<u64>,
    },

    /// Row width differs from the schema
    #[error("Row {row} has {actual} cells, schema declares {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

fn line_suffix(line: &Option<u64>) -> String {
    line.map(|l| format!(" (line {})", l)).unwrap_or_default()
}

impl DatasetError {
    /// Attach a source line to a cell parse failure
    pub(crate) fn at_line(self, at: u64) -> Self {
        match self {
            DatasetError::InvalidValue {
                column,
                value,
                kind,
                ..
            } => DatasetError::InvalidValue {
                column,
                value,
                kind,
                line: Some(at),
            },
            other => other,
        }
    }
}

impl From<csv::Error> for DatasetError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        DatasetError::Csv {
            line,
            message: err.to_string(),
        }
    }
}
