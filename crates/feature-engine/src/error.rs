//! Feature Pipeline Error Types

use thiserror::Error;

/// Errors while fitting or applying the feature transform
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// Target column absent from the dataset
    #[error("Target column '{0}' not found in dataset")]
    MissingTarget(String),

    /// Target cell is missing or not numeric
    #[error("Target column '{column}' has non-numeric value '{value}' at row {row}")]
    NonNumericTarget {
        column: String,
        row: usize,
        value: String,
    },

    /// Split fraction outside (0, 1)
    #[error("Test fraction {0} must lie strictly between 0 and 1")]
    InvalidTestFraction(f64),

    /// Split would leave train or test empty
    #[error("Splitting {rows} rows at test fraction {fraction} leaves an empty partition")]
    EmptyPartition { rows: usize, fraction: f64 },

    /// Transform requested before fit
    #[error("Pipeline has not been fitted; run fit_transform on training data first")]
    NotFitted,

    /// Input lacks a column recorded in the fitted state
    #[error("Column '{0}' expected by the fitted transform is absent")]
    MissingColumn(String),

    /// Cell kind does not match the column role
    #[error("Column '{column}' holds a {found} value, expected {expected}")]
    WrongKind {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Identifier columns must be dropped before fitting
    #[error("Identifier column '{0}' reached the feature pipeline")]
    IdentifierColumn(String),

    /// State could not be encoded for fingerprinting
    #[error("Encoding error: {0}")]
    Encoding(String),
}
