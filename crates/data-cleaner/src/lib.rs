//! Data Validation and Cleaning
//!
//! Confirms the raw schema and normalizes raw track rows into a clean dataset:
//! technical and identifier columns dropped, duplicates and incomplete rows
//! removed, booleans coerced to 0/1.

mod cleaner;
mod error;
mod validator;

pub use cleaner::{AbsentColumnPolicy, CleanerConfig, CleaningSteps, DataCleaner, TrackCleaner};
pub use error::SchemaError;
pub use validator::{
    ColumnRequirement, SchemaValidator, ValidationConfig, ValidationResult, NUMERIC_FEATURES,
};
