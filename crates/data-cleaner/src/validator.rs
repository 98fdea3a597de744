//! Raw Schema Validator

use crate::error::SchemaError;
use dataset::{ColumnKind, Schema, TARGET_COLUMN};
use serde::{Deserialize, Serialize};

/// Audio and structure columns every track must carry
pub const NUMERIC_FEATURES: [&str; 13] = [
    "duration_ms",
    "danceability",
    "energy",
    "key",
    "loudness",
    "mode",
    "speechiness",
    "acousticness",
    "instrumentalness",
    "liveness",
    "valence",
    "tempo",
    "time_signature",
];

/// A column that must be present with one of the allowed kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRequirement {
    pub name: String,
    pub kinds: Vec<ColumnKind>,
}

impl ColumnRequirement {
    pub fn new(name: impl Into<String>, kinds: &[ColumnKind]) -> Self {
        Self {
            name: name.into(),
            kinds: kinds.to_vec(),
        }
    }
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Columns the model relies on
    pub required: Vec<ColumnRequirement>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let mut required = vec![ColumnRequirement::new(TARGET_COLUMN, &[ColumnKind::Numeric])];
        required.extend(
            NUMERIC_FEATURES
                .iter()
                .map(|name| ColumnRequirement::new(*name, &[ColumnKind::Numeric])),
        );
        // Booleans are coerced to numeric by cleaning, so both are accepted.
        required.push(ColumnRequirement::new(
            "explicit",
            &[ColumnKind::Boolean, ColumnKind::Numeric],
        ));
        required.push(ColumnRequirement::new("track_genre", &[ColumnKind::Categorical]));
        Self { required }
    }
}

/// Result of validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether all required columns are usable
    pub valid: bool,
    /// List of schema problems
    pub errors: Vec<SchemaError>,
    /// Number of columns checked
    pub fields_checked: usize,
}

/// Confirms required columns and kinds before cleaning starts
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    config: ValidationConfig,
}

impl SchemaValidator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single requirement
    pub fn validate_column(
        &self,
        schema: &Schema,
        requirement: &ColumnRequirement,
    ) -> Result<(), SchemaError> {
        let actual = schema
            .kind_of(&requirement.name)
            .ok_or_else(|| SchemaError::MissingColumn(requirement.name.clone()))?;
        if requirement.kinds.contains(&actual) {
            Ok(())
        } else {
            Err(SchemaError::WrongKind {
                column: requirement.name.clone(),
                expected: requirement.kinds.clone(),
                actual,
            })
        }
    }

    /// Check every requirement and collect all problems
    pub fn validate(&self, schema: &Schema) -> ValidationResult {
        let errors: Vec<SchemaError> = self
            .config
            .required
            .iter()
            .filter_map(|req| self.validate_column(schema, req).err())
            .collect();
        ValidationResult {
            valid: errors.is_empty(),
            errors,
            fields_checked: self.config.required.len(),
        }
    }

    /// Fail on the first problem
    pub fn ensure(&self, schema: &Schema) -> Result<(), SchemaError> {
        match self.validate(schema).errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
