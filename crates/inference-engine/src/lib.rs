//! Popularity Inference Engine
//!
//! Replays a persisted feature transform on single records and scores them
//! with a regressor trained on the same transform's output.

mod metrics;
mod model;
mod predictor;

pub use metrics::RegressionMetrics;
pub use model::{LinearModel, Regressor, TrainingConfig};
pub use predictor::{
    predict, save_bundle, unseen_levels, BundleLocations, InferenceResult, Predictor,
};

use feature_engine::FeatureError;
use storage::StorageError;
use thiserror::Error;

/// Errors during training or inference
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// Record lacks a column the fitted transform expects
    #[error("Record is missing column '{0}' required by the fitted transform")]
    MissingColumn(String),

    /// Record cannot be encoded by the fitted transform
    #[error("Record incompatible with fitted transform: {0}")]
    IncompatibleRecord(#[source] FeatureError),

    /// Model or preprocessor artifact absent from the store
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    /// Model was trained against a different preprocessor
    #[error("Model expects preprocessor {expected}, loaded preprocessor is {actual}")]
    ArtifactMismatch { expected: String, actual: String },

    #[error("Invalid input shape: expected {expected} features, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },

    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),

    #[error("Training failed: {0}")]
    TrainingFailed(String),
}

impl From<StorageError> for InferenceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(key) => InferenceError::ArtifactNotFound(key),
            other => InferenceError::Storage(other),
        }
    }
}

impl From<FeatureError> for InferenceError {
    fn from(e: FeatureError) -> Self {
        match e {
            FeatureError::MissingColumn(column) => InferenceError::MissingColumn(column),
            other => InferenceError::IncompatibleRecord(other),
        }
    }
}
