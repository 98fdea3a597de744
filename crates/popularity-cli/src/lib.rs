//! Track Popularity Pipeline
//!
//! Library side of the `popularity` binary: layered settings, logging
//! setup, the training run and single-track inference.

mod inference;
mod settings;
mod training;

pub use inference::{apply_overrides, clamp_score, parse_overrides, run_inference, PredictionReport};
pub use settings::{Settings, DEFAULT_SETTINGS_FILE, ENV_PREFIX};
pub use training::{load_raw, run_training, TrainingReport};

use data_cleaner::SchemaError;
use dataset::DatasetError;
use feature_engine::FeatureError;
use inference_engine::InferenceError;
use storage::StorageError;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Errors surfaced by the training and inference commands
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),
    #[error("Logging setup failed: {0}")]
    Logging(String),
    #[error("Data loading failed: {0}")]
    Dataset(#[from] DatasetError),
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Feature pipeline error: {0}")]
    Feature(#[from] FeatureError),
    #[error("{0}")]
    Inference(#[from] InferenceError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Invalid override '{argument}': {reason}")]
    InvalidOverride { argument: String, reason: String },
}

/// Install the global subscriber; logs go to stderr so stdout carries only results
pub fn init_logging(settings: &Settings) -> Result<(), PipelineError> {
    let level: Level = settings
        .log_level
        .parse()
        .map_err(|_| PipelineError::Logging(format!("unknown log level '{}'", settings.log_level)))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if settings.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.map_err(|e| PipelineError::Logging(e.to_string()))
}
