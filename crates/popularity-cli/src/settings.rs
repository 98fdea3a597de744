//! Layered Settings

use data_cleaner::AbsentColumnPolicy;
use feature_engine::PipelineConfig;
use inference_engine::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file read from the working directory when present
pub const DEFAULT_SETTINGS_FILE: &str = "popularity.toml";

/// Environment overrides use `POPULARITY__<FIELD>`, `__` between nesting levels
pub const ENV_PREFIX: &str = "POPULARITY";

/// Runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Raw CSV used by `train` when no path is given
    pub data_path: PathBuf,
    /// Directory holding model/preprocessor artifacts
    pub model_dir: PathBuf,
    pub artifact_prefix: String,
    /// Model version tag
    pub version: String,
    /// Treatment of absent columns the cleaner would drop
    pub absent_columns: AbsentColumnPolicy,
    pub pipeline: PipelineConfig,
    pub training: TrainingConfig,
    /// trace, debug, info, warn or error
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/dataset.csv"),
            model_dir: PathBuf::from("models"),
            artifact_prefix: "spotify".to_string(),
            version: "v1".to_string(),
            absent_columns: AbsentColumnPolicy::Ignore,
            pipeline: PipelineConfig::default(),
            training: TrainingConfig::default(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Settings {
    /// Defaults, then the optional file at `path`, then the environment
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }
}
