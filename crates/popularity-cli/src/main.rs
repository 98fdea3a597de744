//! Track Popularity - Main Entry Point

use anyhow::Context;
use clap::{Parser, Subcommand};
use dataset::{fixtures, track_schema};
use inference_engine::InferenceError;
use popularity_cli::{
    apply_overrides, init_logging, load_raw, parse_overrides, run_inference, run_training,
    PipelineError, Settings,
};
use std::path::PathBuf;
use std::process::ExitCode;
use storage::FileArtifactStore;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[clap(name = "popularity", version, about = "Track popularity training and inference")]
struct CliArgs {
    /// Settings file (optional; environment variables POPULARITY__* override it)
    #[clap(long, default_value = popularity_cli::DEFAULT_SETTINGS_FILE)]
    config: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean, fit and train on a raw CSV, then persist the model/preprocessor pair
    Train {
        /// Raw track CSV (defaults to the configured data path)
        data: Option<PathBuf>,

        /// Model version tag to write
        #[clap(long)]
        version: Option<String>,
    },
    /// Score the built-in sample track, optionally overriding its attributes
    Predict {
        /// Model version tag to load
        #[clap(long)]
        version: Option<String>,

        /// Track genre
        #[clap(long)]
        genre: Option<String>,

        /// Attribute overrides, e.g. energy=0.8 explicit=true
        overrides: Vec<String>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let args = CliArgs::parse();
    let mut settings = Settings::load_from(&args.config)
        .with_context(|| format!("Failed to load settings from {}", args.config.display()))?;
    init_logging(&settings)?;

    info!("=== Track Popularity v{} ===", env!("CARGO_PKG_VERSION"));
    let store = FileArtifactStore::new(&settings.model_dir)?;

    match args.command {
        Command::Train { data, version } => {
            if let Some(version) = version {
                settings.version = version;
            }
            let path = data.unwrap_or_else(|| settings.data_path.clone());
            let raw = load_raw(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?;

            let report = run_training(&settings, &raw, &store)?;
            println!("Model version: {}", report.version);
            println!("Rows:          {} raw, {} clean", report.raw_rows, report.clean_rows);
            println!("Features:      {}", report.feature_names.len());
            println!("Test metrics:  {}", report.metrics);
            println!("Model:         {}", report.locations.model);
            println!("Preprocessor:  {}", report.locations.preprocessor);
        }
        Command::Predict {
            version,
            genre,
            overrides,
        } => {
            if let Some(version) = version {
                settings.version = version;
            }
            let mut record = fixtures::sample_track();
            if let Some(genre) = genre {
                record.insert("track_genre", genre);
            }
            apply_overrides(&mut record, &parse_overrides(&overrides)?, &track_schema())?;

            let report = match run_inference(&settings, &store, &record) {
                Ok(report) => report,
                Err(PipelineError::Inference(InferenceError::ArtifactNotFound(key))) => {
                    error!(
                        "No model files for version '{}' ({} is missing); run `popularity train` first",
                        settings.version, key
                    );
                    return Ok(ExitCode::FAILURE);
                }
                Err(e) => return Err(e.into()),
            };

            println!("Genre:      {}", report.genre.unwrap_or_default().to_uppercase());
            println!("Popularity: {:.2} / 100", report.score);
        }
    }

    Ok(ExitCode::SUCCESS)
}
