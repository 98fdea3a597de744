//! Training Run

use crate::settings::Settings;
use crate::PipelineError;
use data_cleaner::{CleanerConfig, DataCleaner, TrackCleaner};
use dataset::{track_schema, CsvFileLoader, DataLoader, Dataset};
use feature_engine::{FeaturePipeline, Preprocessor};
use inference_engine::{save_bundle, BundleLocations, LinearModel, RegressionMetrics, Regressor};
use std::path::Path;
use std::time::Instant;
use storage::ArtifactStore;
use tracing::info;

/// Summary of a completed training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub version: String,
    pub raw_rows: usize,
    pub clean_rows: usize,
    pub feature_names: Vec<String>,
    /// Held-out metrics
    pub metrics: RegressionMetrics,
    pub locations: BundleLocations,
}

/// Load a raw CSV typed by the canonical track schema
pub fn load_raw(path: &Path) -> Result<Dataset, PipelineError> {
    Ok(CsvFileLoader::new(path, track_schema()).load()?)
}

/// Clean, fit, train, evaluate and persist one model version
///
/// Artifacts are written only after every earlier step has succeeded.
pub fn run_training(
    settings: &Settings,
    raw: &Dataset,
    store: &dyn ArtifactStore,
) -> Result<TrainingReport, PipelineError> {
    let start = Instant::now();
    info!("Starting training run for version {}", settings.version);

    let cleaner = TrackCleaner::new(CleanerConfig {
        absent_columns: settings.absent_columns,
        ..CleanerConfig::default()
    });
    let clean = cleaner.clean(raw)?;

    let mut pipeline = FeaturePipeline::new(settings.pipeline.clone());
    let split = pipeline.fit_transform(&clean)?;
    let feature_names = pipeline.feature_names()?.to_vec();

    info!("Training linear model...");
    let model = LinearModel::fit(&split.x_train, &split.y_train, &settings.training)?;

    let predictions = model.predict(&split.x_test);
    let metrics = RegressionMetrics::evaluate(&split.y_test, &predictions)?;
    info!("Evaluation on held-out rows: {}", metrics);

    let state = pipeline.into_state()?;
    let locations = save_bundle(
        store,
        &settings.artifact_prefix,
        &settings.version,
        &state,
        &model,
    )?;

    info!(
        "Training run for version {} finished in {:.2}s",
        settings.version,
        start.elapsed().as_secs_f64()
    );
    Ok(TrainingReport {
        version: settings.version.clone(),
        raw_rows: raw.n_rows(),
        clean_rows: clean.n_rows(),
        feature_names,
        metrics,
        locations,
    })
}
