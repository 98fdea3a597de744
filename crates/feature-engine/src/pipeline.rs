//! Feature Transformation Pipeline

use crate::error::FeatureError;
use crate::split::train_test_split;
use crate::state::{ColumnRoles, FittedTransformState};
use dataset::{Dataset, ObservabilitySink, Record, TARGET_COLUMN};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Column predicted by the model
    pub target_column: String,
    /// Share of rows held out for testing, in (0, 1)
    pub test_fraction: f64,
    /// Seed of the split shuffle
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_column: TARGET_COLUMN.to_string(),
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Row-aligned train/test matrices and targets
#[derive(Debug, Clone)]
pub struct SplitMatrices {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Learns a transform on training data and replays it on new data
pub trait Preprocessor {
    /// Split, fit on the training partition, and transform both partitions
    fn fit_transform(&mut self, clean: &Dataset) -> Result<SplitMatrices, FeatureError>;

    /// Transform new rows with the fitted state
    fn transform(&self, batch: &Dataset) -> Result<Array2<f64>, FeatureError>;

    /// Output column names of the fitted state
    fn feature_names(&self) -> Result<&[String], FeatureError>;
}

/// Median/z-score numeric and mode/one-hot categorical pipeline
pub struct FeaturePipeline {
    config: PipelineConfig,
    state: Option<FittedTransformState>,
    sink: ObservabilitySink,
}

impl FeaturePipeline {
    /// Create an unfitted pipeline
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            state: None,
            sink: ObservabilitySink::ambient(),
        }
    }

    /// Wrap a previously fitted (e.g. loaded) state
    pub fn from_state(config: PipelineConfig, state: FittedTransformState) -> Self {
        Self {
            config,
            state: Some(state),
            sink: ObservabilitySink::ambient(),
        }
    }

    /// Route this pipeline's logs to `sink`
    pub fn with_sink(mut self, sink: ObservabilitySink) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fitted state, or [`FeatureError::NotFitted`]
    pub fn state(&self) -> Result<&FittedTransformState, FeatureError> {
        self.state.as_ref().ok_or(FeatureError::NotFitted)
    }

    /// Take the fitted state out of the pipeline
    pub fn into_state(self) -> Result<FittedTransformState, FeatureError> {
        self.state.ok_or(FeatureError::NotFitted)
    }

    /// Transform one record with the fitted state
    pub fn transform_record(&self, record: &Record) -> Result<Array1<f64>, FeatureError> {
        self.sink.in_scope(|| self.state()?.transform_record(record))
    }

    fn fit(&self, clean: &Dataset) -> Result<(FittedTransformState, SplitMatrices), FeatureError> {
        info!("Starting data preprocessing pipeline...");
        let target = self.config.target_column.as_str();

        let target_index = clean
            .schema()
            .index_of(target)
            .ok_or_else(|| FeatureError::MissingTarget(target.to_string()))?;
        let y = clean
            .rows()
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                cells[target_index]
                    .as_f64()
                    .ok_or_else(|| FeatureError::NonNumericTarget {
                        column: target.to_string(),
                        row,
                        value: cells[target_index].to_string(),
                    })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        // Roles come from the full dataset so both partitions share them.
        let roles = ColumnRoles::partition(clean.schema(), target)?;
        info!("Numeric features ({}): {:?}", roles.numeric().len(), roles.numeric());
        info!(
            "Categorical features ({}): {:?}",
            roles.categorical().len(),
            roles.categorical()
        );

        info!(
            "Splitting data into train/test sets (test_fraction={})",
            self.config.test_fraction
        );
        let split = train_test_split(clean.n_rows(), self.config.test_fraction, self.config.seed)?;
        debug!("Train rows: {}, test rows: {}", split.train.len(), split.test.len());

        let train = clean.select_rows(&split.train);
        let test = clean.select_rows(&split.test);

        info!("Fitting transformers on training rows...");
        let state = FittedTransformState::fit(&train, target, roles)?;
        let x_train = state.transform(&train)?;

        info!("Transforming test rows...");
        let x_test = state.transform(&test)?;

        let y_train: Array1<f64> = split.train.iter().map(|&i| y[i]).collect();
        let y_test: Array1<f64> = split.test.iter().map(|&i| y[i]).collect();

        info!(
            "Preprocessing finished. Final train shape: ({}, {})",
            x_train.nrows(),
            x_train.ncols()
        );

        Ok((
            state,
            SplitMatrices {
                x_train,
                x_test,
                y_train,
                y_test,
            },
        ))
    }
}

impl Preprocessor for FeaturePipeline {
    fn fit_transform(&mut self, clean: &Dataset) -> Result<SplitMatrices, FeatureError> {
        let sink = self.sink.clone();
        // State is only replaced once the whole fit has succeeded.
        let (state, matrices) = sink.in_scope(|| self.fit(clean))?;
        self.state = Some(state);
        Ok(matrices)
    }

    fn transform(&self, batch: &Dataset) -> Result<Array2<f64>, FeatureError> {
        self.sink.in_scope(|| self.state()?.transform(batch))
    }

    fn feature_names(&self) -> Result<&[String], FeatureError> {
        Ok(self.state()?.feature_names())
    }
}

impl Default for FeaturePipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
