//! Feature Engineering Engine
//!
//! Learns per-column imputation, scaling and one-hot vocabularies from the
//! training partition and replays them unchanged on test rows and on single
//! inference records.

mod error;
mod pipeline;
mod split;
mod state;
mod statistics;
mod transform;

pub use error::FeatureError;
pub use pipeline::{FeaturePipeline, PipelineConfig, Preprocessor, SplitMatrices};
pub use split::{train_test_split, SplitIndices};
pub use state::{ColumnRoles, FittedTransformState};
pub use statistics::ColumnStatistics;
pub use transform::{CategoricalTransform, NumericTransform};
