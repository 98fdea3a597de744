//! Per-Column Transforms

use crate::statistics::{self, ColumnStatistics};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Median imputation followed by z-score scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericTransform {
    column: String,
    /// Training median, substituted for missing cells
    median: f64,
    /// Training mean of the imputed column
    mean: f64,
    /// Training standard deviation (1.0 for constant columns)
    scale: f64,
}

impl NumericTransform {
    /// Learn imputation and scaling from training cells
    pub fn fit(column: &str, cells: &[Option<f64>]) -> Self {
        let observed: Vec<f64> = cells.iter().flatten().copied().collect();
        let median = statistics::median(&observed).unwrap_or_else(|| {
            warn!("Column '{}' has no observed values, imputing 0.0", column);
            0.0
        });

        let imputed: Vec<f64> = cells.iter().map(|c| c.unwrap_or(median)).collect();
        let stats = ColumnStatistics::compute(&imputed);
        let scale = if stats.std_dev > 0.0 { stats.std_dev } else { 1.0 };

        Self {
            column: column.to_string(),
            median,
            mean: stats.mean,
            scale,
        }
    }

    /// Transform one cell
    pub fn apply(&self, cell: Option<f64>) -> f64 {
        (cell.unwrap_or(self.median) - self.mean) / self.scale
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn median(&self) -> f64 {
        self.median
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

/// Mode imputation followed by one-hot encoding over a closed vocabulary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalTransform {
    column: String,
    /// Training mode, substituted for missing cells
    mode: Option<String>,
    /// Sorted distinct training levels
    vocabulary: Vec<String>,
}

impl CategoricalTransform {
    /// Learn imputation level and vocabulary from training cells
    pub fn fit(column: &str, cells: &[Option<&str>]) -> Self {
        let mode = statistics::mode(cells.iter().flatten().copied());
        if mode.is_none() {
            warn!("Column '{}' has no observed levels, encoding is empty", column);
        }

        let mut vocabulary: Vec<String> = cells
            .iter()
            .filter_map(|c| (*c).or(mode.as_deref()))
            .map(str::to_string)
            .collect();
        vocabulary.sort();
        vocabulary.dedup();

        Self {
            column: column.to_string(),
            mode,
            vocabulary,
        }
    }

    /// Number of indicator columns produced
    pub fn width(&self) -> usize {
        self.vocabulary.len()
    }

    /// Write the indicator block for one cell into `out`
    ///
    /// `out` must be zeroed and `width()` long. A level outside the
    /// vocabulary leaves every indicator at zero.
    pub fn apply(&self, cell: Option<&str>, out: &mut [f64]) {
        let Some(level) = cell.or(self.mode.as_deref()) else {
            return;
        };
        if let Ok(pos) = self.vocabulary.binary_search_by(|v| v.as_str().cmp(level)) {
            out[pos] = 1.0;
        }
    }

    /// Whether a level was seen during fitting
    pub fn knows(&self, level: &str) -> bool {
        self.vocabulary.iter().any(|v| v == level)
    }

    /// Output names, `<column>_<level>`
    pub fn feature_names(&self) -> impl Iterator<Item = String> + '_ {
        self.vocabulary
            .iter()
            .map(move |level| format!("{}_{}", self.column, level))
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn mode(&self) -> Option<&str> {
        self.mode.as_deref()
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }
}
