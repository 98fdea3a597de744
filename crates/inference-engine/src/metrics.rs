//! Regression Metrics

use crate::InferenceError;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Held-out error summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Coefficient of determination
    pub r2: f64,
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compare predictions against true targets
    ///
    /// A constant target scores R² of 1.0 when predicted exactly and 0.0
    /// otherwise.
    pub fn evaluate(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self, InferenceError> {
        if y_true.len() != y_pred.len() {
            return Err(InferenceError::InvalidInputShape {
                expected: y_true.len(),
                actual: y_pred.len(),
            });
        }
        if y_true.is_empty() {
            return Err(InferenceError::TrainingFailed(
                "cannot evaluate on an empty partition".to_string(),
            ));
        }

        let n = y_true.len() as f64;
        let residual = y_true - y_pred;
        let ss_res = residual.mapv(|r| r * r).sum();
        let mae = residual.mapv(f64::abs).sum() / n;

        let mean = y_true.sum() / n;
        let ss_tot = y_true.mapv(|y| (y - mean) * (y - mean)).sum();
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Ok(Self {
            rmse: (ss_res / n).sqrt(),
            mae,
            r2,
            n_samples: y_true.len(),
        })
    }
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RMSE={:.4} MAE={:.4} R2={:.4} (n={})",
            self.rmse, self.mae, self.r2, self.n_samples
        )
    }
}
