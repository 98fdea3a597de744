//! Regressor Capability and Linear Model

use crate::InferenceError;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Scores fixed-width feature vectors
pub trait Regressor: Send + Sync {
    /// Input width the model was trained on
    fn n_features(&self) -> usize;

    /// Score one feature vector
    fn predict_row(&self, features: ArrayView1<'_, f64>) -> f64;

    /// Score every row of a matrix
    fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }
}

/// Gradient descent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Step size
    pub learning_rate: f64,
    /// Full passes over the training matrix
    pub epochs: usize,
    /// L2 penalty on the weights (bias is not penalised)
    pub l2_penalty: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            epochs: 500,
            l2_penalty: 0.0,
        }
    }
}

/// Ordinary least squares fitted by batch gradient descent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    weights: Vec<f64>,
    bias: f64,
}

impl LinearModel {
    /// Model from explicit coefficients
    pub fn new(weights: Vec<f64>, bias: f64) -> Self {
        Self { weights, bias }
    }

    /// Fit on a transformed training matrix
    pub fn fit(
        x: &Array2<f64>,
        y: &Array1<f64>,
        config: &TrainingConfig,
    ) -> Result<Self, InferenceError> {
        let (n_rows, n_features) = x.dim();
        if n_rows == 0 {
            return Err(InferenceError::TrainingFailed(
                "training matrix has no rows".to_string(),
            ));
        }
        if y.len() != n_rows {
            return Err(InferenceError::InvalidInputShape {
                expected: n_rows,
                actual: y.len(),
            });
        }
        if !(config.learning_rate > 0.0) || config.epochs == 0 {
            return Err(InferenceError::TrainingFailed(format!(
                "invalid training config: learning_rate={}, epochs={}",
                config.learning_rate, config.epochs
            )));
        }

        let start = Instant::now();
        let n = n_rows as f64;
        let mut weights = Array1::<f64>::zeros(n_features);
        let mut bias = y.sum() / n;

        for epoch in 0..config.epochs {
            let residual = x.dot(&weights) + bias - y;
            let grad_w = x.t().dot(&residual) / n + &weights * config.l2_penalty;
            let grad_b = residual.sum() / n;
            weights.scaled_add(-config.learning_rate, &grad_w);
            bias -= config.learning_rate * grad_b;

            if epoch % 100 == 0 {
                let mse = residual.mapv(|r| r * r).sum() / n;
                debug!("Epoch {}: mse={:.4}", epoch, mse);
            }
        }

        if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(InferenceError::TrainingFailed(format!(
                "gradient descent diverged at learning_rate={}",
                config.learning_rate
            )));
        }

        info!(
            "Trained linear model on {} rows x {} features in {:.2}s",
            n_rows,
            n_features,
            start.elapsed().as_secs_f64()
        );
        Ok(Self {
            weights: weights.to_vec(),
            bias,
        })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }
}

impl Regressor for LinearModel {
    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn predict_row(&self, features: ArrayView1<'_, f64>) -> f64 {
        features
            .iter()
            .zip(&self.weights)
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + self.bias
    }
}
