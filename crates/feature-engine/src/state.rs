//! Fitted Transform State

use crate::error::FeatureError;
use crate::transform::{CategoricalTransform, NumericTransform};
use dataset::{ColumnKind, Dataset, Record, Schema, Value};
use ndarray::{Array1, Array2, ArrayViewMut1};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Numeric/categorical partition of the feature columns
///
/// Computed once from declared kinds, before any split, and persisted with
/// the fitted state so inference never re-derives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    numeric: Vec<String>,
    categorical: Vec<String>,
}

impl ColumnRoles {
    /// Partition every column except `target`
    pub fn partition(schema: &Schema, target: &str) -> Result<Self, FeatureError> {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();
        for column in schema.columns().iter().filter(|c| c.name != target) {
            match column.kind {
                ColumnKind::Numeric | ColumnKind::Boolean => numeric.push(column.name.clone()),
                ColumnKind::Categorical => categorical.push(column.name.clone()),
                ColumnKind::Identifier => {
                    return Err(FeatureError::IdentifierColumn(column.name.clone()))
                }
            }
        }
        Ok(Self {
            numeric,
            categorical,
        })
    }

    pub fn numeric(&self) -> &[String] {
        &self.numeric
    }

    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    /// Input columns in encoding order, numeric first
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .map(String::as_str)
    }
}

/// Statistics and vocabularies learned from the training partition
///
/// Immutable after fitting: fields are private and only read accessors are
/// exposed. Every transform, training-time or inference-time, goes through
/// [`FittedTransformState::encode_row`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransformState {
    target: String,
    roles: ColumnRoles,
    numeric: Vec<NumericTransform>,
    categorical: Vec<CategoricalTransform>,
    feature_names: Vec<String>,
}

impl FittedTransformState {
    /// Fit on training rows only
    pub(crate) fn fit(
        train: &Dataset,
        target: &str,
        roles: ColumnRoles,
    ) -> Result<Self, FeatureError> {
        let mut numeric = Vec::with_capacity(roles.numeric.len());
        for name in &roles.numeric {
            let cells = train
                .column(name)
                .ok_or_else(|| FeatureError::MissingColumn(name.clone()))?
                .map(|v| numeric_cell(name, v))
                .collect::<Result<Vec<_>, _>>()?;
            numeric.push(NumericTransform::fit(name, &cells));
        }

        let mut categorical = Vec::with_capacity(roles.categorical.len());
        for name in &roles.categorical {
            let cells = train
                .column(name)
                .ok_or_else(|| FeatureError::MissingColumn(name.clone()))?
                .map(|v| categorical_cell(name, v))
                .collect::<Result<Vec<_>, _>>()?;
            categorical.push(CategoricalTransform::fit(name, &cells));
        }

        let mut feature_names: Vec<String> = roles.numeric.clone();
        for t in &categorical {
            feature_names.extend(t.feature_names());
        }

        Ok(Self {
            target: target.to_string(),
            roles,
            numeric,
            categorical,
            feature_names,
        })
    }

    /// Target column the state was fitted against
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn roles(&self) -> &ColumnRoles {
        &self.roles
    }

    pub fn numeric_transforms(&self) -> &[NumericTransform] {
        &self.numeric
    }

    pub fn categorical_transforms(&self) -> &[CategoricalTransform] {
        &self.categorical
    }

    /// Output column names in order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Width of every output vector
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// First input column `has` reports as absent
    pub fn first_missing_column(&self, has: impl Fn(&str) -> bool) -> Option<&str> {
        self.roles.columns().find(|name| !has(name))
    }

    /// Transform a batch; extra columns (the target included) are ignored
    pub fn transform(&self, batch: &Dataset) -> Result<Array2<f64>, FeatureError> {
        let schema = batch.schema();
        let indices = self
            .roles
            .columns()
            .map(|name| {
                schema
                    .index_of(name)
                    .ok_or_else(|| FeatureError::MissingColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = Array2::zeros((batch.n_rows(), self.n_features()));
        for (i, row) in batch.rows().iter().enumerate() {
            let cells: Vec<&Value> = indices.iter().map(|&j| &row[j]).collect();
            self.encode_row(&cells, out.row_mut(i))?;
        }
        Ok(out)
    }

    /// Transform a single named record
    pub fn transform_record(&self, record: &Record) -> Result<Array1<f64>, FeatureError> {
        let cells = self
            .roles
            .columns()
            .map(|name| {
                record
                    .get(name)
                    .ok_or_else(|| FeatureError::MissingColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = Array1::zeros(self.n_features());
        self.encode_row(&cells, out.view_mut())?;
        Ok(out)
    }

    /// Encode one row whose cells follow `roles().columns()` order
    fn encode_row(&self, cells: &[&Value], mut out: ArrayViewMut1<'_, f64>) -> Result<(), FeatureError> {
        let (numeric_cells, categorical_cells) = cells.split_at(self.numeric.len());

        for (k, (t, cell)) in self.numeric.iter().zip(numeric_cells).enumerate() {
            out[k] = t.apply(numeric_cell(t.column(), cell)?);
        }

        let mut offset = self.numeric.len();
        let mut block = Vec::new();
        for (t, cell) in self.categorical.iter().zip(categorical_cells) {
            block.clear();
            block.resize(t.width(), 0.0);
            t.apply(categorical_cell(t.column(), cell)?, &mut block);
            for (k, v) in block.iter().enumerate() {
                out[offset + k] = *v;
            }
            offset += t.width();
        }
        Ok(())
    }

    /// SHA-256 of the encoded state, hex encoded
    ///
    /// Stored next to a trained model so a model is never paired with a
    /// preprocessor from another fit run.
    pub fn fingerprint(&self) -> Result<String, FeatureError> {
        let bytes = postcard::to_allocvec(self).map_err(|e| FeatureError::Encoding(e.to_string()))?;
        let digest = Sha256::digest(&bytes);
        Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }
}

fn numeric_cell(column: &str, value: &Value) -> Result<Option<f64>, FeatureError> {
    if value.is_missing() {
        return Ok(None);
    }
    value.as_f64().map(Some).ok_or_else(|| FeatureError::WrongKind {
        column: column.to_string(),
        expected: "numeric",
        found: value.type_name(),
    })
}

fn categorical_cell<'v>(column: &str, value: &'v Value) -> Result<Option<&'v str>, FeatureError> {
    if value.is_missing() {
        return Ok(None);
    }
    value.as_text().map(Some).ok_or_else(|| FeatureError::WrongKind {
        column: column.to_string(),
        expected: "categorical text",
        found: value.type_name(),
    })
}
