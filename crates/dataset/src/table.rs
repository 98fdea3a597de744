//! Row-Oriented Dataset

use crate::error::DatasetError;
use crate::record::Record;
use crate::schema::{ColumnKind, Schema};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Ordered rows sharing one schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Create an empty dataset with the given schema
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Create a dataset from rows, checking every row against the schema width
    pub fn from_rows(schema: Schema, rows: Vec<Vec<Value>>) -> Result<Self, DatasetError> {
        let mut dataset = Self::new(schema);
        for row in rows {
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }

    /// Create a dataset from named records; absent fields become missing
    pub fn from_records(schema: Schema, records: &[Record]) -> Self {
        let rows = records
            .iter()
            .map(|record| {
                schema
                    .names()
                    .map(|name| record.get(name).cloned().unwrap_or(Value::Missing))
                    .collect()
            })
            .collect();
        Self { schema, rows }
    }

    /// Append a row
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), DatasetError> {
        if row.len() != self.schema.len() {
            return Err(DatasetError::RowWidth {
                row: self.rows.len(),
                expected: self.schema.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let index = self.schema.index_of(name)?;
        Some(self.rows.iter().map(move |row| &row[index]))
    }

    /// Look up a single cell by row and column name
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let index = self.schema.index_of(name)?;
        self.rows.get(row).map(|r| &r[index])
    }

    /// Materialize one row as a named record
    pub fn record(&self, row: usize) -> Option<Record> {
        let values = self.rows.get(row)?;
        Some(
            self.schema
                .names()
                .zip(values.iter().cloned())
                .collect(),
        )
    }

    /// New dataset holding the given rows in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            schema: self.schema.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Remove a column; returns false when the column is absent
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(index) = self.schema.index_of(name) else {
            return false;
        };
        self.schema.remove(index);
        for row in &mut self.rows {
            row.remove(index);
        }
        true
    }

    /// Keep only rows matching the predicate, preserving order
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Rewrite every cell of a column and redeclare its kind
    pub fn map_column<F>(&mut self, name: &str, kind: ColumnKind, mut f: F) -> bool
    where
        F: FnMut(&Value) -> Value,
    {
        let Some(index) = self.schema.index_of(name) else {
            return false;
        };
        for row in &mut self.rows {
            row[index] = f(&row[index]);
        }
        self.schema.set_kind(index, kind);
        true
    }
}
