//! CSV Data Loading

use crate::error::DatasetError;
use crate::schema::{Column, ColumnKind, Schema};
use crate::table::Dataset;
use crate::value::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Source of a raw dataset
pub trait DataLoader {
    /// Load the full raw dataset
    fn load(&self) -> Result<Dataset, DatasetError>;
}

/// Loads a local CSV file typed by a declared schema
pub struct CsvFileLoader {
    path: PathBuf,
    schema: Schema,
}

impl CsvFileLoader {
    /// Create a loader for `path`; header columns are typed from `schema`
    pub fn new(path: impl AsRef<Path>, schema: Schema) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            schema,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataLoader for CsvFileLoader {
    fn load(&self) -> Result<Dataset, DatasetError> {
        let shown = self.path.display().to_string();
        if !self.path.exists() {
            return Err(DatasetError::Io {
                path: shown,
                message: "file not found".to_string(),
            });
        }
        if !self.path.is_file() {
            return Err(DatasetError::Io {
                path: shown,
                message: "not a file".to_string(),
            });
        }
        if self.path.extension().and_then(|e| e.to_str()) != Some("csv") {
            return Err(DatasetError::UnsupportedFormat(shown));
        }

        info!("Loading data from {}", shown);
        let file = std::fs::File::open(&self.path).map_err(|e| DatasetError::Io {
            path: shown.clone(),
            message: e.to_string(),
        })?;
        let dataset = read_csv(file, &self.schema)?;
        info!(
            "Loaded {} rows x {} columns from {}",
            dataset.n_rows(),
            dataset.n_cols(),
            shown
        );
        Ok(dataset)
    }
}

/// Parse CSV text into a dataset typed by `declared`
///
/// Columns absent from `declared` are inferred: numeric when every
/// non-empty cell parses as a number, categorical otherwise.
pub fn read_csv<R: Read>(source: R, declared: &Schema) -> Result<Dataset, DatasetError> {
    let mut reader = csv::Reader::from_reader(source);
    let headers = reader.headers()?.clone();

    let mut raw_rows = Vec::new();
    for record in reader.records() {
        raw_rows.push(record?);
    }

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let kind = declared.kind_of(name).unwrap_or_else(|| {
                let inferred = infer_kind(raw_rows.iter().filter_map(|r| r.get(i)));
                debug!("Column '{}' not declared, inferred as {}", name, inferred);
                inferred
            });
            Column::new(name, kind)
        })
        .collect();

    for expected in declared.names() {
        if !columns.iter().any(|c| c.name == expected) {
            warn!("Declared column '{}' not present in CSV header", expected);
        }
    }

    let schema = Schema::new(columns);
    let mut dataset = Dataset::new(schema.clone());
    for (index, raw) in raw_rows.iter().enumerate() {
        // Header occupies line 1
        let line = raw.position().map_or(index as u64 + 2, |p| p.line());
        let row = schema
            .columns()
            .iter()
            .enumerate()
            .map(|(i, column)| Value::parse(raw.get(i).unwrap_or(""), &column.name, column.kind))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.at_line(line))?;
        dataset.push_row(row)?;
    }

    Ok(dataset)
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let numeric = cells
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .all(|c| c.parse::<f64>().is_ok());
    if numeric {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}
