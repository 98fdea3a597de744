//! Track Dataset Cleaning

use crate::error::SchemaError;
use crate::validator::{SchemaValidator, ValidationConfig};
use dataset::{
    ColumnKind, Dataset, ObservabilitySink, Value, DENYLISTED_COLUMNS, HIGH_CARDINALITY_COLUMNS,
    IDENTIFIER_COLUMN,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Normalizes a raw dataset into a canonical clean dataset
pub trait DataCleaner {
    /// Clean `raw` without modifying it
    fn clean(&self, raw: &Dataset) -> Result<Dataset, SchemaError>;
}

/// What to do when a column the cleaner would drop is already absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentColumnPolicy {
    /// Treat as a no-op
    Ignore,
    /// Fail with [`SchemaError::MissingColumn`]
    Reject,
}

/// Toggles for the skippable cleaning steps
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CleaningSteps {
    pub drop_denylisted: bool,
    pub deduplicate: bool,
    pub drop_incomplete_rows: bool,
    pub coerce_types: bool,
}

impl Default for CleaningSteps {
    fn default() -> Self {
        Self {
            drop_denylisted: true,
            deduplicate: true,
            drop_incomplete_rows: true,
            coerce_types: true,
        }
    }
}

/// Cleaner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanerConfig {
    /// Spellings of the technical index column, dropped first
    pub denylist: Vec<String>,
    /// Free-text columns that must never reach the model
    pub high_cardinality: Vec<String>,
    /// Column used for deduplication, dropped afterwards
    pub identifier: Option<String>,
    /// Policy for absent denylisted, high-cardinality or identifier columns
    pub absent_columns: AbsentColumnPolicy,
    pub steps: CleaningSteps,
    /// Columns checked before any step runs
    pub validation: ValidationConfig,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            denylist: DENYLISTED_COLUMNS.iter().map(|s| s.to_string()).collect(),
            high_cardinality: HIGH_CARDINALITY_COLUMNS.iter().map(|s| s.to_string()).collect(),
            identifier: Some(IDENTIFIER_COLUMN.to_string()),
            absent_columns: AbsentColumnPolicy::Ignore,
            steps: CleaningSteps::default(),
            validation: ValidationConfig::default(),
        }
    }
}

/// Cleaner for the public track popularity dataset
pub struct TrackCleaner {
    config: CleanerConfig,
    validator: SchemaValidator,
    sink: ObservabilitySink,
}

impl TrackCleaner {
    /// Create a new cleaner
    pub fn new(config: CleanerConfig) -> Self {
        let validator = SchemaValidator::new(config.validation.clone());
        Self {
            config,
            validator,
            sink: ObservabilitySink::ambient(),
        }
    }

    /// Route this cleaner's logs to `sink`
    pub fn with_sink(mut self, sink: ObservabilitySink) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    fn run(&self, raw: &Dataset) -> Result<Dataset, SchemaError> {
        self.validator.ensure(raw.schema())?;

        let mut df = raw.clone();
        let (initial_rows, initial_cols) = (df.n_rows(), df.n_cols());
        info!(
            "Starting data cleaning. Initial shape: ({}, {})",
            initial_rows, initial_cols
        );

        if self.config.steps.drop_denylisted {
            self.drop_denylisted(&mut df)?;
        }
        self.drop_high_cardinality(&mut df)?;
        self.remove_duplicates(&mut df)?;
        if self.config.steps.drop_incomplete_rows {
            self.drop_incomplete_rows(&mut df);
        }
        if self.config.steps.coerce_types {
            self.coerce_types(&mut df);
        }

        info!(
            "Data cleaning completed. Final shape: ({}, {}) (Removed {} rows)",
            df.n_rows(),
            df.n_cols(),
            initial_rows - df.n_rows()
        );
        Ok(df)
    }

    /// Drop a column the cleaner expects to find, honoring the absent-column policy
    fn drop_expected(&self, df: &mut Dataset, name: &str) -> Result<bool, SchemaError> {
        if df.drop_column(name) {
            return Ok(true);
        }
        match self.config.absent_columns {
            AbsentColumnPolicy::Ignore => Ok(false),
            AbsentColumnPolicy::Reject => Err(SchemaError::MissingColumn(name.to_string())),
        }
    }

    /// Denylist entries are alternative spellings: finding any one satisfies `Reject`
    fn drop_denylisted(&self, df: &mut Dataset) -> Result<(), SchemaError> {
        let dropped: Vec<&str> = self
            .config
            .denylist
            .iter()
            .filter(|name| df.drop_column(name))
            .map(String::as_str)
            .collect();

        if !dropped.is_empty() {
            info!("Dropping columns: {:?}", dropped);
        } else if let (AbsentColumnPolicy::Reject, Some(first)) =
            (self.config.absent_columns, self.config.denylist.first())
        {
            return Err(SchemaError::MissingColumn(first.clone()));
        }
        Ok(())
    }

    fn drop_high_cardinality(&self, df: &mut Dataset) -> Result<(), SchemaError> {
        let key = self.config.identifier.as_deref();
        let mut targets: Vec<String> = self.config.high_cardinality.clone();
        for column in df.schema().columns() {
            if column.kind == ColumnKind::Identifier
                && Some(column.name.as_str()) != key
                && !targets.contains(&column.name)
            {
                targets.push(column.name.clone());
            }
        }

        let mut dropped = Vec::new();
        for name in &targets {
            if self.drop_expected(df, name)? {
                dropped.push(name.as_str());
            }
        }
        if !dropped.is_empty() {
            info!("Dropping high-cardinality columns: {:?}", dropped);
        }
        Ok(())
    }

    fn remove_duplicates(&self, df: &mut Dataset) -> Result<(), SchemaError> {
        let dedup = self.config.steps.deduplicate;

        if let Some(key) = self.config.identifier.as_deref() {
            if let Some(index) = df.schema().index_of(key) {
                if dedup {
                    let before = df.n_rows();
                    let mut seen = HashSet::new();
                    df.retain_rows(|row| seen.insert(row[index].clone()));
                    let removed = before - df.n_rows();
                    if removed > 0 {
                        info!("Found {} duplicates based on '{}'. Removed", removed, key);
                    }
                }
            }
            // Identifier is never a feature, whether or not dedup ran.
            self.drop_expected(df, key)?;
        }

        if dedup {
            // Also catches rows that only differed by their identifier,
            // so a second cleaning pass finds nothing to remove.
            let before = df.n_rows();
            let mut seen = HashSet::new();
            df.retain_rows(|row| seen.insert(row.to_vec()));
            let removed = before - df.n_rows();
            if removed > 0 {
                info!("Found {} exact duplicates. Removed", removed);
            }
        }
        Ok(())
    }

    fn drop_incomplete_rows(&self, df: &mut Dataset) {
        let before = df.n_rows();
        df.retain_rows(|row| !row.iter().any(Value::is_missing));
        let removed = before - df.n_rows();
        if removed > 0 {
            info!("Found {} rows with missing values. Dropped", removed);
        }
    }

    fn coerce_types(&self, df: &mut Dataset) {
        let columns: Vec<(String, ColumnKind)> = df
            .schema()
            .columns()
            .iter()
            .map(|c| (c.name.clone(), c.kind))
            .collect();

        for (name, kind) in columns {
            if kind == ColumnKind::Boolean {
                debug!("Coercing boolean column '{}' to 0/1", name);
                df.map_column(&name, ColumnKind::Numeric, |value| match value {
                    Value::Bool(b) => Value::Int(i64::from(*b)),
                    other => other.clone(),
                });
                continue;
            }

            let all_text = {
                let mut cells = df
                    .column(&name)
                    .into_iter()
                    .flatten()
                    .filter(|v| !v.is_missing())
                    .peekable();
                cells.peek().is_some() && cells.all(|v| v.as_text().is_some())
            };
            if kind != ColumnKind::Categorical && all_text {
                debug!("Marking text column '{}' as categorical", name);
                df.map_column(&name, ColumnKind::Categorical, Value::clone);
            }
        }
    }
}

impl DataCleaner for TrackCleaner {
    fn clean(&self, raw: &Dataset) -> Result<Dataset, SchemaError> {
        self.sink.in_scope(|| self.run(raw))
    }
}

impl Default for TrackCleaner {
    fn default() -> Self {
        Self::new(CleanerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataset::{fixtures, track_schema, Schema};
    use proptest::prelude::*;

    const FORBIDDEN: [&str; 4] = ["track_id", "track_name", "artists", "album_name"];

    #[test]
    fn test_cleaner_removes_duplicates() {
        let clean = TrackCleaner::default().clean(&fixtures::sample_raw_tracks()).unwrap();
        assert_eq!(clean.n_rows(), 4);
    }

    #[test]
    fn test_cleaner_drops_metadata_columns() {
        let clean = TrackCleaner::default().clean(&fixtures::sample_raw_tracks()).unwrap();
        for col in FORBIDDEN {
            assert!(!clean.schema().contains(col), "{} should be dropped", col);
        }
    }

    #[test]
    fn test_cleaner_keeps_model_columns() {
        let clean = TrackCleaner::default().clean(&fixtures::sample_raw_tracks()).unwrap();
        let required = [
            "popularity", "duration_ms", "track_genre", "explicit", "danceability", "energy",
            "key", "loudness", "mode", "speechiness", "acousticness", "instrumentalness",
            "liveness", "valence", "tempo", "time_signature",
        ];
        for col in required {
            assert!(clean.schema().contains(col), "{} should remain", col);
        }
    }

    #[test]
    fn test_cleaner_coerces_booleans() {
        let clean = TrackCleaner::default().clean(&fixtures::sample_raw_tracks()).unwrap();
        assert_eq!(clean.schema().kind_of("explicit"), Some(ColumnKind::Numeric));
        assert_eq!(clean.value(1, "explicit"), Some(&Value::Int(1)));
        assert_eq!(clean.value(0, "explicit"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_cleaner_does_not_touch_input() {
        let raw = fixtures::sample_raw_tracks();
        let copy = raw.clone();
        TrackCleaner::default().clean(&raw).unwrap();
        assert_eq!(raw, copy);
    }

    #[test]
    fn test_first_occurrence_kept() {
        let mut raw = fixtures::sample_raw_tracks();
        // Same identifier, different album and popularity
        let mut later = raw.rows()[0].clone();
        later[2] = "Greatest Hits".into();
        later[5] = Value::Int(10);
        raw.push_row(later.clone()).unwrap();
        raw.push_row(later).unwrap();

        let clean = TrackCleaner::default().clean(&raw).unwrap();
        assert_eq!(clean.n_rows(), 4);
        assert_eq!(clean.value(0, "popularity"), Some(&Value::Int(80)));
        assert_eq!(
            clean.column("popularity").unwrap().filter(|v| **v == Value::Int(10)).count(),
            0
        );
    }

    #[test]
    fn test_missing_values_dropped() {
        let mut raw = fixtures::sample_raw_tracks();
        let mut incomplete = raw.rows()[1].clone();
        incomplete[0] = "id9".into();
        incomplete[12] = Value::Missing;
        raw.push_row(incomplete).unwrap();

        let clean = TrackCleaner::default().clean(&raw).unwrap();
        assert_eq!(clean.n_rows(), 4);
    }

    #[test]
    fn test_required_column_absent_is_schema_error() {
        let mut raw = fixtures::sample_raw_tracks();
        raw.drop_column("track_genre");

        let err = TrackCleaner::default().clean(&raw).unwrap_err();
        assert_eq!(err, SchemaError::MissingColumn("track_genre".to_string()));
    }

    #[test]
    fn test_reject_policy_flags_absent_denylisted_column() {
        let config = CleanerConfig {
            denylist: vec!["Unnamed: 0".to_string()],
            absent_columns: AbsentColumnPolicy::Reject,
            ..Default::default()
        };
        let err = TrackCleaner::new(config)
            .clean(&fixtures::sample_raw_tracks())
            .unwrap_err();
        assert_eq!(err, SchemaError::MissingColumn("Unnamed: 0".to_string()));
    }

    #[test]
    fn test_reject_policy_accepts_canonical_schema() {
        let mut record = fixtures::sample_track();
        record.insert("Unnamed: 0", 0i64);
        record.insert("popularity", 55i64);
        let raw = Dataset::from_records(track_schema(), &[record]);

        let config = CleanerConfig {
            absent_columns: AbsentColumnPolicy::Reject,
            ..Default::default()
        };
        let clean = TrackCleaner::new(config).clean(&raw).unwrap();
        assert_eq!(clean.n_rows(), 1);
        assert!(!clean.schema().contains("Unnamed: 0"));
        assert!(!clean.schema().contains("track_id"));
    }

    #[test]
    fn test_identifier_dropped_when_dedup_skipped() {
        let config = CleanerConfig {
            steps: CleaningSteps {
                deduplicate: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let clean = TrackCleaner::new(config).clean(&fixtures::sample_raw_tracks()).unwrap();
        assert_eq!(clean.n_rows(), 5);
        assert!(!clean.schema().contains("track_id"));
    }

    #[test]
    fn test_full_row_dedup_without_identifier() {
        let mut raw = fixtures::sample_raw_tracks();
        raw.drop_column("track_id");
        let config = CleanerConfig {
            identifier: None,
            ..Default::default()
        };
        let clean = TrackCleaner::new(config).clean(&raw).unwrap();
        assert_eq!(clean.n_rows(), 4);
    }

    #[test]
    fn test_text_column_marked_categorical() {
        let schema = Schema::from_pairs(&[("mood", ColumnKind::Numeric), ("x", ColumnKind::Numeric)]);
        let raw = Dataset::from_rows(
            schema,
            vec![vec!["calm".into(), Value::Int(1)], vec!["angry".into(), Value::Int(2)]],
        )
        .unwrap();
        let config = CleanerConfig {
            validation: ValidationConfig { required: Vec::new() },
            ..Default::default()
        };

        let clean = TrackCleaner::new(config).clean(&raw).unwrap();
        assert_eq!(clean.schema().kind_of("mood"), Some(ColumnKind::Categorical));
        assert_eq!(clean.schema().kind_of("x"), Some(ColumnKind::Numeric));
    }

    fn arb_row() -> impl Strategy<Value = Vec<Value>> {
        (
            0..4i64,
            prop::sample::select(vec!["A", "B", "C"]),
            prop::option::of(any::<bool>()),
            prop::option::of(0..3i64),
            prop::sample::select(vec!["pop", "rock"]),
        )
            .prop_map(|(id, artist, explicit, energy, genre)| {
                vec![
                    Value::Text(format!("id{}", id)),
                    artist.into(),
                    explicit.map_or(Value::Missing, Value::Bool),
                    energy.map_or(Value::Missing, Value::Int),
                    genre.into(),
                ]
            })
    }

    fn arb_dataset() -> impl Strategy<Value = Dataset> {
        prop::collection::vec(arb_row(), 0..24).prop_map(|rows| {
            let schema = Schema::from_pairs(&[
                ("track_id", ColumnKind::Identifier),
                ("artists", ColumnKind::Identifier),
                ("explicit", ColumnKind::Boolean),
                ("energy", ColumnKind::Numeric),
                ("track_genre", ColumnKind::Categorical),
            ]);
            Dataset::from_rows(schema, rows).unwrap()
        })
    }

    fn lenient_cleaner() -> TrackCleaner {
        TrackCleaner::new(CleanerConfig {
            validation: ValidationConfig { required: Vec::new() },
            ..Default::default()
        })
    }

    proptest! {
        #[test]
        fn prop_cleaning_is_idempotent(raw in arb_dataset()) {
            let cleaner = lenient_cleaner();
            let once = cleaner.clean(&raw).unwrap();
            let twice = cleaner.clean(&once).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_no_identifier_survives(raw in arb_dataset()) {
            let clean = lenient_cleaner().clean(&raw).unwrap();
            prop_assert!(!clean.schema().contains("track_id"));
            prop_assert!(!clean.schema().contains("artists"));
            prop_assert!(clean
                .schema()
                .columns()
                .iter()
                .all(|c| c.kind != ColumnKind::Identifier));
        }

        #[test]
        fn prop_shared_identifier_keeps_first(energy in 0..3i64, copies in 1..6usize) {
            let schema = Schema::from_pairs(&[
                ("track_id", ColumnKind::Identifier),
                ("energy", ColumnKind::Numeric),
                ("album_name", ColumnKind::Identifier),
            ]);
            let rows = (0..copies)
                .map(|i| vec!["id1".into(), Value::Int(energy + i as i64), Value::Text(format!("album {}", i))])
                .collect();
            let raw = Dataset::from_rows(schema, rows).unwrap();

            let clean = lenient_cleaner().clean(&raw).unwrap();
            prop_assert_eq!(clean.n_rows(), 1);
            prop_assert_eq!(clean.value(0, "energy"), Some(&Value::Int(energy)));
        }
    }
}
