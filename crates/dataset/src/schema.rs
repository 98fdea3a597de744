//! Declared Column Kinds

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the regression target
pub const TARGET_COLUMN: &str = "popularity";

/// Column used to deduplicate tracks
pub const IDENTIFIER_COLUMN: &str = "track_id";

/// Free-text columns too high-cardinality to model
pub const HIGH_CARDINALITY_COLUMNS: [&str; 3] = ["artists", "album_name", "track_name"];

/// Stray technical columns written by dataframe exports
pub const DENYLISTED_COLUMNS: [&str; 2] = ["Unnamed: 0", ""];

/// Semantic kind declared for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Integer or real measurement
    Numeric,
    /// True/false flag
    Boolean,
    /// Closed set of text levels
    Categorical,
    /// Identifier or free text, never modeled
    Identifier,
}

impl ColumnKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Identifier => "identifier",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named column with its declared kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered set of columns shared by every row of a dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Create a schema from ordered columns
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Create a schema from `(name, kind)` pairs
    pub fn from_pairs(pairs: &[(&str, ColumnKind)]) -> Self {
        Self::new(pairs.iter().map(|(name, kind)| Column::new(*name, *kind)).collect())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Declared kind of a column by name
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.kind)
    }

    /// Column names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub(crate) fn set_kind(&mut self, index: usize, kind: ColumnKind) {
        self.columns[index].kind = kind;
    }

    pub(crate) fn remove(&mut self, index: usize) -> Column {
        self.columns.remove(index)
    }
}

/// Declared schema of the public track popularity dataset
pub fn track_schema() -> Schema {
    Schema::from_pairs(&[
        ("Unnamed: 0", ColumnKind::Numeric),
        ("track_id", ColumnKind::Identifier),
        ("artists", ColumnKind::Identifier),
        ("album_name", ColumnKind::Identifier),
        ("track_name", ColumnKind::Identifier),
        ("popularity", ColumnKind::Numeric),
        ("duration_ms", ColumnKind::Numeric),
        ("explicit", ColumnKind::Boolean),
        ("danceability", ColumnKind::Numeric),
        ("energy", ColumnKind::Numeric),
        ("key", ColumnKind::Numeric),
        ("loudness", ColumnKind::Numeric),
        ("mode", ColumnKind::Numeric),
        ("speechiness", ColumnKind::Numeric),
        ("acousticness", ColumnKind::Numeric),
        ("instrumentalness", ColumnKind::Numeric),
        ("liveness", ColumnKind::Numeric),
        ("valence", ColumnKind::Numeric),
        ("tempo", ColumnKind::Numeric),
        ("time_signature", ColumnKind::Numeric),
        ("track_genre", ColumnKind::Categorical),
    ])
}
