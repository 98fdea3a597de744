//! Storage Layer
//!
//! Keyed persistence for fitted transform states and trained models, with a
//! versioned postcard envelope around every artifact.

mod artifact;
mod store;

pub use artifact::{
    artifact_key, load_artifact, save_artifact, ArtifactKind, FORMAT_VERSION,
};
pub use store::{ArtifactStore, FileArtifactStore, MemoryArtifactStore};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("Artifact not found: {0}")]
    NotFound(String),
    #[error("Invalid artifact key: '{0}'")]
    InvalidKey(String),
    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Incompatible artifact format: expected v{expected}, found v{found}")]
    IncompatibleFormat { expected: u32, found: u32 },
}
