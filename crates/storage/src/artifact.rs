//! Versioned Artifact Envelope

use crate::{ArtifactStore, StorageError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Envelope layout version written by this build
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    format_version: u32,
    payload: T,
}

#[derive(Deserialize)]
struct Header {
    format_version: u32,
}

/// Artifact families stored side by side under one prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    Model,
    Preprocessor,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Model => "model",
            ArtifactKind::Preprocessor => "preprocessor",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store key for an artifact, `<prefix>-<kind>_<version>`
pub fn artifact_key(prefix: &str, kind: ArtifactKind, version: &str) -> String {
    format!("{}-{}_{}", prefix, kind, version)
}

/// Encode `value` and store it under `key`
pub fn save_artifact<T: Serialize>(
    store: &dyn ArtifactStore,
    key: &str,
    value: &T,
) -> Result<String, StorageError> {
    let envelope = Envelope {
        format_version: FORMAT_VERSION,
        payload: value,
    };
    let bytes = postcard::to_allocvec(&envelope)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    debug!("Encoded {} ({} bytes)", key, bytes.len());
    store.save(key, &bytes)
}

/// Load and decode the artifact under `key`
pub fn load_artifact<T: DeserializeOwned>(
    store: &dyn ArtifactStore,
    key: &str,
) -> Result<T, StorageError> {
    let bytes = store.load(key)?;

    // The version leads the envelope, so it decodes regardless of payload.
    let header: Header = postcard::take_from_bytes(&bytes)
        .map(|(h, _)| h)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    if header.format_version != FORMAT_VERSION {
        warn!(
            "Artifact {} has format v{}, expected v{}",
            key, header.format_version, FORMAT_VERSION
        );
        return Err(StorageError::IncompatibleFormat {
            expected: FORMAT_VERSION,
            found: header.format_version,
        });
    }

    let envelope: Envelope<T> =
        postcard::from_bytes(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(envelope.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileArtifactStore, MemoryArtifactStore};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Weights {
        values: Vec<f64>,
        bias: f64,
    }

    fn weights() -> Weights {
        Weights {
            values: vec![0.5, -1.25, 3.0],
            bias: 42.0,
        }
    }

    #[test]
    fn test_artifact_key_layout() {
        assert_eq!(artifact_key("spotify", ArtifactKind::Model, "v1"), "spotify-model_v1");
        assert_eq!(
            artifact_key("spotify", ArtifactKind::Preprocessor, "v1"),
            "spotify-preprocessor_v1"
        );
    }

    #[test]
    fn test_round_trip_memory() {
        let store = MemoryArtifactStore::new();
        save_artifact(&store, "spotify-model_v1", &weights()).unwrap();
        let loaded: Weights = load_artifact(&store, "spotify-model_v1").unwrap();
        assert_eq!(loaded, weights());
    }

    #[test]
    fn test_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileArtifactStore::new(dir.path()).unwrap();
        save_artifact(&store, "spotify-preprocessor_v2", &weights()).unwrap();

        // A fresh handle on the same directory sees the artifact
        let reopened = FileArtifactStore::new(dir.path()).unwrap();
        let loaded: Weights = load_artifact(&reopened, "spotify-preprocessor_v2").unwrap();
        assert_eq!(loaded, weights());
    }

    #[test]
    fn test_missing_artifact() {
        let store = MemoryArtifactStore::new();
        let result: Result<Weights, _> = load_artifact(&store, "spotify-model_v9");
        assert_eq!(result, Err(StorageError::NotFound("spotify-model_v9".to_string())));
    }

    #[test]
    fn test_format_version_mismatch() {
        let store = MemoryArtifactStore::new();
        let stale = Envelope {
            format_version: FORMAT_VERSION + 1,
            payload: weights(),
        };
        store.save("k", &postcard::to_allocvec(&stale).unwrap()).unwrap();

        let result: Result<Weights, _> = load_artifact(&store, "k");
        assert_eq!(
            result,
            Err(StorageError::IncompatibleFormat {
                expected: FORMAT_VERSION,
                found: FORMAT_VERSION + 1,
            })
        );
    }

    #[test]
    fn test_corrupt_payload() {
        let store = MemoryArtifactStore::new();
        store.save("k", &[FORMAT_VERSION as u8]).unwrap();
        let result: Result<Weights, _> = load_artifact(&store, "k");
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }
}
