//! Artifact Store Implementations

use crate::StorageError;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, info};

/// File extension of stored blobs
const BLOB_EXTENSION: &str = "bin";

/// Durable key/blob storage
///
/// Single writer per key; concurrent saves to one key must be serialized by
/// the caller.
pub trait ArtifactStore: Send + Sync {
    /// Store `bytes` under `key`, returning where they landed
    fn save(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// Read the blob under `key`; [`StorageError::NotFound`] if absent
    fn load(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Whether `key` holds a blob
    fn contains(&self, key: &str) -> bool;

    /// Delete the blob under `key`, returning whether one existed
    fn remove(&self, key: &str) -> Result<bool, StorageError>;
}

fn check_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0']);
    if bad {
        Err(StorageError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}

/// Stores each artifact as `<base_dir>/<key>.bin`
pub struct FileArtifactStore {
    base_dir: PathBuf,
}

impl FileArtifactStore {
    /// Open a store rooted at `base_dir`, creating the directory if needed
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(|e| StorageError::Io {
            path: base_dir.display().to_string(),
            message: e.to_string(),
        })?;
        info!("Opened artifact store at {}", base_dir.display());
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.{}", key, BLOB_EXTENSION))
    }
}

impl ArtifactStore for FileArtifactStore {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        check_key(key)?;
        let path = self.path_for(key);
        let tmp = self.base_dir.join(format!(".{}.{}.tmp", key, BLOB_EXTENSION));
        let io_err = |p: &Path, e: std::io::Error| StorageError::Io {
            path: p.display().to_string(),
            message: e.to_string(),
        };

        // Write aside then rename so readers never observe a partial blob.
        let write = || -> Result<(), StorageError> {
            let mut file = fs::File::create(&tmp).map_err(|e| io_err(&tmp, e))?;
            file.write_all(bytes).map_err(|e| io_err(&tmp, e))?;
            file.sync_all().map_err(|e| io_err(&tmp, e))?;
            fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))
        };
        if let Err(e) = write() {
            error!("Failed to save {}: {}", key, e);
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(path.display().to_string())
    }

    fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        check_key(key)?;
        let path = self.path_for(key);
        if !path.is_file() {
            error!("Artifact does not exist: {}", path.display());
            return Err(StorageError::NotFound(key.to_string()));
        }
        let bytes = fs::read(&path).map_err(|e| StorageError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        info!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Ok(bytes)
    }

    fn contains(&self, key: &str) -> bool {
        check_key(key).is_ok() && self.path_for(key).is_file()
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        check_key(key)?;
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Removed {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// In-process store, for tests and ephemeral runs
pub struct MemoryArtifactStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    /// Create an empty store
    pub fn new() -> Self {
        debug!("Creating in-memory artifact store");
        Self {
            blobs: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored artifacts
    pub fn len(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        check_key(key)?;
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|e| StorageError::Io {
                path: key.to_string(),
                message: format!("Lock error: {}", e),
            })?;
        blobs.insert(key.to_string(), bytes.to_vec());
        debug!("Stored {} in memory ({} bytes)", key, bytes.len());
        Ok(format!("memory://{}", key))
    }

    fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        check_key(key)?;
        let blobs = self
            .blobs
            .lock()
            .map_err(|e| StorageError::Io {
                path: key.to_string(),
                message: format!("Lock error: {}", e),
            })?;
        blobs
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn contains(&self, key: &str) -> bool {
        self.blobs.lock().map(|b| b.contains_key(key)).unwrap_or(false)
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        check_key(key)?;
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|e| StorageError::Io {
                path: key.to_string(),
                message: format!("Lock error: {}", e),
            })?;
        let existed = blobs.remove(key).is_some();
        debug!("Removed {} from memory: {}", key, existed);
        Ok(existed)
    }
}
