//! Persistent storage for the trust store's cached data.

use crate::error::{PinningError, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Opaque key to bytes persistent store.
///
/// The trust store keys its data by instance identifier, so several
/// independent stores may share one backend.
pub trait SecureDataStore: Send + Sync {
    /// Persist `data` under `key`, replacing any previous value
    fn save(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Load the value stored under `key`
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store, useful for tests and for hosts that do not persist pins
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryDataStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SecureDataStore for MemoryDataStore {
    fn save(&self, key: &str, data: &[u8]) -> Result<()> {
        self.entries().insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries().get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Store keeping one file per key in a directory.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// reader never sees a partially written value.
#[derive(Debug, Clone)]
pub struct FileDataStore {
    dir: PathBuf,
}

impl FileDataStore {
    /// Use `dir` as the storage directory, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| PinningError::Storage(format!("{}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    /// Storage directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", URL_SAFE_NO_PAD.encode(key)))
    }
}

fn storage_error(path: &Path, err: &std::io::Error) -> PinningError {
    PinningError::Storage(format!("{}: {err}", path.display()))
}

impl SecureDataStore for FileDataStore {
    fn save(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, data).map_err(|e| storage_error(&tmp, &e))?;
        std::fs::rename(&tmp, &path).map_err(|e| storage_error(&path, &e))?;
        debug!(path = %path.display(), bytes = data.len(), "saved cached data");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match std::fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(&path, &e)),
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(&path, &e)),
        }
    }
}
