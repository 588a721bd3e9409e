//! Persistence shim: load, save and clear a serialized blob under a key.
//!
//! The game keeps one save blob per key. [`FileSaveStore`] maps each key to
//! `<dir>/<key>.json`; [`MemorySaveStore`] keeps blobs in a map for tests
//! and for sessions that should not touch the disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::LogError;

/// Key/blob storage for saved game state.
pub trait SaveStore {
    /// Read the blob stored under `key`. A missing key is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] if the backing storage cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, LogError>;

    /// Store `blob` under `key`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] if the backing storage cannot be written.
    fn save(&mut self, key: &str, blob: &str) -> Result<(), LogError>;

    /// Remove the blob under `key`. Clearing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] if the backing storage cannot be modified.
    fn clear(&mut self, key: &str) -> Result<(), LogError>;
}

/// In-memory [`SaveStore`].
#[derive(Debug, Clone, Default)]
pub struct MemorySaveStore {
    blobs: BTreeMap<String, String>,
}

impl MemorySaveStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemorySaveStore {
    fn load(&self, key: &str) -> Result<Option<String>, LogError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), LogError> {
        self.blobs.insert(key.to_owned(), blob.to_owned());
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), LogError> {
        self.blobs.remove(key);
        Ok(())
    }
}

/// [`SaveStore`] backed by one JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileSaveStore {
    dir: PathBuf,
}

impl FileSaveStore {
    /// Store saves under `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the save files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, LogError> {
        let usable = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !usable {
            return Err(LogError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SaveStore for FileSaveStore {
    fn load(&self, key: &str) -> Result<Option<String>, LogError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), LogError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        // The file at `path` always holds either the previous or the new blob.
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, blob)?;
        std::fs::rename(&staging, &path)?;
        debug!(path = %path.display(), bytes = blob.len(), "save written");
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), LogError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "save cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
