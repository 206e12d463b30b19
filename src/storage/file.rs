//! Durable file-backed store
//!
//! The whole key space is one JSON object on disk. Every call re-reads the
//! document, so a handle never serves stale data relative to writes made by
//! other handles or other processes.

use std::path::{Path, PathBuf};

use super::config::{ConfigError, StoreConfig};
use super::document::{Commit, DocumentFile};
use super::traits::KeyValueStore;
use crate::domain::{IntoKey, Value};
use crate::error::Result;

/// Key-value store persisted as a single JSON document
///
/// Parent directories and the document itself are created by the first
/// mutating call. The store never deletes the document; [`clear`] empties it.
///
/// [`clear`]: KeyValueStore::clear
#[derive(Debug, Clone)]
pub struct FileStore {
    document: DocumentFile,
}

impl FileStore {
    /// Binds a store to `path`, creating missing directories on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: DocumentFile::new(path.into(), true, false),
        }
    }

    /// Builds a store from configuration. The path must be set.
    pub fn from_config(config: &StoreConfig) -> std::result::Result<Self, ConfigError> {
        let path = config
            .path
            .clone()
            .ok_or_else(|| ConfigError::Invalid("store path is not set".to_string()))?;

        Ok(Self {
            document: DocumentFile::new(path, config.create_missing_directories, config.pretty),
        })
    }

    /// Whether a missing parent directory is created (true) or reported as a
    /// write failure (false)
    pub fn create_missing_directories(mut self, enabled: bool) -> Self {
        self.document.set_create_missing_directories(enabled);
        self
    }

    /// Write the document indented instead of compact
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.document.set_pretty(enabled);
        self
    }

    /// Returns the path to the store document
    pub fn path(&self) -> &Path {
        self.document.path()
    }

    pub fn creates_missing_directories(&self) -> bool {
        self.document.creates_directories()
    }

    pub fn is_pretty(&self) -> bool {
        self.document.is_pretty()
    }

    /// Returns the number of stored keys
    pub fn len(&self) -> Result<usize> {
        Ok(self.document.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns the normalized keys currently stored, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.document.read()?.into_keys().collect())
    }
}

impl KeyValueStore for FileStore {
    fn set<K: IntoKey, V: Into<Value>>(&self, key: K, value: V) -> Result<()> {
        let field = key.into_key()?.normalize();
        let encoded = value.into().to_json()?;

        self.document.update(|entries| {
            entries.insert(field, encoded);
            ((), Commit::Replace)
        })
    }

    fn get<K: IntoKey>(&self, key: K) -> Result<Option<Value>> {
        let field = key.into_key()?.normalize();
        let mut entries = self.document.read()?;
        Ok(entries.remove(&field).map(Value::from_json))
    }

    fn remove<K: IntoKey>(&self, key: K) -> Result<bool> {
        let field = key.into_key()?.normalize();

        self.document.update(|entries| {
            if entries.remove(&field).is_some() {
                (true, Commit::Replace)
            } else {
                (false, Commit::Keep)
            }
        })
    }

    fn has<K: IntoKey>(&self, key: K) -> Result<bool> {
        let field = key.into_key()?.normalize();
        Ok(self.document.read()?.contains_key(&field))
    }

    fn clear(&self) -> Result<()> {
        self.document.update(|entries| {
            entries.clear();
            ((), Commit::Replace)
        })
    }
}
