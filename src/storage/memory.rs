//! In-process store
//!
//! Holds the same encoded entries a [`FileStore`](super::FileStore) document
//! would, behind a mutex. Validation and key normalization are identical, so
//! it is contract-equivalent to the file store without touching disk.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::document::Entries;
use super::traits::KeyValueStore;
use crate::domain::{IntoKey, Value};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Entries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        // Entries are never left half-updated, so a poisoned lock is still usable
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn set<K: IntoKey, V: Into<Value>>(&self, key: K, value: V) -> Result<()> {
        let field = key.into_key()?.normalize();
        let encoded = value.into().to_json()?;
        self.entries().insert(field, encoded);
        Ok(())
    }

    fn get<K: IntoKey>(&self, key: K) -> Result<Option<Value>> {
        let field = key.into_key()?.normalize();
        Ok(self.entries().get(&field).cloned().map(Value::from_json))
    }

    fn remove<K: IntoKey>(&self, key: K) -> Result<bool> {
        let field = key.into_key()?.normalize();
        Ok(self.entries().remove(&field).is_some())
    }

    fn has<K: IntoKey>(&self, key: K) -> Result<bool> {
        let field = key.into_key()?.normalize();
        Ok(self.entries().contains_key(&field))
    }

    fn clear(&self) -> Result<()> {
        self.entries().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn basic_operations() {
        let store = MemoryStore::new();

        store.set("a", 1).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(Value::Int(1)));
        assert_eq!(store.len(), 1);

        assert!(store.remove("a").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn shared_across_threads() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..25 {
                        store.set(format!("{}-{}", t, i), i).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 100);
    }
}
