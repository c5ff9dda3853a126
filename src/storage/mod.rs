//! Durable client storage - string keys surviving reloads
//!
//! Backends:
//! - `MemoryStorage`: process-local map (tests, ephemeral sessions)
//! - `FileStorage`: JSON file on disk (native)
//!
//! The session persists its "last connected" intent here; the stats cache keeps
//! one entry per wallet address.

#[cfg(feature = "native")]
mod file;

#[cfg(feature = "native")]
pub use file::FileStorage;

use crate::error::{StorageError, StorageResult};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Key/value storage scoped to one origin (browser `localStorage` semantics)
pub trait DurableStorage: Send + Sync {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove_item(&self, key: &str) -> StorageResult<()>;
    fn keys(&self) -> StorageResult<Vec<String>>;
}

/// In-memory storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }
}

fn poisoned() -> StorageError { StorageError::Unavailable("lock poisoned".into()) }

impl DurableStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.read().map_err(|_| poisoned())?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.items.write().map_err(|_| poisoned())?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.items.write().map_err(|_| poisoned())?.remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.items.read().map_err(|_| poisoned())?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("a").unwrap(), None);
        storage.set_item("a", "1").unwrap();
        storage.set_item("b", "2").unwrap();
        assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("1"));
        assert_eq!(storage.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
        storage.remove_item("a").unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);
        // Removing a missing key is not an error
        storage.remove_item("a").unwrap();
    }
}
