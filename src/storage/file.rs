//! FileStorage - one JSON object per data directory
//!
//! Every write rewrites the whole file (temp file + rename). The map is small:
//! two intent keys plus one cache entry per address.

use super::DurableStorage;
use crate::error::{StorageError, StorageResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const FILE_NAME: &str = "storage.json";
const APP_DIR: &str = "redpack";
const DATA_DIR_ENV: &str = "REDPACK_DATA_DIR";

pub struct FileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or create) `storage.json` inside `dir`
    pub fn open(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(FILE_NAME);
        let items = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), entries = items.len(), "FileStorage opened");
        Ok(Self { path, items: Mutex::new(items) })
    }

    /// `$REDPACK_DATA_DIR`, else `<platform data dir>/redpack`
    pub fn default_dir() -> StorageResult<PathBuf> {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() { return Ok(PathBuf::from(dir)); }
        }
        dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .ok_or_else(|| StorageError::Unavailable("no platform data directory".into()))
    }

    pub fn open_default() -> StorageResult<Self> { Self::open(Self::default_dir()?) }

    pub fn path(&self) -> &Path { &self.path }

    fn flush(&self, items: &BTreeMap<String, String>) -> StorageResult<()> {
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(items)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn poisoned() -> StorageError { StorageError::Unavailable("lock poisoned".into()) }

impl DurableStorage for FileStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.lock().map_err(|_| poisoned())?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = self.items.lock().map_err(|_| poisoned())?;
        items.insert(key.to_string(), value.to_string());
        self.flush(&items)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut items = self.items.lock().map_err(|_| poisoned())?;
        if items.remove(key).is_some() {
            self.flush(&items)?;
        }
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.items.lock().map_err(|_| poisoned())?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn values_survive_reopen() {
        let dir = TempDir::new().expect("tempdir");
        {
            let storage = FileStorage::open(dir.path()).expect("open");
            storage.set_item("walletConnected", "true").unwrap();
            storage.set_item("walletAddress", "0xabc").unwrap();
            storage.remove_item("walletConnected").unwrap();
        }
        let storage = FileStorage::open(dir.path()).expect("reopen");
        assert_eq!(storage.get_item("walletAddress").unwrap().as_deref(), Some("0xabc"));
        assert_eq!(storage.get_item("walletConnected").unwrap(), None);
    }

    #[test]
    fn corrupted_file_fails_to_open() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join(FILE_NAME), "{not json").unwrap();
        assert!(matches!(FileStorage::open(dir.path()), Err(StorageError::Serialization(_))));
    }
}
