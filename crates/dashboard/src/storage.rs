//! Persistent key-value storage behind the client cache.
//!
//! Mirrors a browser's local storage: string keys, string values, a size
//! quota that makes writes fail once full.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::errors::StorageError;

pub trait KvStorage: Send + Sync {
    fn keys(&self) -> Vec<String>;
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Default quota, in bytes of keys plus values.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn used_bytes(map: &BTreeMap<String, String>) -> usize {
    map.iter().map(|(k, v)| k.len() + v.len()).sum()
}

/// Bytes the map would occupy after writing `key = value`.
fn bytes_after_write(map: &BTreeMap<String, String>, key: &str, value: &str) -> usize {
    let replaced = map.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
    used_bytes(map) - replaced + key.len() + value.len()
}

/// In-process storage with a byte quota.
#[derive(Debug)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
    quota: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }

    pub fn with_quota(quota: usize) -> Self {
        Self { items: Mutex::new(BTreeMap::new()), quota }
    }

    pub fn used_bytes(&self) -> usize {
        used_bytes(&lock(&self.items))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStorage for MemoryStorage {
    fn keys(&self) -> Vec<String> {
        lock(&self.items).keys().cloned().collect()
    }

    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.items).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = lock(&self.items);
        let needed = bytes_after_write(&items, key, value);
        if needed > self.quota {
            return Err(StorageError::QuotaExceeded { needed, quota: self.quota });
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.items).remove(key);
        Ok(())
    }
}

/// Storage persisted as a single JSON object file, rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
    quota: usize,
}

impl FileStorage {
    /// Open (or create) the storage file. An unreadable file starts empty.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StorageError> {
        Self::open_with_quota(path, DEFAULT_QUOTA_BYTES)
    }

    pub fn open_with_quota<P: Into<PathBuf>>(path: P, quota: usize) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let items = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                debug!(path = %path.display(), error = %e, "discarding unreadable storage file");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Ok(Self { path, items: Mutex::new(items), quota })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let contents = serde_json::to_string(items)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl KvStorage for FileStorage {
    fn keys(&self) -> Vec<String> {
        lock(&self.items).keys().cloned().collect()
    }

    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.items).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = lock(&self.items);
        let needed = bytes_after_write(&items, key, value);
        if needed > self.quota {
            return Err(StorageError::QuotaExceeded { needed, quota: self.quota });
        }
        let mut next = items.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *items = next;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = lock(&self.items);
        if !items.contains_key(key) {
            return Ok(());
        }
        let mut next = items.clone();
        next.remove(key);
        self.persist(&next)?;
        *items = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_quota_rejects_oversized_writes() {
        let s = MemoryStorage::with_quota(10);
        s.set_item("a", "12345").unwrap();
        assert!(matches!(s.set_item("b", "123456"), Err(StorageError::QuotaExceeded { .. })));
        // replacing a value only counts the difference
        s.set_item("a", "123456789").unwrap();
        assert_eq!(s.used_bytes(), 10);
        s.remove_item("a").unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn file_storage_survives_reopen() {
        let path = std::env::temp_dir().join(format!("kv_storage_{}.json", uuid::Uuid::new_v4()));
        let s = FileStorage::open(&path).unwrap();
        s.set_item("k", "v").unwrap();
        drop(s);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item("k").as_deref(), Some("v"));
        reopened.remove_item("k").unwrap();
        assert_eq!(reopened.len(), 0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn failed_write_keeps_memory_in_sync_with_disk() {
        let dir = std::env::temp_dir().join(format!("kv_storage_dir_{}", uuid::Uuid::new_v4()));
        let s = FileStorage::open(dir.join("store.json")).unwrap();
        s.set_item("kept", "1").unwrap();

        std::fs::remove_dir_all(&dir).unwrap();
        assert!(matches!(s.set_item("lost", "2"), Err(StorageError::Io(_))));
        assert!(s.get_item("lost").is_none());
        assert!(s.remove_item("kept").is_err());
        assert_eq!(s.get_item("kept").as_deref(), Some("1"));
        assert_eq!(s.keys(), vec!["kept".to_string()]);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let path = std::env::temp_dir().join(format!("kv_storage_bad_{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "not json").unwrap();
        let s = FileStorage::open(&path).unwrap();
        assert!(s.is_empty());
        let _ = std::fs::remove_file(&path);
    }
}
