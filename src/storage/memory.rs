//! In-memory key-value store

use super::error::{StorageError, StorageResult};
use super::KeyValueStore;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Key-value store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    read_only: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, simulating a full or locked disk
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|e| e.is_empty()).unwrap_or(true)
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("store is read-only".to_string()))
        } else {
            Ok(())
        }
    }

    fn entries(&self) -> StorageResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> StorageResult<()> {
        self.check_writable()?;
        let mut all = self.entries()?;
        for (key, value) in entries {
            all.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> StorageResult<()> {
        self.check_writable()?;
        let mut all = self.entries()?;
        for key in keys {
            all.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_rejects_writes() {
        let store = MemoryStore::new();
        store.set_many(&[("token", "abc".to_string())]).unwrap();

        store.set_read_only(true);
        assert!(store.set_many(&[("token", "def".to_string())]).is_err());
        assert!(store.remove_many(&["token"]).is_err());
        assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));

        store.set_read_only(false);
        store.remove_many(&["token"]).unwrap();
        assert!(store.is_empty());
    }
}
