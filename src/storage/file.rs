//! File-backed key-value store
//!
//! All keys live in one JSON object. Every change rewrites the whole
//! document to a temporary file and renames it over the original, so a
//! crash leaves either the old or the new document, never a mix.

use super::error::{StorageError, StorageResult};
use super::KeyValueStore;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Distinguishes temp files of concurrent writers within one process
static TMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Key-value store persisted as a single JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> StorageResult<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            };
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp = self.tmp_path();
        let written = create_private(&tmp)
            .and_then(|mut file| {
                file.write_all(&bytes)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        tracing::trace!(path = %self.path.display(), keys = entries.len(), "Persisted store");
        Ok(())
    }

    /// Unique sibling of the store file, so that the rename stays on one
    /// filesystem and concurrent writers never share a temp file
    fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());
        let sequence = TMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        self.path
            .with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), sequence))
    }

    fn guard(&self) -> StorageResult<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }
}

/// Create a new file readable only by the owner before anything is written
fn create_private(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.guard()?;
        Ok(self.read_all()?.remove(key))
    }

    fn set_many(&self, entries: &[(&str, String)]) -> StorageResult<()> {
        let _guard = self.guard()?;
        let mut all = self.read_all().unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable store");
            BTreeMap::new()
        });
        for (key, value) in entries {
            all.insert((*key).to_string(), value.clone());
        }
        self.write_all(&all)
    }

    fn remove_many(&self, keys: &[&str]) -> StorageResult<()> {
        let _guard = self.guard()?;
        let mut all = self.read_all().unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable store");
            BTreeMap::new()
        });
        for key in keys {
            all.remove(*key);
        }
        self.write_all(&all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_get_remove() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));

        assert_eq!(store.get("token").unwrap(), None);

        store
            .set_many(&[("token", "abc".to_string()), ("user", "{}".to_string())])
            .unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));
        assert_eq!(store.get("user").unwrap().as_deref(), Some("{}"));

        store.remove_many(&["token", "user"]).unwrap();
        assert_eq!(store.get("token").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_persistence_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileStore::new(&path)
            .set_many(&[("token", "abc".to_string())])
            .unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_partial_remove_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));

        store
            .set_many(&[("token", "abc".to_string()), ("theme", "dark".to_string())])
            .unwrap();
        store.remove_many(&["token"]).unwrap();

        assert_eq!(store.get("token").unwrap(), None);
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_corrupt_file_is_reported_then_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(store.get("token"), Err(StorageError::Serialization(_))));

        store.set_many(&[("token", "fresh".to_string())]).unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("fresh"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));
        store.set_many(&[("token", "abc".to_string())]).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_temp_file_private_before_write() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));
        let tmp = store.tmp_path();

        let _file = create_private(&tmp).unwrap();

        let mode = fs::metadata(&tmp).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
        assert!(create_private(&tmp).is_err());
    }

    #[test]
    fn test_writes_leave_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));
        assert_ne!(store.tmp_path(), store.tmp_path());

        store.set_many(&[("token", "abc".to_string())]).unwrap();
        store.set_many(&[("token", "def".to_string())]).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("session.json")]);
    }
}
