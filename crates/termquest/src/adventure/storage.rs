//! Save-slot storage for adventure progress
//!
//! A [`Storage`] is a flat key/value store of strings. Reads that fail for
//! any reason look like a missing key to the caller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::Result;

/// Key/value store for persisted game state.
pub trait Storage: Send + Sync {
    /// The value under `key`, or `None` when absent or unreadable.
    fn load(&self, key: &str) -> Option<String>;

    /// Replace the value under `key`.
    fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Drop `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local storage; progress is lost with the value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// One JSON file per key under a directory.
///
/// The directory is created on first save.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.load("k"), None);
        storage.save("k", "v1").unwrap();
        storage.save("k", "v2").unwrap();
        assert_eq!(storage.load("k").as_deref(), Some("v2"));
        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert_eq!(storage.load("k"), None);
    }

    #[test]
    fn test_memory_storage_survives_poisoned_lock() {
        let storage = std::sync::Arc::new(MemoryStorage::new());
        storage.save("k", "before").unwrap();

        let held = storage.clone();
        let panicked = std::thread::spawn(move || {
            let _guard = held.entries.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(panicked.is_err());
        assert!(storage.entries.is_poisoned());

        assert_eq!(storage.load("k").as_deref(), Some("before"));
        storage.save("k", "after").unwrap();
        assert_eq!(storage.load("k").as_deref(), Some("after"));
        storage.remove("k").unwrap();
        assert_eq!(storage.load("k"), None);
    }

    #[test]
    fn test_file_storage_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(tmp.path().join("saves"));
        assert_eq!(storage.load("slot"), None);

        storage.save("slot", "{}").unwrap();
        assert!(tmp.path().join("saves/slot.json").exists());
        assert_eq!(storage.load("slot").as_deref(), Some("{}"));

        storage.remove("slot").unwrap();
        storage.remove("slot").unwrap();
        assert_eq!(storage.load("slot"), None);
    }
}
