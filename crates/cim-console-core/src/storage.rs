//! Persistent key/value storage for session data.
//!
//! `FileStorage` keeps every key in one JSON object on disk and re-reads the
//! file on each access, so several console processes pointed at the same
//! directory see each other's writes. There is no locking between them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::debug;

/// Storage file name inside the storage directory
const STORAGE_FILE: &str = "local_storage.json";

/// Key holding the raw bearer token
pub const TOKEN_KEY: &str = "access_token";

/// Key holding the serialized identity record
pub const USER_KEY: &str = "user";

pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORAGE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage file {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).context("Failed to parse storage file")
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write storage file {}", self.path.display()))?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)?;
        debug!(key, "Storage key written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
            debug!(key, "Storage key removed");
        }
        Ok(())
    }
}

/// In-process storage, used for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory storage lock poisoned"))
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Memory storage whose reads or removals can be made to fail.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct FaultyStorage {
    inner: MemoryStorage,
    pub fail_get: bool,
    pub fail_remove: bool,
}

#[cfg(test)]
impl FaultyStorage {
    /// Seeded with a signed-in session
    pub fn signed_in() -> Self {
        let storage = Self::default();
        storage.inner.set(TOKEN_KEY, "abc123").unwrap();
        storage.inner.set(USER_KEY, r#"{"name":"Alice"}"#).unwrap();
        storage
    }
}

#[cfg(test)]
impl Storage for FaultyStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_get {
            anyhow::bail!("storage unavailable");
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.fail_remove {
            anyhow::bail!("storage is read-only");
        }
        self.inner.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        // Removing from an empty store must not create the file
        storage.remove(TOKEN_KEY).unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_file_storage_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set(TOKEN_KEY, "abc123").unwrap();
        storage.set(USER_KEY, r#"{"name":"Alice"}"#).unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("abc123"));

        storage.remove(TOKEN_KEY).unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(
            storage.get(USER_KEY).unwrap().as_deref(),
            Some(r#"{"name":"Alice"}"#)
        );
    }

    #[test]
    fn test_file_storage_shared_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        let first = FileStorage::new(dir.path());
        let second = FileStorage::new(dir.path());

        first.set(TOKEN_KEY, "abc123").unwrap();
        assert_eq!(second.get(TOKEN_KEY).unwrap().as_deref(), Some("abc123"));

        second.remove(TOKEN_KEY).unwrap();
        assert_eq!(first.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_storage_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        std::fs::write(storage.path(), "not json").unwrap();
        assert!(storage.get(TOKEN_KEY).is_err());
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "t").unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("t"));
        storage.remove(TOKEN_KEY).unwrap();
        storage.remove(TOKEN_KEY).unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }
}
