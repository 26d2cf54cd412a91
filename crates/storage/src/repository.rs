use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Logical names the tracker persists under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKey {
    Subjects,
    Chapters,
    Tasks,
    User,
    Theme,
}

impl StoreKey {
    pub const ALL: [StoreKey; 5] = [
        StoreKey::Subjects,
        StoreKey::Chapters,
        StoreKey::Tasks,
        StoreKey::User,
        StoreKey::Theme,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::Subjects => "subjects",
            StoreKey::Chapters => "chapters",
            StoreKey::Tasks => "tasks",
            StoreKey::User => "user",
            StoreKey::Theme => "theme",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable text store keyed by logical name.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`.
    ///
    /// Returns `Ok(None)` when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: StoreKey) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn put(&self, key: StoreKey, value: &str) -> Result<(), StorageError>;

    /// Remove the value under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: StoreKey) -> Result<(), StorageError>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<StoreKey, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&key).cloned())
    }

    async fn put(&self, key: StoreKey, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key, value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: StoreKey) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&key);
        Ok(())
    }
}

/// Holds the store behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        Self { kv }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let store = InMemoryStore::new();
        assert!(store.get(StoreKey::Tasks).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_and_remove_clears() {
        let store = InMemoryStore::new();
        store.put(StoreKey::Theme, "light").await.unwrap();
        store.put(StoreKey::Theme, "dark").await.unwrap();
        assert_eq!(
            store.get(StoreKey::Theme).await.unwrap().as_deref(),
            Some("dark")
        );

        store.remove(StoreKey::Theme).await.unwrap();
        store.remove(StoreKey::Theme).await.unwrap();
        assert!(store.get(StoreKey::Theme).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = InMemoryStore::new();
        let other = store.clone();
        store.put(StoreKey::User, "{}").await.unwrap();
        assert!(other.get(StoreKey::User).await.unwrap().is_some());
    }

    #[test]
    fn key_names_are_stable() {
        let names: Vec<&str> = StoreKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, ["subjects", "chapters", "tasks", "user", "theme"]);
    }
}
