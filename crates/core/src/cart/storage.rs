//! Durable key-value storage port for carts.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use core::fmt;

use serde::{Deserialize, Serialize};

use super::StorageError;

/// Errors that can occur when parsing a [`StorageKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageKeyError {
    /// The key is empty or whitespace.
    #[error("storage key cannot be empty")]
    Empty,
}

/// Name of the storage slot a cart is persisted under.
///
/// Must be distinct from any other persisted application state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Default slot for the shopper's cart.
    pub const DEFAULT: &'static str = "cart-storage";

    /// Parse a storage key.
    ///
    /// # Errors
    ///
    /// Returns [`StorageKeyError::Empty`] if the key is empty or whitespace.
    pub fn parse(key: &str) -> Result<Self, StorageKeyError> {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(StorageKeyError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StorageKey {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for StorageKey {
    type Err = StorageKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Durable key-value storage a cart is persisted through.
///
/// Values are serialized [`CartSnapshot`](super::CartSnapshot) JSON.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - `load` returns `Ok(None)` when nothing has been stored under the key
/// - `save` replaces any previous value
pub trait CartStorage: Send + Sync {
    /// Read the value stored under `key`.
    fn load(
        &self,
        key: &StorageKey,
    ) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Store `value` under `key`.
    fn save(
        &self,
        key: &StorageKey,
        value: String,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<S: CartStorage> CartStorage for &S {
    fn load(
        &self,
        key: &StorageKey,
    ) -> impl Future<Output = Result<Option<String>, StorageError>> + Send {
        (**self).load(key)
    }

    fn save(
        &self,
        key: &StorageKey,
        value: String,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).save(key, value)
    }
}

/// In-process storage backed by a `HashMap`.
///
/// Clones share the same map, so a test can keep a handle to inspect what a
/// [`CartStore`](super::CartStore) wrote. [`MemoryStorage::set_failing`] makes
/// every call fail with [`StorageError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<StorageKey, String>>>,
    failing: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle failure mode.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful `save` calls, across all clones.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Read a raw value without going through the async port.
    #[must_use]
    pub fn get(&self, key: &StorageKey) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    /// Write a raw value without going through the async port.
    pub fn insert(&self, key: StorageKey, value: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, value.into());
        }
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "memory storage is in failure mode".to_string(),
            ));
        }
        Ok(())
    }
}

impl CartStorage for MemoryStorage {
    async fn load(&self, key: &StorageKey) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn save(&self, key: &StorageKey, value: String) -> Result<(), StorageError> {
        self.check_available()?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        entries.insert(key.clone(), value);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_default() {
        assert_eq!(StorageKey::default().as_str(), "cart-storage");
    }

    #[test]
    fn test_storage_key_rejects_empty() {
        assert_eq!(StorageKey::parse(""), Err(StorageKeyError::Empty));
        assert_eq!(StorageKey::parse("   "), Err(StorageKeyError::Empty));
        assert_eq!(StorageKey::parse(" cart ").unwrap().as_str(), "cart");
    }

    #[tokio::test]
    async fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        let key = StorageKey::default();

        assert_eq!(storage.load(&key).await.unwrap(), None);
        storage.save(&key, "{}".to_string()).await.unwrap();
        assert_eq!(storage.load(&key).await.unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_memory_storage_clones_share_entries() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        let key = StorageKey::default();

        storage.save(&key, "value".to_string()).await.unwrap();
        assert_eq!(handle.get(&key).as_deref(), Some("value"));
        assert_eq!(handle.save_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_storage_failure_mode() {
        let storage = MemoryStorage::new();
        let key = StorageKey::default();
        storage.set_failing(true);

        assert!(matches!(
            storage.load(&key).await,
            Err(StorageError::Unavailable(_))
        ));
        assert!(storage.save(&key, String::new()).await.is_err());
        assert_eq!(storage.save_count(), 0);

        storage.set_failing(false);
        assert!(storage.save(&key, String::new()).await.is_ok());
        assert_eq!(storage.save_count(), 1);
    }
}
