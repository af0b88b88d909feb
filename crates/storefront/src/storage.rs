//! Session-backed cart storage.
//!
//! The shopper's server-side session plays the role browser local storage
//! plays for a client-side cart: one durable key-value slot per shopper,
//! addressed by the session cookie.

use shopfront_core::{CartStorage, StorageError, StorageKey};
use tower_sessions::Session;

/// [`CartStorage`] over a `tower-sessions` [`Session`].
///
/// Values are stored as JSON strings under the configured cart key. `save`
/// flushes the session to its store immediately instead of waiting for the
/// end of the request, so the write happens while the caller still holds the
/// per-session cart lock.
#[derive(Debug, Clone)]
pub struct SessionCartStorage {
    session: Session,
}

impl SessionCartStorage {
    /// Wrap a request's session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// The wrapped session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }
}

impl CartStorage for SessionCartStorage {
    async fn load(&self, key: &StorageKey) -> Result<Option<String>, StorageError> {
        self.session
            .get::<String>(key.as_str())
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))
    }

    async fn save(&self, key: &StorageKey, value: String) -> Result<(), StorageError> {
        self.session
            .insert(key.as_str(), value)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        self.session
            .save()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}
