//! Cart persistence errors.

use thiserror::Error;

/// Errors reported by a [`CartStorage`](super::CartStorage) backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backend cannot be reached or refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The backend failed while reading or writing.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors that can occur while loading or persisting a cart.
///
/// [`CartStore::dispatch`](super::CartStore::dispatch) logs these instead of
/// returning them. [`CartStore::commit`](super::CartStore::commit) and the
/// explicit persistence calls return them.
#[derive(Debug, Error)]
pub enum CartError {
    /// Storage load or save failed.
    #[error("cart storage error: {0}")]
    Storage(#[from] StorageError),

    /// The persisted snapshot could not be encoded or decoded.
    #[error("cart snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
