//! CLI error type.

use shopfront_core::{CartError, LineItemError, PriceError};
use thiserror::Error;

/// Errors that can end a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection or migration error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Reading a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot file is not a valid cart.
    #[error("Invalid cart snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// The cart could not be written back.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// A price argument was rejected.
    #[error("Invalid price: {0}")]
    Price(#[from] PriceError),

    /// A quantity or price argument is out of bounds.
    #[error("Invalid item: {0}")]
    InvalidItem(#[from] LineItemError),
}
