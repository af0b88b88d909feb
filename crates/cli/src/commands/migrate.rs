//! Database migration commands.
//!
//! The storefront keeps carts inside tower-sessions records, so the only
//! schema it needs is the session store's own table.
//!
//! # Usage
//!
//! ```bash
//! shopfront migrate sessions
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tower_sessions_sqlx_store::PostgresStore;

use crate::error::CliError;

/// Create the session schema and table if they do not exist.
///
/// # Errors
///
/// Returns `CliError` if no database URL is configured, the connection fails,
/// or the migration query fails.
pub async fn sessions() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let database_url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Session migrations complete!");
    Ok(())
}

fn database_url() -> Result<SecretString, CliError> {
    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}
