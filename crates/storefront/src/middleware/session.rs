//! Session middleware configuration.
//!
//! The session is the cart's durable key-value store, so its lifetime is the
//! cart's lifetime: an idle session expires after the configured inactivity
//! window and takes the cart with it.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "shopfront_session";

/// Create the session layer with the `PostgreSQL` store.
///
/// The `tower_sessions` table must exist; create it with
/// `shopfront migrate sessions`.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    session_layer_with_store(PostgresStore::new(pool.clone()), config)
}

/// Create the session layer over any store.
///
/// Tests use this with `tower_sessions::MemoryStore`.
pub fn session_layer_with_store<S: SessionStore + Clone>(
    store: S,
    config: &StorefrontConfig,
) -> SessionManagerLayer<S> {
    let expiry = i64::try_from(config.cart.session_expiry.as_secs()).unwrap_or(i64::MAX);

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(expiry),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
