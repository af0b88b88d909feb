//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::middleware::CartLocks;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool, configuration and cart locks.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    cart_locks: CartLocks,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool backing the session store
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let cart_locks = CartLocks::new(config.cart.lock_idle);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                cart_locks,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the per-session cart lock registry.
    #[must_use]
    pub fn cart_locks(&self) -> &CartLocks {
        &self.inner.cart_locks
    }
}
