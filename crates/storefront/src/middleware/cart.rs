//! Per-session cart lock and cart extractor.
//!
//! Concurrent requests from the same shopper (two quick "add to cart" clicks)
//! run on different tasks. Each one loads the cart from the session, mutates
//! it and writes it back, so without coordination the second write would
//! drop the first. [`cart_lock_middleware`] sits outside the session layer
//! and holds one async mutex per session ID until the session layer has
//! finished its own write of the response.
//!
//! A request without a session cookie cannot share a session with any other
//! request, so no lock is taken.
//!
//! Locks live in a cache with no size bound, only a time-to-idle. A request
//! keeps its session's entry fresh for as long as it holds the lock, so an
//! entry is only evicted once nobody has used it for the idle period. The
//! cache therefore holds one entry per session seen in that window.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use moka::future::Cache;
use shopfront_core::CartStore;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tower_sessions::Session;
use tower_sessions::session::Id;

use super::session::SESSION_COOKIE_NAME;
use crate::error::AppError;
use crate::state::AppState;
use crate::storage::SessionCartStorage;

/// Registry of per-session cart locks.
///
/// Entries are evicted after sitting idle for the configured duration. There
/// is no capacity bound: a held lock must never be evicted, or a second
/// request for the same session would create a fresh one.
#[derive(Clone)]
pub struct CartLocks {
    locks: Cache<Id, Arc<Mutex<()>>>,
    keepalive: Duration,
}

impl CartLocks {
    /// Create a registry whose idle locks expire after `idle`.
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        Self {
            locks: Cache::builder().time_to_idle(idle).build(),
            keepalive: (idle / 2).max(Duration::from_millis(1)),
        }
    }

    /// Acquire the lock for a session, waiting for any holder to finish.
    ///
    /// The entry is only refreshed when acquired; use [`CartLocks::run_locked`]
    /// for work that may outlast the idle period.
    pub async fn acquire(&self, id: Id) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .get_with(id, async { Arc::new(Mutex::new(())) })
            .await;
        lock.lock_owned().await
    }

    /// Run `work` while holding the session's lock.
    ///
    /// The cache entry is touched every half idle period until `work`
    /// finishes, so it cannot expire underneath the holder.
    pub async fn run_locked<F: Future>(&self, id: Id, work: F) -> F::Output {
        let _guard = self.acquire(id).await;
        let mut work = std::pin::pin!(work);
        let mut keepalive = tokio::time::interval(self.keepalive);
        loop {
            tokio::select! {
                output = &mut work => return output,
                _ = keepalive.tick() => {
                    self.locks.get(&id).await;
                }
            }
        }
    }
}

/// Session ID carried by the request's session cookie, if any.
fn session_id(headers: &HeaderMap) -> Option<Id> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .and_then(|(_, value)| Id::from_str(value).ok())
}

/// Middleware that serializes requests sharing a session.
///
/// Must be layered outside the session layer so the lock covers the
/// session write that happens after the handler returns.
pub async fn cart_lock_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    match session_id(request.headers()) {
        Some(id) => state.cart_locks().run_locked(id, next.run(request)).await,
        None => next.run(request).await,
    }
}

/// The current shopper's cart, opened from their session.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(mut cart: SessionCart) -> impl IntoResponse {
///     cart.store.clear_cart().await;
///     Json(cart.store.state().snapshot())
/// }
/// ```
pub struct SessionCart {
    /// The hydrated cart bound to the session.
    pub store: CartStore<SessionCartStorage>,
}

impl FromRequestParts<AppState> for SessionCart {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Session("session layer is not installed".to_string()))?;

        let store = CartStore::open(
            SessionCartStorage::new(session),
            state.config().cart.storage_key.clone(),
        )
        .await;

        Ok(Self { store })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[tokio::test]
    async fn test_same_session_is_serialized() {
        let locks = CartLocks::new(Duration::from_secs(60));
        let id = Id::default();

        let guard = locks.acquire(id).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                drop(locks.acquire(id).await);
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_sessions_do_not_block() {
        let locks = CartLocks::new(Duration::from_secs(60));

        let _held = locks.acquire(Id::default()).await;
        let other =
            tokio::time::timeout(Duration::from_millis(100), locks.acquire(Id::default())).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_held_lock_survives_many_sessions() {
        let locks = CartLocks::new(Duration::from_secs(60));
        let id = Id::default();
        let _held = locks.acquire(id).await;

        for _ in 0..2_000 {
            drop(locks.acquire(Id::default()).await);
        }
        locks.locks.run_pending_tasks().await;

        let again = tokio::time::timeout(Duration::from_millis(50), locks.acquire(id)).await;
        assert!(again.is_err());
    }

    #[tokio::test]
    async fn test_held_lock_outlives_idle_period() {
        let locks = CartLocks::new(Duration::from_millis(40));
        let id = Id::default();

        let holder = {
            let locks = locks.clone();
            tokio::spawn(async move {
                locks
                    .run_locked(id, tokio::time::sleep(Duration::from_millis(300)))
                    .await;
            })
        };
        tokio::time::sleep(Duration::from_millis(150)).await;
        locks.locks.run_pending_tasks().await;

        let again = tokio::time::timeout(Duration::from_millis(50), locks.acquire(id)).await;
        assert!(again.is_err());

        holder.await.unwrap();
        let after = tokio::time::timeout(Duration::from_millis(50), locks.acquire(id)).await;
        assert!(after.is_ok());
    }

    #[test]
    fn test_session_id_from_cookie() {
        let id = Id::default();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE_NAME}={id}")).unwrap(),
        );

        assert_eq!(session_id(&headers), Some(id));
    }

    #[test]
    fn test_session_id_absent_or_malformed() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id(&headers), None);

        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE_NAME}=!!not-an-id!!")).unwrap(),
        );
        assert_eq!(session_id(&headers), None);
    }
}
