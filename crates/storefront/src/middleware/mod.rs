//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Cart lock (serialize requests sharing a session cookie)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Cart handlers take the [`SessionCart`] extractor, which opens the cart
//! from the session while the cart lock is held.

pub mod cart;
pub mod request_id;
pub mod session;

pub use cart::{CartLocks, SessionCart, cart_lock_middleware};
pub use request_id::request_id_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer, session_layer_with_store};
