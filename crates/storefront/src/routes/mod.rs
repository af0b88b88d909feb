//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (session database)
//!
//! # Cart (JSON)
//! GET  /cart                   - Current cart snapshot
//! POST /cart/add               - Add a line item (merges by item ID)
//! POST /cart/update            - Set quantity; below 1 removes the item
//! POST /cart/remove            - Remove an item
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Item count badge
//! ```
//!
//! Every cart response except `/cart/count` is the persisted snapshot shape:
//! `{ "items": [...], "itemCount": n, "total": n }`.

pub mod cart;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/cart", cart_routes())
}
