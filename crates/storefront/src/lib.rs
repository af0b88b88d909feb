//! Shopfront Storefront library.
//!
//! This crate provides the cart API as a library, allowing it to be tested
//! and reused. The binary in `main.rs` wires it to `PostgreSQL` sessions,
//! Sentry and a TCP listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod storage;

use axum::{Router, extract::Request};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use state::AppState;

/// Build the storefront application router.
///
/// The session layer is passed in so the binary can use the `PostgreSQL`
/// store while tests use an in-memory one.
pub fn app<S: SessionStore + Clone>(
    state: AppState,
    session_layer: SessionManagerLayer<S>,
) -> Router {
    routes::routes()
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(session_layer)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::cart_lock_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}
