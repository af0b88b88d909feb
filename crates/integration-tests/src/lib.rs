//! Integration tests for Shopfront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! No database or running server is needed: the storefront router is driven
//! in-process with an in-memory session store.
//!
//! # Test Categories
//!
//! - `cart_aggregate` - Cart behavior through the public `shopfront-core` API
//! - `storefront_cart` - Cart HTTP routes, sessions and cookies

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use shopfront_core::{LineItem, LineItemId, Price, ProductId, StorageKey};
use shopfront_storefront::{
    config::{CartConfig, StorefrontConfig},
    middleware::{SESSION_COOKIE_NAME, session_layer_with_store},
    state::AppState,
};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

/// Configuration for an in-process storefront.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/shopfront_test"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        cart: CartConfig {
            storage_key: StorageKey::default(),
            session_expiry: Duration::from_secs(60 * 60),
            lock_idle: Duration::from_secs(60),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A shopper's line item with a variant-derived ID.
///
/// # Panics
///
/// Panics if `cents` is negative.
#[must_use]
pub fn line_item(product: &str, size: &str, cents: i64, quantity: i64) -> LineItem {
    let product_id = ProductId::new(product);
    #[allow(clippy::unwrap_used)]
    let price = Price::from_cents(cents).unwrap();
    LineItem {
        id: LineItemId::for_variant(&product_id, size, "black"),
        product_id,
        name: format!("{product} ({size})"),
        price,
        image: format!("/images/{product}.jpg"),
        size: size.to_string(),
        color: "black".to_string(),
        quantity,
    }
}

/// Decimal from cents, for comparing totals.
#[must_use]
pub fn cents(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}

/// An in-process storefront plus the session cookie of one shopper.
///
/// The database pool is lazy and never connected: cart routes only touch
/// the session store.
pub struct TestShopper {
    router: Router,
    cookie: Option<String>,
}

impl Default for TestShopper {
    fn default() -> Self {
        Self::new()
    }
}

/// Response status and body of one request.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Decode the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not valid JSON for `T`.
    #[must_use]
    pub fn json<T: DeserializeOwned>(&self) -> T {
        #[allow(clippy::unwrap_used)]
        serde_json::from_slice(&self.body).unwrap()
    }
}

impl TestShopper {
    /// Start a storefront with a fresh in-memory session store.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if the lazy pool cannot be built.
    #[must_use]
    pub fn new() -> Self {
        let config = test_config();
        #[allow(clippy::unwrap_used)]
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/shopfront_test")
            .unwrap();
        let session_layer = session_layer_with_store(MemoryStore::default(), &config);
        let router = shopfront_storefront::app(AppState::new(config, pool), session_layer);

        Self {
            router,
            cookie: None,
        }
    }

    /// Another shopper on the same storefront, without a session.
    #[must_use]
    pub fn stranger(&self) -> Self {
        Self {
            router: self.router.clone(),
            cookie: None,
        }
    }

    /// A second client sharing this shopper's session cookie.
    #[must_use]
    pub fn same_session(&self) -> Self {
        Self {
            router: self.router.clone(),
            cookie: self.cookie.clone(),
        }
    }

    /// Send a request, carrying and updating this shopper's session cookie.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    #[allow(clippy::unwrap_used)]
    pub async fn send(
        &mut self,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(cookie) = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE_NAME}=")))
        {
            self.cookie = Some(cookie.to_string());
        }

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        TestResponse { status, body }
    }

    /// `GET` a path.
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    /// `POST` a JSON body.
    pub async fn post(&mut self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Whether the storefront has issued this shopper a session cookie.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.cookie.is_some()
    }
}
