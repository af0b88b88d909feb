//! Cart route handlers.
//!
//! Every handler takes a [`SessionCart`], which has already hydrated the
//! shopper's cart from their session under the per-session lock. Each
//! mutation persists itself back to the session before the handler returns,
//! and responses carry the full snapshot so the caller never has to
//! recompute totals.

use axum::Json;
use serde::{Deserialize, Serialize};
use shopfront_core::{CartSnapshot, LineItem, LineItemError, LineItemId};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::SessionCart;

/// Update quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub id: LineItemId,
    pub quantity: i64,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub id: LineItemId,
}

/// Cart count badge response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartCount {
    pub item_count: i64,
}

/// Current cart.
#[instrument(skip(cart))]
pub async fn show(cart: SessionCart) -> Json<CartSnapshot> {
    Json(cart.store.state().snapshot())
}

/// Add an item to the cart.
///
/// The cart itself accepts any quantity; this endpoint is where shopper input
/// is checked, so a quantity outside `1..=LineItem::MAX_QUANTITY` or a price
/// above `LineItem::MAX_UNIT_PRICE` is rejected here.
#[instrument(skip(cart, item), fields(item_id = %item.id, quantity = item.quantity))]
pub async fn add(
    mut cart: SessionCart,
    Json(item): Json<LineItem>,
) -> Result<Json<CartSnapshot>> {
    item
        .check_bounds()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    add_breadcrumb("cart", "Added item", Some(&[("item_id", item.id.as_str())]));
    let state = cart.store.add_item(item).await;
    Ok(Json(state.snapshot()))
}

/// Set an item's quantity. A quantity below 1 removes the item; one above
/// `LineItem::MAX_QUANTITY` is rejected.
#[instrument(skip(cart))]
pub async fn update(
    mut cart: SessionCart,
    Json(form): Json<UpdateCartRequest>,
) -> Result<Json<CartSnapshot>> {
    if form.quantity > LineItem::MAX_QUANTITY {
        return Err(AppError::BadRequest(
            LineItemError::Quantity(form.quantity).to_string(),
        ));
    }
    let state = cart.store.update_item_quantity(form.id, form.quantity).await;
    Ok(Json(state.snapshot()))
}

/// Remove an item from the cart.
#[instrument(skip(cart))]
pub async fn remove(
    mut cart: SessionCart,
    Json(form): Json<RemoveFromCartRequest>,
) -> Json<CartSnapshot> {
    let state = cart.store.remove_item(form.id).await;
    Json(state.snapshot())
}

/// Empty the cart (end of checkout or explicit reset).
#[instrument(skip(cart))]
pub async fn clear(mut cart: SessionCart) -> Json<CartSnapshot> {
    add_breadcrumb("cart", "Cleared cart", None);
    let state = cart.store.clear_cart().await;
    Json(state.snapshot())
}

/// Cart count badge.
#[instrument(skip(cart))]
pub async fn count(cart: SessionCart) -> Json<CartCount> {
    Json(CartCount {
        item_count: cart.store.state().item_count(),
    })
}
