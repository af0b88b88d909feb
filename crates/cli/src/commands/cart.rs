//! File-backed cart commands.
//!
//! Each command opens the cart under `<dir>/<key>.json`, applies at most one
//! mutation and prints the resulting snapshot as pretty JSON. Unlike the
//! storefront, a failed write of the mutation is reported as an error instead
//! of only being logged.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use shopfront_core::{
    CartAction, CartSnapshot, CartState, CartStore, HydrationReport, LineItem, LineItemError,
    LineItemId, Price, ProductId, StorageKey,
};

use crate::error::CliError;
use crate::storage::FileCartStorage;

/// The cart file a command operates on.
#[derive(Debug, Clone)]
pub struct CartTarget {
    pub dir: PathBuf,
    pub key: StorageKey,
}

/// Arguments for `cart add`.
#[derive(Debug, Clone)]
pub struct AddItem {
    pub product: String,
    pub size: String,
    pub color: String,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub quantity: i64,
}

impl AddItem {
    /// Validate the arguments and build the line item.
    fn into_line_item(self) -> Result<LineItem, CliError> {
        let price = Price::new(self.price)?;
        let product_id = ProductId::new(self.product);

        let item = LineItem {
            id: LineItemId::for_variant(&product_id, &self.size, &self.color),
            product_id,
            name: self.name,
            price,
            image: self.image,
            size: self.size,
            color: self.color,
            quantity: self.quantity,
        };
        item.check_bounds()?;
        Ok(item)
    }
}

async fn open(target: &CartTarget) -> CartStore<FileCartStorage> {
    CartStore::open(FileCartStorage::new(&target.dir), target.key.clone()).await
}

/// Open the cart, apply `action` and write the result once.
async fn commit(target: &CartTarget, action: CartAction) -> Result<(), CliError> {
    let mut store = open(target).await;
    let state = store.commit(action).await?;
    print_snapshot(state)
}

fn print_snapshot(state: &CartState) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(&state.snapshot())?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}

/// Print the stored cart. Opening it writes the hydrated state back.
///
/// # Errors
///
/// Returns `CliError` if the snapshot cannot be encoded.
pub async fn show(target: &CartTarget) -> Result<(), CliError> {
    let store = open(target).await;
    print_snapshot(store.state())
}

/// Add a product variant to the cart.
///
/// # Errors
///
/// Returns `CliError` if the quantity or price is out of bounds, the price
/// is negative or the cart cannot be written.
pub async fn add(target: &CartTarget, item: AddItem) -> Result<(), CliError> {
    let item = item.into_line_item()?;
    tracing::info!(item_id = %item.id, quantity = item.quantity, "Adding item");
    commit(target, CartAction::Add { item }).await
}

/// Set a line's quantity. Below 1 removes the line.
///
/// # Errors
///
/// Returns `CliError` if the quantity is above the maximum or the cart
/// cannot be written.
pub async fn update(target: &CartTarget, id: String, quantity: i64) -> Result<(), CliError> {
    if quantity > LineItem::MAX_QUANTITY {
        return Err(LineItemError::Quantity(quantity).into());
    }
    let id = LineItemId::new(id);
    commit(target, CartAction::UpdateQuantity { id, quantity }).await
}

/// Remove a line. Unknown IDs leave the cart unchanged.
///
/// # Errors
///
/// Returns `CliError` if the cart cannot be written.
pub async fn remove(target: &CartTarget, id: String) -> Result<(), CliError> {
    let id = LineItemId::new(id);
    commit(target, CartAction::Remove { id }).await
}

/// Empty the cart.
///
/// # Errors
///
/// Returns `CliError` if the cart cannot be written.
pub async fn clear(target: &CartTarget) -> Result<(), CliError> {
    commit(target, CartAction::Clear).await
}

/// Hydrate a snapshot file without writing anything and report what was
/// repaired.
///
/// # Errors
///
/// Returns `CliError` if the file cannot be read or is not a snapshot.
pub async fn inspect(file: &Path) -> Result<(), CliError> {
    let value = tokio::fs::read_to_string(file).await?;
    let (state, report) = check_snapshot(&value)?;

    #[allow(clippy::print_stdout)]
    {
        if report.is_clean() {
            println!("{}: clean", file.display());
        } else {
            println!("{}: repaired on load", file.display());
            println!("  merged duplicate lines: {}", report.merged_duplicates);
            println!("  dropped lines:          {}", report.dropped_items);
            println!("  item count drifted:     {}", report.item_count_drift);
            println!("  total drifted:          {}", report.total_drift);
        }
        if report.non_positive_items > 0 {
            println!("  lines below quantity 1: {}", report.non_positive_items);
        }
        println!(
            "  {} lines, {} units, total {}",
            state.items().len(),
            state.item_count(),
            state.total()
        );
    }
    Ok(())
}

fn check_snapshot(value: &str) -> Result<(CartState, HydrationReport), CliError> {
    Ok(CartState::hydrate(CartSnapshot::from_json(value)?))
}
