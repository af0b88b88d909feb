//! Cart aggregate bound to its storage.

use tracing::instrument;

use super::{CartAction, CartError, CartSnapshot, CartState, CartStorage, LineItem, StorageKey};
use crate::LineItemId;

/// One shopper's cart together with the storage it persists to.
///
/// Each session owns exactly one `CartStore` and passes it by reference to
/// whatever needs it. Mutations take `&mut self`, so at most one runs at a
/// time; hosts that share a store across tasks must put it behind a lock.
///
/// Every mutation is two steps: the in-memory transition on [`CartState`],
/// then [`CartStore::persist`]. A failed write is logged and otherwise
/// ignored: the in-memory state stays correct for the rest of the session.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    key: StorageKey,
    state: CartState,
}

impl<S: CartStorage> CartStore<S> {
    /// Open the cart stored under `key`, hydrating it if a value exists.
    ///
    /// Missing, unreadable or corrupt values all produce an empty cart. The
    /// hydrated state is written back immediately so storage always holds a
    /// snapshot whose derived fields agree with its items.
    #[instrument(skip(storage, key), fields(key = %key))]
    pub async fn open(storage: S, key: StorageKey) -> Self {
        let state = match load_state(&storage, &key).await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load cart, starting empty");
                CartState::new()
            }
        };

        let store = Self {
            storage,
            key,
            state,
        };
        store.persist_or_warn().await;
        store
    }

    /// The current cart state.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// The storage slot this cart is persisted under.
    #[must_use]
    pub const fn key(&self) -> &StorageKey {
        &self.key
    }

    /// The underlying storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Consume the store and return its state.
    #[must_use]
    pub fn into_state(self) -> CartState {
        self.state
    }

    /// Add a line item, merging with an existing line of the same ID.
    pub async fn add_item(&mut self, item: LineItem) -> &CartState {
        self.dispatch(CartAction::Add { item }).await
    }

    /// Remove a line item. Unknown IDs are ignored.
    pub async fn remove_item(&mut self, id: LineItemId) -> &CartState {
        self.dispatch(CartAction::Remove { id }).await
    }

    /// Set a line's quantity; below 1 removes the line.
    pub async fn update_item_quantity(&mut self, id: LineItemId, quantity: i64) -> &CartState {
        self.dispatch(CartAction::UpdateQuantity { id, quantity }).await
    }

    /// Remove every line.
    pub async fn clear_cart(&mut self) -> &CartState {
        self.dispatch(CartAction::Clear).await
    }

    /// Apply a mutation, then persist the result.
    #[instrument(skip(self, action), fields(key = %self.key, action = action.name()))]
    pub async fn dispatch(&mut self, action: CartAction) -> &CartState {
        self.transition(action);
        self.persist_or_warn().await;
        &self.state
    }

    /// Apply a mutation and persist it once, reporting a failed write.
    ///
    /// For callers that must know whether the change reached storage. The
    /// in-memory state is updated either way.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if encoding or the storage write fails.
    #[instrument(skip(self, action), fields(key = %self.key, action = action.name()))]
    pub async fn commit(&mut self, action: CartAction) -> Result<&CartState, CartError> {
        self.transition(action);
        self.persist().await?;
        Ok(&self.state)
    }

    fn transition(&mut self, action: CartAction) {
        self.state.apply(action);
        tracing::debug!(
            item_count = self.state.item_count(),
            total = %self.state.total(),
            "Cart updated"
        );
    }

    /// Write the current state to storage.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if encoding or the storage write fails.
    pub async fn persist(&self) -> Result<(), CartError> {
        let value = self.state.snapshot().to_json()?;
        self.storage.save(&self.key, value).await?;
        Ok(())
    }

    async fn persist_or_warn(&self) {
        if let Err(e) = self.persist().await {
            tracing::warn!(key = %self.key, error = %e, "Failed to persist cart");
        }
    }
}

/// Load and hydrate the state stored under `key`.
async fn load_state<S: CartStorage>(
    storage: &S,
    key: &StorageKey,
) -> Result<CartState, CartError> {
    let Some(value) = storage.load(key).await? else {
        return Ok(CartState::new());
    };

    let (state, report) = CartState::hydrate(CartSnapshot::from_json(&value)?);
    if report.non_positive_items > 0 {
        tracing::info!(
            key = %key,
            non_positive_items = report.non_positive_items,
            "Stored cart has lines with a quantity below 1"
        );
    }
    if !report.is_clean() {
        tracing::warn!(
            key = %key,
            merged_duplicates = report.merged_duplicates,
            dropped_items = report.dropped_items,
            item_count_drift = report.item_count_drift,
            total_drift = report.total_drift,
            "Stored cart did not match its invariants; repaired on load"
        );
    }
    Ok(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::cart::MemoryStorage;
    use crate::cart::test_support::item;

    fn stored_snapshot(storage: &MemoryStorage) -> CartSnapshot {
        CartSnapshot::from_json(&storage.get(&StorageKey::default()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_open_empty_storage() {
        let storage = MemoryStorage::new();
        let store = CartStore::open(storage.clone(), StorageKey::default()).await;

        assert!(store.state().is_empty());
        // Opening writes the (empty) hydrated state back.
        assert!(stored_snapshot(&storage).items.is_empty());
    }

    #[tokio::test]
    async fn test_every_mutation_is_persisted() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage.clone(), StorageKey::default()).await;

        store.add_item(item("A", 10, 1)).await;
        assert_eq!(stored_snapshot(&storage).item_count, 1);

        store.add_item(item("A", 10, 2)).await;
        let snapshot = stored_snapshot(&storage);
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.item_count, 3);
        assert_eq!(snapshot.total, Decimal::from(30));

        store.update_item_quantity(LineItemId::new("A"), 5).await;
        assert_eq!(stored_snapshot(&storage).item_count, 5);

        store.remove_item(LineItemId::new("A")).await;
        assert!(stored_snapshot(&storage).items.is_empty());
    }

    #[tokio::test]
    async fn test_reopen_restores_items() {
        let storage = MemoryStorage::new();
        {
            let mut store = CartStore::open(storage.clone(), StorageKey::default()).await;
            store.add_item(item("A", 10, 2)).await;
            store.add_item(item("B", 3, 1)).await;
        }

        let reopened = CartStore::open(storage, StorageKey::default()).await;
        assert_eq!(reopened.state().items().len(), 2);
        assert_eq!(reopened.state().item_count(), 3);
        assert_eq!(reopened.state().total(), Decimal::from(23));
    }

    #[tokio::test]
    async fn test_open_repairs_drifted_totals() {
        let storage = MemoryStorage::new();
        storage.insert(
            StorageKey::default(),
            r#"{"items":[{"id":"A","productId":"p","name":"n","price":10,"image":"i","size":"M","color":"red","quantity":2}],"itemCount":50,"total":1}"#,
        );

        let store = CartStore::open(storage.clone(), StorageKey::default()).await;
        assert_eq!(store.state().item_count(), 2);
        assert_eq!(store.state().total(), Decimal::from(20));

        let rewritten = stored_snapshot(&storage);
        assert_eq!(rewritten.item_count, 2);
        assert_eq!(rewritten.total, Decimal::from(20));
    }

    #[tokio::test]
    async fn test_open_corrupt_value_starts_empty() {
        let storage = MemoryStorage::new();
        storage.insert(StorageKey::default(), "{not json");

        let store = CartStore::open(storage, StorageKey::default()).await;
        assert!(store.state().is_empty());
    }

    #[tokio::test]
    async fn test_open_unavailable_storage_starts_empty() {
        let storage = MemoryStorage::new();
        storage.set_failing(true);

        let store = CartStore::open(storage, StorageKey::default()).await;
        assert!(store.state().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_keeps_in_memory_state() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage.clone(), StorageKey::default()).await;
        store.add_item(item("A", 10, 1)).await;

        storage.set_failing(true);
        let state = store.add_item(item("B", 5, 2)).await;
        assert_eq!(state.items().len(), 2);
        assert_eq!(state.total(), Decimal::from(20));
        assert!(store.persist().await.is_err());

        // The lost write is visible on the next hydration.
        storage.set_failing(false);
        let reopened = CartStore::open(storage, StorageKey::default()).await;
        assert_eq!(reopened.state().items().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_cart() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage.clone(), StorageKey::default()).await;
        store.add_item(item("A", 10, 1)).await;
        store.add_item(item("B", 1, 4)).await;

        let state = store.clear_cart().await;
        assert!(state.is_empty());
        assert_eq!(state.item_count(), 0);
        assert_eq!(state.total(), Decimal::ZERO);
        assert_eq!(stored_snapshot(&storage).item_count, 0);
    }

    #[tokio::test]
    async fn test_reopen_keeps_non_positive_lines() {
        let storage = MemoryStorage::new();
        let before = {
            let mut store = CartStore::open(storage.clone(), StorageKey::default()).await;
            store.add_item(item("A", 10, 2)).await;
            store.add_item(item("A", 10, -2)).await;
            store.add_item(item("B", 3, 1)).await;
            store.into_state()
        };
        assert_eq!(before.items()[0].quantity, 0);

        let reopened = CartStore::open(storage, StorageKey::default()).await;
        assert_eq!(reopened.state().items(), before.items());
        assert_eq!(reopened.state(), &before);
    }

    #[tokio::test]
    async fn test_commit_writes_once() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage.clone(), StorageKey::default()).await;
        assert_eq!(storage.save_count(), 1);

        let state = store
            .commit(CartAction::Add {
                item: item("A", 10, 1),
            })
            .await
            .unwrap();
        assert_eq!(state.item_count(), 1);
        assert_eq!(storage.save_count(), 2);
        assert_eq!(stored_snapshot(&storage).item_count, 1);
    }

    #[tokio::test]
    async fn test_commit_reports_failed_write() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage.clone(), StorageKey::default()).await;
        storage.set_failing(true);

        let result = store
            .commit(CartAction::Add {
                item: item("A", 10, 1),
            })
            .await;
        assert!(matches!(result, Err(CartError::Storage(_))));
        assert_eq!(store.state().item_count(), 1);
        assert_eq!(storage.save_count(), 1);
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let storage = MemoryStorage::new();
        let other = StorageKey::parse("wishlist").unwrap();
        storage.insert(other.clone(), "unrelated");

        let mut store = CartStore::open(&storage, StorageKey::default()).await;
        store.add_item(item("A", 1, 1)).await;

        assert_eq!(storage.get(&other).as_deref(), Some("unrelated"));
    }
}
