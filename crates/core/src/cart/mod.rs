//! The shopper's cart aggregate.
//!
//! # Layers
//!
//! - [`CartState`] - Line items plus derived `item_count` and `total`. Every
//!   mutation is a synchronous, in-memory state transition that recomputes the
//!   derived fields before returning.
//! - [`CartSnapshot`] - The persisted JSON shape. Loading a snapshot goes
//!   through [`CartState::hydrate`], which never trusts stored totals.
//! - [`CartStorage`] - Durable key-value port the cart is persisted through.
//! - [`CartStore`] - Owns one shopper's state and storage. Applies a transition,
//!   then persists it as a separate step.
//!
//! # Failure model
//!
//! The cart is a best-effort convenience cache, not a system of record.
//! Unknown IDs are no-ops, unreadable snapshots hydrate as an empty cart and
//! failed writes are logged but never surfaced to the caller of a mutation.

mod action;
mod error;
mod item;
mod snapshot;
mod state;
mod storage;
mod store;

pub use action::CartAction;
pub use error::{CartError, StorageError};
pub use item::{LineItem, LineItemError};
pub use snapshot::{CartSnapshot, HydrationReport};
pub use state::CartState;
pub use storage::{CartStorage, MemoryStorage, StorageKey, StorageKeyError};
pub use store::CartStore;
