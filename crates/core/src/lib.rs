//! Shopfront Core - Cart aggregate and shared types.
//!
//! This crate provides the pieces shared by every Shopfront component:
//! - `storefront` - JSON cart API backed by the shopper's session
//! - `cli` - Operator tools for migrations and file-backed carts
//!
//! # Architecture
//!
//! The core crate contains types, the cart aggregate, and the storage trait
//! it persists through. It has no HTTP, no database access and no runtime,
//! so it can be embedded anywhere a cart is needed.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices
//! - [`cart`] - The cart aggregate, its persisted snapshot and storage port

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{
    CartAction, CartError, CartSnapshot, CartState, CartStorage, CartStore, HydrationReport,
    LineItem, LineItemError, MemoryStorage, StorageError, StorageKey, StorageKeyError,
};
pub use types::*;
