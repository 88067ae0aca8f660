//! Valiero Core - Shared domain types.
//!
//! This crate provides the types used across the Valiero workspace:
//! - `storefront` - Public-facing storefront service
//! - `cli` - Command-line tools for migrations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything that decides *what* a cart or wishlist
//! contains lives here; *where* it is persisted is the storefront's concern.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices and emails
//! - [`bag`] - Cart line items, wishlist entries, list operations and the
//!   sign-in reconciliation merge

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bag;
pub mod types;

pub use bag::{
    Added, BagItem, CartSummary, ItemList, LineItem, LineKey, MAX_QUANTITY, Merge, ShippingPolicy,
    ValidationError, WishlistEntry, checked_quantity, reconcile,
};
pub use types::*;
