//! Cart and wishlist state synchronization.
//!
//! # Architecture
//!
//! ```text
//! route handler ──► Bag (in-memory ItemList) ──┬─► LocalStore (JsonSlot ⇄ session)
//!                                              └─► RemoteWriter ──► RemoteStore (Postgres)
//! ```
//!
//! - [`LocalStore`] holds anonymous items on the visitor's device (session)
//! - [`RemoteStore`] holds an account's items
//! - [`Bag`] applies mutations in memory, then persists to whichever store is
//!   authoritative for the current [`Identity`]
//! - [`RemoteWriter`] serializes remote writes per bag
//! - [`BagRegistry`] caches one cart and one wishlist per visitor
//!
//! Signing in merges local items into the account (remote wins on conflicts)
//! and clears the local store. Signing out drops back to local items.

mod facade;
mod local;
mod registry;
mod remote;
mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use facade::{Bag, BagError, Identity};
pub use local::{JsonSlot, LocalStore, StorageCorruption};
pub use registry::{
    BagRegistry, CartBag, IdentityView, Visitor, VisitorBags, VisitorSeed, WishlistBag,
};
pub use remote::{RemoteError, RemoteStore};
pub use writer::{RemoteWriter, SyncNotice};
