//! Cart and wishlist domain logic.
//!
//! A *bag* is either a cart (rows keyed by product, size and color, with a
//! quantity) or a wishlist (rows keyed by product only). Both share the same
//! list semantics through the [`BagItem`] trait:
//!
//! - at most one row per natural key
//! - adding an existing key folds into the row (cart sums quantities,
//!   wishlist ignores the re-add)
//! - removing an absent key is a no-op
//!
//! [`reconcile`] implements the sign-in merge: remote rows win, local rows
//! with new keys are adopted.

mod item;
mod list;
mod reconcile;
mod shipping;

pub use item::{BagItem, LineItem, LineKey, MAX_QUANTITY, ValidationError, WishlistEntry, checked_quantity};
pub use list::{Added, ItemList};
pub use reconcile::{Merge, reconcile};
pub use shipping::{CartSummary, ShippingPolicy};
