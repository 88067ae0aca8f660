//! Session-related types.
//!
//! Types stored in the session for authentication and anonymous bag state.

use serde::{Deserialize, Serialize};

use valiero_core::{Email, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the visitor id that addresses the in-memory bags.
    pub const VISITOR_ID: &str = "visitor_id";

    /// Key for the anonymous cart (raw JSON array of line items).
    pub const CART: &str = "valiero-cart";

    /// Key for the anonymous wishlist (raw JSON array of entries).
    pub const WISHLIST: &str = "valiero-wishlist";
}
