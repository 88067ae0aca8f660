//! Business logic services for storefront.
//!
//! - `auth` - Email/password accounts that own signed-in carts and wishlists

pub mod auth;
