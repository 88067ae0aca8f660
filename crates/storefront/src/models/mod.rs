//! Domain models for storefront.
//!
//! - [`session`] - Types stored in the visitor's session
//! - [`user`] - Storefront accounts

pub mod session;
pub mod user;

pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
