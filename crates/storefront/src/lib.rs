//! Valiero Storefront library.
//!
//! Cart and wishlist state for the Valiero apparel storefront, kept in sync
//! between a visitor's session and their account.
//!
//! # Modules
//!
//! - [`bag`] - Cart/wishlist facade, local and remote stores, sign-in merge
//! - [`db`] - `PostgreSQL` repositories (accounts, cart rows, wishlist rows)
//! - [`shopify`] - Storefront API client for the product catalog
//! - [`routes`] - JSON API handlers
//! - [`middleware`] - Sessions, visitor extraction, rate limiting, request ids

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bag;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
