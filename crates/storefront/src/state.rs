//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::bag::BagRegistry;
use crate::config::StorefrontConfig;
use crate::db::{CartRepository, WishlistRepository};
use crate::shopify::StorefrontClient;

/// The registry type used by the running server.
pub type Bags = BagRegistry<CartRepository, WishlistRepository>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections, the catalog client and
/// every live visitor's cart and wishlist.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    storefront: StorefrontClient,
    bags: Bags,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let storefront = StorefrontClient::new(&config.shopify);
        let shared = Arc::new(pool.clone());
        let bags = BagRegistry::new(
            CartRepository::new(Arc::clone(&shared)),
            WishlistRepository::new(shared),
            config.bags.registry_capacity,
            config.bags.visitor_idle,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                storefront,
                bags,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Get a reference to the visitor bag registry.
    #[must_use]
    pub fn bags(&self) -> &Bags {
        &self.inner.bags
    }
}
