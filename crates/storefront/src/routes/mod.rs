//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET  /api/products                - Product listing (?first=&query=)
//! GET  /api/products/{handle}       - Product detail
//!
//! # Cart
//! GET  /api/cart                    - Items, totals, loading flag, notices
//! POST /api/cart/add                - {handle, size?, color?, quantity?}
//! POST /api/cart/update             - {id, size, color, quantity}; < 1 removes
//! POST /api/cart/remove             - {id, size, color}
//! POST /api/cart/clear
//!
//! # Wishlist
//! GET  /api/wishlist
//! POST /api/wishlist/add            - {handle}
//! POST /api/wishlist/toggle         - {handle}
//! POST /api/wishlist/remove         - {id}
//!
//! # Sync
//! GET  /api/sync/status             - Loading flags (does not wait on bags)
//! POST /api/sync/retry              - Retry a failed sign-in merge
//!
//! # Checkout
//! POST /api/checkout                - Not implemented (501)
//!
//! # Auth
//! POST /auth/register               - {email, password}
//! POST /auth/login                  - {email, password}
//! POST /auth/logout
//! ```

pub mod auth;
pub mod cart;
pub mod products;
pub mod sync;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::error::{AppError, Result};
use crate::middleware::{auth_rate_limiter, bag_rate_limiter};
use crate::state::AppState;

/// Reject a blank catalog handle before calling the Storefront API.
fn require_handle(handle: &str) -> Result<&str> {
    let handle = handle.trim();
    if handle.is_empty() {
        return Err(AppError::BadRequest("Product handle is required".to_string()));
    }
    Ok(handle)
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{handle}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/add", post(wishlist::add))
        .route("/toggle", post(wishlist::toggle))
        .route("/remove", post(wishlist::remove))
}

/// Create the sync routes router.
pub fn sync_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(sync::status))
        .route("/retry", post(sync::retry))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let bags = Router::new()
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/sync", sync_routes())
        .route("/checkout", post(cart::checkout))
        .layer(bag_rate_limiter());

    let api = Router::new()
        .nest("/products", product_routes())
        .merge(bags);

    Router::new()
        .nest("/api", api)
        .nest("/auth", auth_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};
    use url::Url;

    use super::*;
    use crate::config::{BagConfig, ShopifyStorefrontConfig, StorefrontConfig};

    /// Router over an in-memory session store. The pool is lazy and never
    /// connects as long as every visitor stays anonymous.
    fn app() -> Router {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/valiero_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: Url::parse("http://localhost:3000").unwrap(),
            session_secret: SecretString::from("k".repeat(32)),
            shopify: ShopifyStorefrontConfig {
                store: "valiero-test.myshopify.com".to_string(),
                api_version: "2026-01".to_string(),
                storefront_private_token: SecretString::from("shpat_test_token"),
            },
            bags: BagConfig::default(),
            sentry_dsn: None,
            sentry_environment: "test".to_string(),
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/valiero_test")
            .unwrap();

        routes()
            .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
            .with_state(AppState::new(config, pool))
    }

    fn request(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.9");
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_new_visitor_gets_empty_cart() {
        let response = app().oneshot(request("GET", "/api/cart", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::SET_COOKIE));

        let body = json(response).await;
        assert_eq!(body["items"], serde_json::json!([]));
        assert_eq!(body["total_items"], 0);
        assert_eq!(body["subtotal"], "₹0.00");
        assert_eq!(body["shipping"], "₹0.00");
        assert_eq!(body["currency"], "INR");
        assert_eq!(body["pending_sync"], false);
    }

    #[tokio::test]
    async fn test_updating_unknown_line_is_a_no_op() {
        let response = app()
            .oneshot(request(
                "POST",
                "/api/cart/update",
                Some(r#"{"id":"gid://shopify/Product/1","size":"M","color":"","quantity":0}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["total_items"], 0);
    }

    #[tokio::test]
    async fn test_sync_status_for_anonymous_visitor() {
        let response = app()
            .oneshot(request("GET", "/api/sync/status", None))
            .await
            .unwrap();
        let body = json(response).await;
        assert_eq!(body["cart_loading"], false);
        assert_eq!(body["wishlist_loading"], false);
    }

    #[tokio::test]
    async fn test_retry_requires_sign_in() {
        let response = app()
            .oneshot(request("POST", "/api/sync/retry", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_blank_handle_is_rejected() {
        let response = app()
            .oneshot(request("POST", "/api/cart/add", Some(r#"{"handle":"  "}"#)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"], "Bad request: Product handle is required");
    }

    #[tokio::test]
    async fn test_checkout_is_not_implemented() {
        let response = app()
            .oneshot(request("POST", "/api/checkout", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }
}
