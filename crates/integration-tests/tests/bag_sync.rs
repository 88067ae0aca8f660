//! Cart and wishlist sync against a running storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`valiero-cli migrate`)
//! - The storefront running (`cargo run -p valiero-storefront`)
//! - `STOREFRONT_TEST_PRODUCT` / `STOREFRONT_TEST_SIZE` naming an in-stock variant
//!
//! Run with: `cargo test -p valiero-integration-tests -- --ignored`

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Value, json};
use valiero_integration_tests::{TestProduct, Visitor};

fn product() -> TestProduct {
    TestProduct::from_env().unwrap_or_else(|| {
        panic!("set STOREFRONT_TEST_PRODUCT and STOREFRONT_TEST_SIZE to run bag tests")
    })
}

fn add_body(product: &TestProduct, quantity: u32) -> Value {
    json!({ "handle": product.handle, "size": product.size, "quantity": quantity })
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn health_check() {
    let visitor = Visitor::new();
    let (status, _) = visitor.get("/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn anonymous_cart_accumulates_quantity() {
    let product = product();
    let visitor = Visitor::new();

    visitor.post("/api/cart/add", &add_body(&product, 1)).await;
    let (status, cart) = visitor.post("/api/cart/add", &add_body(&product, 2)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["total_items"], 3);
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn missing_size_is_rejected() {
    let product = product();
    let visitor = Visitor::new();

    let (status, body) = visitor
        .post("/api/cart/add", &json!({ "handle": product.handle }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please select a size");
    let (_, cart) = visitor.get("/api/cart").await;
    assert_eq!(cart["total_items"], 0);
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn update_to_zero_removes_line() {
    let product = product();
    let visitor = Visitor::new();

    let (_, cart) = visitor.post("/api/cart/add", &add_body(&product, 1)).await;
    let line = &cart["items"][0];
    let (_, cart) = visitor
        .post(
            "/api/cart/update",
            &json!({ "id": line["id"], "size": line["size"], "color": line["color"], "quantity": 0 }),
        )
        .await;

    assert_eq!(cart["items"], json!([]));
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn sign_in_merges_device_cart_into_account() {
    let product = product();

    // The account already holds the line with quantity 3.
    let first_device = Visitor::new();
    let credentials = first_device.register().await;
    first_device
        .post("/api/cart/add", &add_body(&product, 3))
        .await;
    // Account writes are queued; give the first device's write time to land.
    tokio::time::sleep(Duration::from_millis(250)).await;

    // A second device adds the same line anonymously, then signs in.
    let second_device = Visitor::new();
    second_device
        .post("/api/cart/add", &add_body(&product, 1))
        .await;
    let (status, session) = second_device.post("/auth/login", &credentials).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["cart"]["items"].as_array().map(Vec::len), Some(1));
    // Account rows win over device rows with the same key.
    assert_eq!(session["cart"]["total_items"], 3);
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn sign_out_returns_to_device_items() {
    let product = product();
    let visitor = Visitor::new();
    visitor.register().await;
    visitor.post("/api/cart/add", &add_body(&product, 1)).await;

    let (status, session) = visitor.post("/auth/logout", &json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["user"], Value::Null);
    // Device items were moved into the account on sign-in.
    assert_eq!(session["cart"]["items"], json!([]));
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn wishlist_toggle_round_trip() {
    let product = product();
    let visitor = Visitor::new();
    let body = json!({ "handle": product.handle });

    let (_, saved) = visitor.post("/api/wishlist/toggle", &body).await;
    assert_eq!(saved["saved"], true);
    assert_eq!(saved["wishlist"]["count"], 1);

    let (_, unsaved) = visitor.post("/api/wishlist/toggle", &body).await;
    assert_eq!(unsaved["saved"], false);
    assert_eq!(unsaved["wishlist"]["count"], 0);
}
