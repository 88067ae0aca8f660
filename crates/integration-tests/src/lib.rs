//! Integration tests for the Valiero storefront.
//!
//! The tests drive a running storefront over HTTP, so they are `#[ignore]`d
//! by default.
//!
//! # Running Tests
//!
//! ```bash
//! valiero-cli migrate
//! cargo run -p valiero-storefront &
//! cargo test -p valiero-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_TEST_URL` - Storefront base URL (default `http://localhost:3000`)
//! - `STOREFRONT_TEST_PRODUCT` - Catalog handle of a product with a size option
//! - `STOREFRONT_TEST_SIZE` - A size of that product that is in stock

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the storefront under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A catalog product used to fill carts.
#[derive(Debug, Clone)]
pub struct TestProduct {
    pub handle: String,
    pub size: String,
}

impl TestProduct {
    /// Product from the environment, if configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Some(Self {
            handle: std::env::var("STOREFRONT_TEST_PRODUCT").ok()?,
            size: std::env::var("STOREFRONT_TEST_SIZE").ok()?,
        })
    }
}

/// One visitor: a cookie-carrying client.
pub struct Visitor {
    client: Client,
    base_url: String,
}

impl Visitor {
    /// A fresh visitor with an empty cookie jar.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .cookie_store(true)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url(),
        }
    }

    /// GET a path, returning status and JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not JSON.
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .unwrap_or_else(|e| panic!("GET {path} failed: {e}"));
        read(response).await
    }

    /// POST a JSON body, returning status and JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not JSON.
    pub async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .unwrap_or_else(|e| panic!("POST {path} failed: {e}"));
        read(response).await
    }

    /// Register a throwaway account and sign in.
    ///
    /// Returns the credentials so a second visitor can sign in as well.
    pub async fn register(&self) -> Value {
        let credentials = json!({
            "email": format!("it-{}@valiero.test", Uuid::new_v4()),
            "password": format!("Pw-{}", Uuid::new_v4()),
        });
        let (status, body) = self.post("/auth/register", &credentials).await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        credentials
    }
}

impl Default for Visitor {
    fn default() -> Self {
        Self::new()
    }
}

async fn read(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|e| panic!("failed to read body: {e}"));
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    (status, body)
}
