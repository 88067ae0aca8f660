//! Product catalog route handlers.
//!
//! A thin passthrough over the Storefront API, used by the frontend to
//! render product pages and build add-to-cart requests.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::shopify::{Product, ProductConnection};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 24;

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Page size, clamped to the API maximum.
    pub first: Option<i64>,
    /// Storefront search query.
    pub query: Option<String>,
}

/// List products.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductConnection>> {
    let products = state
        .storefront()
        .get_products(query.first.unwrap_or(DEFAULT_PAGE_SIZE), query.query)
        .await?;
    Ok(Json(products))
}

/// Product detail by handle.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<Product>> {
    let product = state.storefront().get_product_by_handle(&handle).await?;
    Ok(Json(product))
}
