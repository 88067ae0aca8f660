//! Cart route handlers.
//!
//! Lines are built from the live catalog (so prices and variant names come
//! from Shopify, never from the request) and applied to the visitor's cart.
//! Every response carries the full cart plus any sync notices raised since
//! the previous response.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use valiero_core::{CartSummary, CurrencyCode, LineItem, LineKey, Price};

use crate::bag::{CartBag, RemoteStore, SyncNotice};
use crate::config::BagConfig;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::VisitorContext;
use crate::shopify::payload;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddRequest {
    /// Product handle in the catalog.
    pub handle: String,
    pub size: Option<String>,
    pub color: Option<String>,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

/// Line address used by update and remove.
#[derive(Debug, Deserialize)]
pub struct LineRequest {
    pub id: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
}

impl LineRequest {
    fn key(self) -> LineKey {
        LineKey::new(self.id, self.size, self.color)
    }
}

/// Quantity update request. Anything below 1 removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(flatten)]
    pub line: LineRequest,
    pub quantity: i64,
}

// =============================================================================
// Response Types
// =============================================================================

/// Cart state returned by every cart endpoint.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<LineItem>,
    pub total_items: u64,
    pub total_price: Decimal,
    pub currency: CurrencyCode,
    /// Subtotal, shipping and total as numbers.
    pub summary: CartSummary,
    /// `total_price` formatted for display.
    pub subtotal: String,
    /// Shipping formatted for display.
    pub shipping: String,
    /// Remaining spend for free shipping, formatted for display.
    pub amount_to_free_shipping: String,
    /// Order total (subtotal plus shipping) formatted for display.
    pub total: String,
    /// A remote fetch is in flight.
    pub loading: bool,
    /// A sign-in merge failed; items are kept on this device until retried.
    pub pending_sync: bool,
    pub notices: Vec<SyncNotice>,
}

impl CartView {
    /// Snapshot the cart priced under `pricing`, draining its notices.
    pub fn drain<R: RemoteStore<LineItem>>(cart: &mut CartBag<R>, pricing: &BagConfig) -> Self {
        let summary = cart.summary(&pricing.shipping);
        let display = |amount| Price::new(amount, pricing.currency).display();
        Self {
            items: cart.items().to_vec(),
            total_items: cart.total_items(),
            total_price: summary.subtotal,
            currency: pricing.currency,
            summary,
            subtotal: display(summary.subtotal),
            shipping: display(summary.shipping),
            amount_to_free_shipping: display(summary.amount_to_free_shipping),
            total: display(summary.total),
            loading: cart.is_loading(),
            pending_sync: cart.is_pending(),
            notices: cart.take_notices(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Current cart.
#[instrument(skip_all, fields(visitor = %visitor.id()))]
pub async fn show(
    State(state): State<AppState>,
    visitor: VisitorContext,
) -> Result<Json<CartView>> {
    let mut bags = visitor.lock().await;
    visitor.persist(&mut bags).await?;
    Ok(Json(CartView::drain(&mut bags.cart, &state.config().bags)))
}

/// Add a product variant to the cart.
///
/// Adding an existing line increases its quantity.
#[instrument(skip(state, visitor), fields(visitor = %visitor.id()))]
pub async fn add(
    State(state): State<AppState>,
    visitor: VisitorContext,
    Json(request): Json<AddRequest>,
) -> Result<Json<CartView>> {
    let product = state
        .storefront()
        .get_product_by_handle(super::require_handle(&request.handle)?)
        .await?;
    let line = payload::line_item(
        &product,
        request.size.as_deref(),
        request.color.as_deref(),
        request.quantity,
    )?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[
            ("product_id", line.id.as_str()),
            ("size", &line.size),
            ("color", &line.color),
        ]),
    );

    let mut bags = visitor.lock().await;
    bags.cart.add_item(line)?;
    visitor.persist(&mut bags).await?;
    Ok(Json(CartView::drain(&mut bags.cart, &state.config().bags)))
}

/// Set a line's quantity.
#[instrument(skip(state, visitor), fields(visitor = %visitor.id()))]
pub async fn update(
    State(state): State<AppState>,
    visitor: VisitorContext,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<CartView>> {
    let quantity = request.quantity;
    let key = request.line.key();

    let mut bags = visitor.lock().await;
    bags.cart.update_quantity(&key, quantity)?;
    visitor.persist(&mut bags).await?;
    Ok(Json(CartView::drain(&mut bags.cart, &state.config().bags)))
}

/// Remove a line. Unknown lines are ignored.
#[instrument(skip(state, visitor), fields(visitor = %visitor.id()))]
pub async fn remove(
    State(state): State<AppState>,
    visitor: VisitorContext,
    Json(request): Json<LineRequest>,
) -> Result<Json<CartView>> {
    let key = request.key();

    let mut bags = visitor.lock().await;
    if bags.cart.remove_item(&key) {
        add_breadcrumb(
            "cart",
            "Removed from cart",
            Some(&[("product_id", key.id.as_str())]),
        );
    }
    visitor.persist(&mut bags).await?;
    Ok(Json(CartView::drain(&mut bags.cart, &state.config().bags)))
}

/// Empty the cart.
#[instrument(skip_all, fields(visitor = %visitor.id()))]
pub async fn clear(
    State(state): State<AppState>,
    visitor: VisitorContext,
) -> Result<Json<CartView>> {
    let mut bags = visitor.lock().await;
    bags.cart.clear();
    visitor.persist(&mut bags).await?;
    Ok(Json(CartView::drain(&mut bags.cart, &state.config().bags)))
}

/// Checkout hand-off. Not wired to a payment flow yet.
#[instrument(skip_all)]
pub async fn checkout() -> Result<()> {
    Err(AppError::NotImplemented("Checkout"))
}
