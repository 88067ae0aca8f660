//! Sync status and manual retry of a failed sign-in merge.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::error::Result;
use crate::middleware::{RequireAuth, VisitorContext};
use crate::routes::cart::CartView;
use crate::routes::wishlist::WishlistView;
use crate::state::AppState;

/// Loading flags, read without waiting for in-flight bag operations.
#[derive(Debug, Serialize)]
pub struct SyncStatus {
    pub cart_loading: bool,
    pub wishlist_loading: bool,
}

/// Bag state after a retry.
#[derive(Debug, Serialize)]
pub struct RetryView {
    pub cart: CartView,
    pub wishlist: WishlistView,
}

/// Whether either bag is fetching account items.
#[instrument(skip_all, fields(visitor = %visitor.id()))]
pub async fn status(visitor: VisitorContext) -> Json<SyncStatus> {
    let (cart_loading, wishlist_loading) = visitor.loading();
    Json(SyncStatus {
        cart_loading,
        wishlist_loading,
    })
}

/// Re-run a sign-in merge whose account fetch failed.
///
/// Bags that are not pending are left alone. On failure the items stay on
/// the device and the bag stays pending.
#[instrument(skip_all, fields(visitor = %visitor.id(), user_id = %user.id))]
pub async fn retry(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    visitor: VisitorContext,
) -> Result<Json<RetryView>> {
    let mut bags = visitor.lock().await;
    let cart = bags.cart.retry_reconcile().await;
    let wishlist = bags.wishlist.retry_reconcile().await;
    visitor.persist(&mut bags).await?;

    if let Err(e) = cart.and(wishlist) {
        warn!(error = %e, "Sync retry failed");
        return Err(e.into());
    }

    Ok(Json(RetryView {
        cart: CartView::drain(&mut bags.cart, &state.config().bags),
        wishlist: WishlistView::drain(&mut bags.wishlist),
    }))
}
