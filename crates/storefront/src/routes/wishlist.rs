//! Wishlist route handlers.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use valiero_core::{ProductId, WishlistEntry};

use crate::bag::{RemoteStore, SyncNotice, WishlistBag};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::VisitorContext;
use crate::shopify::payload;
use crate::state::AppState;

/// A product addressed by catalog handle.
#[derive(Debug, Deserialize)]
pub struct HandleRequest {
    pub handle: String,
}

/// A saved product addressed by id.
#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    pub id: String,
}

/// Wishlist state returned by every wishlist endpoint.
#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub items: Vec<WishlistEntry>,
    pub count: u64,
    pub total_price: Decimal,
    pub loading: bool,
    pub pending_sync: bool,
    pub notices: Vec<SyncNotice>,
}

impl WishlistView {
    /// Snapshot the wishlist, draining its notices.
    pub fn drain<R: RemoteStore<WishlistEntry>>(wishlist: &mut WishlistBag<R>) -> Self {
        Self {
            items: wishlist.items().to_vec(),
            count: wishlist.total_items(),
            total_price: wishlist.total_price(),
            loading: wishlist.is_loading(),
            pending_sync: wishlist.is_pending(),
            notices: wishlist.take_notices(),
        }
    }
}

/// Result of a toggle.
#[derive(Debug, Serialize)]
pub struct ToggleView {
    /// Whether the product is saved after the toggle.
    pub saved: bool,
    pub wishlist: WishlistView,
}

/// Current wishlist.
#[instrument(skip_all, fields(visitor = %visitor.id()))]
pub async fn show(visitor: VisitorContext) -> Result<Json<WishlistView>> {
    let mut bags = visitor.lock().await;
    visitor.persist(&mut bags).await?;
    Ok(Json(WishlistView::drain(&mut bags.wishlist)))
}

/// Save a product. Saving it again is a no-op.
#[instrument(skip(state, visitor), fields(visitor = %visitor.id()))]
pub async fn add(
    State(state): State<AppState>,
    visitor: VisitorContext,
    Json(request): Json<HandleRequest>,
) -> Result<Json<WishlistView>> {
    let product = state
        .storefront()
        .get_product_by_handle(super::require_handle(&request.handle)?)
        .await?;
    let entry = payload::wishlist_entry(&product);
    add_breadcrumb(
        "wishlist",
        "Saved product",
        Some(&[("product_id", entry.id.as_str())]),
    );

    let mut bags = visitor.lock().await;
    bags.wishlist.add_item(entry)?;
    visitor.persist(&mut bags).await?;
    Ok(Json(WishlistView::drain(&mut bags.wishlist)))
}

/// Save the product if it is not saved, unsave it otherwise.
#[instrument(skip(state, visitor), fields(visitor = %visitor.id()))]
pub async fn toggle(
    State(state): State<AppState>,
    visitor: VisitorContext,
    Json(request): Json<HandleRequest>,
) -> Result<Json<ToggleView>> {
    let product = state
        .storefront()
        .get_product_by_handle(super::require_handle(&request.handle)?)
        .await?;
    let entry = payload::wishlist_entry(&product);

    let mut bags = visitor.lock().await;
    let saved = bags.wishlist.toggle(entry)?;
    visitor.persist(&mut bags).await?;

    add_breadcrumb(
        "wishlist",
        if saved { "Saved product" } else { "Unsaved product" },
        Some(&[("handle", request.handle.as_str())]),
    );

    Ok(Json(ToggleView {
        saved,
        wishlist: WishlistView::drain(&mut bags.wishlist),
    }))
}

/// Unsave a product. Unknown ids are ignored.
#[instrument(skip(visitor), fields(visitor = %visitor.id()))]
pub async fn remove(
    visitor: VisitorContext,
    Json(request): Json<RemoveRequest>,
) -> Result<Json<WishlistView>> {
    let id = ProductId::new(request.id);

    let mut bags = visitor.lock().await;
    bags.wishlist.remove_item(&id);
    visitor.persist(&mut bags).await?;
    Ok(Json(WishlistView::drain(&mut bags.wishlist)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::bag::testing::MemoryRemote;
    use crate::bag::{Bag, JsonSlot};
    use crate::models::session_keys;

    fn entry(id: &str) -> WishlistEntry {
        WishlistEntry {
            id: ProductId::new(id),
            name: id.to_string(),
            price: Decimal::new(9000, 2),
            original_price: None,
            image: String::new(),
            secondary_image: None,
        }
    }

    #[tokio::test]
    async fn test_view_counts_entries() {
        let mut wishlist: WishlistBag<MemoryRemote<WishlistEntry>> = Bag::new(
            "wishlist",
            JsonSlot::new(session_keys::WISHLIST),
            Arc::new(MemoryRemote::default()),
        );
        wishlist.add_item(entry("a")).unwrap();
        wishlist.add_item(entry("a")).unwrap();
        wishlist.add_item(entry("b")).unwrap();

        let view = WishlistView::drain(&mut wishlist);
        assert_eq!(view.count, 2);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.total_price, Decimal::new(18000, 2));
    }
}
