//! Cart line items and wishlist entries.

use core::fmt;
use core::hash::Hash;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ProductId;

/// Largest quantity a cart line may hold. Matches the `INTEGER` quantity
/// column of the account tables.
pub const MAX_QUANTITY: u32 = 2_147_483_647;

/// Rejected input, raised before any mutation is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A product option (size, color) must be chosen before adding.
    #[error("please select a {0}")]
    MissingSelection(&'static str),

    /// Quantity must be a positive integer.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// Quantity does not fit the supported range.
    #[error("quantity {0} is too large")]
    QuantityTooLarge(i64),

    /// No variant matches the chosen options.
    #[error("no variant of {product} matches the selected options")]
    UnknownVariant {
        /// Product handle.
        product: String,
    },

    /// The chosen variant cannot be purchased.
    #[error("{product} is sold out in this option")]
    Unavailable {
        /// Product handle.
        product: String,
    },
}

/// An entry that can live in a cart or wishlist.
///
/// Each item has a natural key; a list holds at most one item per key.
pub trait BagItem:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Natural key identifying the row for upsert and delete.
    type Key: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// The natural key of this item.
    fn key(&self) -> Self::Key;

    /// Units represented by this item.
    fn quantity(&self) -> u32;

    /// Price of one unit.
    fn unit_price(&self) -> Decimal;

    /// Fold an incoming duplicate (same key) into this item.
    ///
    /// Returns `Ok(true)` if this item changed. On error the item is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::QuantityTooLarge` if the folded quantity
    /// would exceed [`MAX_QUANTITY`].
    fn absorb(&mut self, incoming: &Self) -> Result<bool, ValidationError>;
}

/// Check a requested quantity against `1..=MAX_QUANTITY`.
///
/// # Errors
///
/// Returns `ZeroQuantity` below 1 and `QuantityTooLarge` above [`MAX_QUANTITY`].
pub fn checked_quantity(quantity: i64) -> Result<u32, ValidationError> {
    if quantity < 1 {
        return Err(ValidationError::ZeroQuantity);
    }
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q <= MAX_QUANTITY)
        .ok_or(ValidationError::QuantityTooLarge(quantity))
}

/// Natural key of a cart line: product, size and color.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    /// Product identifier.
    pub id: ProductId,
    /// Selected size.
    pub size: String,
    /// Selected color.
    pub color: String,
}

impl LineKey {
    /// Build a line key.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, size: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            size: size.into(),
            color: color.into(),
        }
    }
}

/// One cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Decimal,
    /// Pre-discount unit price, when on sale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    /// Image URL.
    pub image: String,
    /// Selected size.
    pub size: String,
    /// Selected color.
    pub color: String,
    /// Units in the cart (positive).
    pub quantity: u32,
}

impl BagItem for LineItem {
    type Key = LineKey;

    fn key(&self) -> LineKey {
        LineKey {
            id: self.id.clone(),
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn unit_price(&self) -> Decimal {
        self.price
    }

    fn absorb(&mut self, incoming: &Self) -> Result<bool, ValidationError> {
        self.quantity = checked_quantity(i64::from(self.quantity) + i64::from(incoming.quantity))?;
        Ok(true)
    }
}

/// One saved product. Wishlists track no quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    /// Product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Current price.
    pub price: Decimal,
    /// Pre-discount price, when on sale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    /// Primary image URL.
    pub image: String,
    /// Hover image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_image: Option<String>,
}

impl BagItem for WishlistEntry {
    type Key = ProductId;

    fn key(&self) -> ProductId {
        self.id.clone()
    }

    fn quantity(&self) -> u32 {
        1
    }

    fn unit_price(&self) -> Decimal {
        self.price
    }

    fn absorb(&mut self, _incoming: &Self) -> Result<bool, ValidationError> {
        Ok(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_json_shape() {
        let item = LineItem {
            id: ProductId::new("p1"),
            name: "Linen Shirt".to_string(),
            price: Decimal::new(4999, 2),
            original_price: None,
            image: "/img/p1.jpg".to_string(),
            size: "M".to_string(),
            color: "Sand".to_string(),
            quantity: 2,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], "p1");
        assert_eq!(json["price"], "49.99");
        assert_eq!(json["quantity"], 2);
        assert!(json.get("originalPrice").is_none());
    }

    #[test]
    fn test_wishlist_entry_reads_camel_case() {
        let entry: WishlistEntry = serde_json::from_str(
            r#"{"id":"p2","name":"Wool Coat","price":"120.00","originalPrice":"150.00",
                "image":"/a.jpg","secondaryImage":"/b.jpg"}"#,
        )
        .unwrap();
        assert_eq!(entry.original_price, Some(Decimal::new(15000, 2)));
        assert_eq!(entry.secondary_image.as_deref(), Some("/b.jpg"));
        assert_eq!(entry.quantity(), 1);
    }

    #[test]
    fn test_checked_quantity_bounds() {
        assert_eq!(checked_quantity(1), Ok(1));
        assert_eq!(checked_quantity(i64::from(MAX_QUANTITY)), Ok(MAX_QUANTITY));
        assert_eq!(checked_quantity(0), Err(ValidationError::ZeroQuantity));
        assert_eq!(
            checked_quantity(i64::from(MAX_QUANTITY) + 1),
            Err(ValidationError::QuantityTooLarge(2_147_483_648))
        );
        assert!(i32::try_from(MAX_QUANTITY).is_ok());
    }
}
