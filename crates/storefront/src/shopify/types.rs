//! Domain types for Shopify Storefront API.
//!
//! These mirror the fields selected in `storefront::queries` and deserialize
//! straight from the GraphQL response (camelCase, connections flattened).

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Money Types
// =============================================================================

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Decimal amount (Shopify sends it as a string).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

/// Price range for a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    /// Minimum price among all variants.
    pub min_variant_price: Money,
    /// Maximum price among all variants.
    pub max_variant_price: Money,
}

// =============================================================================
// Product Types
// =============================================================================

/// Product image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
}

/// A product option and its possible values (e.g., Size: S, M, L).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOption {
    /// Option name.
    pub name: String,
    /// Option values.
    pub values: Vec<String>,
}

/// Selected option on a variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name (e.g., "Size").
    pub name: String,
    /// Option value (e.g., "M").
    pub value: String,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    /// Variant ID.
    pub id: String,
    /// Variant title.
    pub title: String,
    /// Whether this variant can be purchased.
    pub available_for_sale: bool,
    /// Variant price.
    pub price: Money,
    /// Pre-discount price, when on sale.
    pub compare_at_price: Option<Money>,
    /// Option values that identify this variant.
    pub selected_options: Vec<SelectedOption>,
}

impl ProductVariant {
    /// Value of the named option, matched case-insensitively.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&str> {
        self.selected_options
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(name))
            .map(|o| o.value.as_str())
    }
}

/// A product in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product ID.
    pub id: String,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Plain text description.
    #[serde(default)]
    pub description: String,
    /// Whether any variant is available.
    pub available_for_sale: bool,
    /// Price range across variants.
    pub price_range: PriceRange,
    /// Compare-at price range.
    pub compare_at_price_range: Option<PriceRange>,
    /// Product images, in display order.
    #[serde(deserialize_with = "nodes")]
    pub images: Vec<Image>,
    /// Product options.
    #[serde(default)]
    pub options: Vec<ProductOption>,
    /// Product variants.
    #[serde(deserialize_with = "nodes")]
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// Whether the product has an option with this name.
    #[must_use]
    pub fn has_option(&self, name: &str) -> bool {
        self.options.iter().any(|o| o.name.eq_ignore_ascii_case(name))
    }
}

// =============================================================================
// Pagination Types
// =============================================================================

/// Pagination information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether there are more items after this page.
    pub has_next_page: bool,
    /// Cursor for the last item.
    pub end_cursor: Option<String>,
}

/// One page of products.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductConnection {
    /// Products in this page.
    #[serde(rename = "nodes")]
    pub products: Vec<Product>,
    /// Pagination info.
    pub page_info: PageInfo,
}

/// Flatten a GraphQL `{ nodes: [...] }` connection into a list.
fn nodes<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    struct Connection<T> {
        nodes: Vec<T>,
    }

    Connection::deserialize(deserializer).map(|c| c.nodes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const PRODUCT_JSON: &str = r#"{
        "id": "gid://shopify/Product/1",
        "handle": "linen-shirt",
        "title": "Linen Shirt",
        "description": "Breathable.",
        "availableForSale": true,
        "priceRange": {
            "minVariantPrice": {"amount": "79.0", "currencyCode": "USD"},
            "maxVariantPrice": {"amount": "79.0", "currencyCode": "USD"}
        },
        "compareAtPriceRange": null,
        "images": {"nodes": [{"url": "https://cdn/a.jpg", "altText": null}]},
        "options": [{"name": "Size", "values": ["S", "M"]}],
        "variants": {"nodes": [{
            "id": "gid://shopify/ProductVariant/10",
            "title": "S",
            "availableForSale": true,
            "price": {"amount": "79.0", "currencyCode": "USD"},
            "compareAtPrice": null,
            "selectedOptions": [{"name": "Size", "value": "S"}]
        }]}
    }"#;

    #[test]
    fn test_product_deserializes_from_graphql() {
        let product: Product = serde_json::from_str(PRODUCT_JSON).unwrap();
        assert_eq!(product.handle, "linen-shirt");
        assert_eq!(product.images.len(), 1);
        assert_eq!(product.variants[0].price.amount, Decimal::new(79, 0));
        assert_eq!(product.variants[0].option("size"), Some("S"));
        assert!(product.has_option("SIZE"));
        assert!(!product.has_option("Color"));
    }
}
