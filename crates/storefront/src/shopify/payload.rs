//! Build cart and wishlist items from catalog products.

use rust_decimal::Decimal;
use valiero_core::{LineItem, ProductId, ValidationError, WishlistEntry, checked_quantity};

use super::types::{Money, Product, PriceRange};

const SIZE: &str = "size";
const COLOR: &str = "color";

/// Resolve the chosen options to a variant and build a cart line.
///
/// Options the product does not have are ignored and stored as `""`.
///
/// # Errors
///
/// - `ZeroQuantity` if `quantity` is 0
/// - `QuantityTooLarge` if `quantity` is above `MAX_QUANTITY`
/// - `MissingSelection` if the product has a size or color option and none was chosen
/// - `UnknownVariant` if no variant matches the chosen options
/// - `Unavailable` if the matching variant is sold out
pub fn line_item(
    product: &Product,
    size: Option<&str>,
    color: Option<&str>,
    quantity: u32,
) -> Result<LineItem, ValidationError> {
    let quantity = checked_quantity(i64::from(quantity))?;
    let size = required_selection(product, SIZE, size)?;
    let color = required_selection(product, COLOR, color)?;

    let variant = product
        .variants
        .iter()
        .find(|v| matches_selection(v.option(SIZE), size) && matches_selection(v.option(COLOR), color))
        .ok_or_else(|| ValidationError::UnknownVariant {
            product: product.handle.clone(),
        })?;

    if !variant.available_for_sale {
        return Err(ValidationError::Unavailable {
            product: product.handle.clone(),
        });
    }

    Ok(LineItem {
        id: ProductId::new(product.id.clone()),
        name: product.title.clone(),
        price: variant.price.amount,
        original_price: markdown_from(variant.price.amount, variant.compare_at_price.as_ref()),
        image: image_url(product, 0).unwrap_or_default(),
        // Canonical casing comes from the catalog, not the request.
        size: variant.option(SIZE).map(str::to_string).unwrap_or_default(),
        color: variant.option(COLOR).map(str::to_string).unwrap_or_default(),
        quantity,
    })
}

/// Build a wishlist entry priced at the product's lowest variant price.
#[must_use]
pub fn wishlist_entry(product: &Product) -> WishlistEntry {
    let price = product.price_range.min_variant_price.amount;
    let compare_at = product
        .compare_at_price_range
        .as_ref()
        .map(|range: &PriceRange| &range.min_variant_price);

    WishlistEntry {
        id: ProductId::new(product.id.clone()),
        name: product.title.clone(),
        price,
        original_price: markdown_from(price, compare_at),
        image: image_url(product, 0).unwrap_or_default(),
        secondary_image: image_url(product, 1),
    }
}

fn required_selection<'a>(
    product: &Product,
    option: &'static str,
    chosen: Option<&'a str>,
) -> Result<Option<&'a str>, ValidationError> {
    let chosen = chosen.map(str::trim).filter(|c| !c.is_empty());
    if product.has_option(option) && chosen.is_none() {
        return Err(ValidationError::MissingSelection(option));
    }
    Ok(chosen.filter(|_| product.has_option(option)))
}

fn matches_selection(variant_value: Option<&str>, chosen: Option<&str>) -> bool {
    match (variant_value, chosen) {
        (Some(value), Some(chosen)) => value.eq_ignore_ascii_case(chosen),
        (None, None) => true,
        _ => false,
    }
}

/// Compare-at price, only when it is an actual markdown.
fn markdown_from(price: Decimal, compare_at: Option<&Money>) -> Option<Decimal> {
    compare_at
        .map(|money| money.amount)
        .filter(|amount| *amount > price)
}

fn image_url(product: &Product, index: usize) -> Option<String> {
    product.images.get(index).map(|image| image.url.clone())
}
