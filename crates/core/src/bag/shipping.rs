//! Flat-rate shipping with a free-shipping threshold.

use rust_decimal::Decimal;
use serde::Serialize;

/// Shipping rule applied to a cart subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingPolicy {
    /// Subtotals at or above this ship free.
    pub free_threshold: Decimal,
    /// Charged below the threshold.
    pub flat_rate: Decimal,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_threshold: Decimal::new(999, 0),
            flat_rate: Decimal::new(79, 0),
        }
    }
}

/// Derived cart totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    /// Sum of quantity × unit price.
    pub subtotal: Decimal,
    /// Shipping charge; zero for an empty cart.
    pub shipping: Decimal,
    /// Whether the subtotal reached the free-shipping threshold.
    pub free_shipping: bool,
    /// How much more to spend for free shipping; zero once reached.
    pub amount_to_free_shipping: Decimal,
    /// Subtotal plus shipping.
    pub total: Decimal,
}

impl ShippingPolicy {
    /// Totals for a cart with this subtotal.
    #[must_use]
    pub fn summarize(&self, subtotal: Decimal, empty: bool) -> CartSummary {
        let free_shipping = subtotal >= self.free_threshold;
        let shipping = if free_shipping || empty {
            Decimal::ZERO
        } else {
            self.flat_rate
        };

        CartSummary {
            subtotal,
            shipping,
            free_shipping,
            amount_to_free_shipping: (self.free_threshold - subtotal).max(Decimal::ZERO),
            total: subtotal + shipping,
        }
    }
}
