//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Format for display, rounded to two decimals and grouped the way the
    /// currency's home locale groups digits (e.g., "₹1,23,456.00",
    /// "$123,456.00").
    #[must_use]
    pub fn display(&self) -> String {
        let formatted = format!("{:.2}", self.amount.round_dp(2).abs());
        let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
        let sign = if self.amount.is_sign_negative() && !self.amount.is_zero() {
            "-"
        } else {
            ""
        };
        format!(
            "{sign}{}{}.{fraction}",
            self.currency_code.symbol(),
            group_digits(whole, self.currency_code.uses_lakh_grouping())
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Insert thousands separators. Lakh grouping keeps the last three digits
/// together and groups the rest in pairs.
fn group_digits(whole: &str, lakh: bool) -> String {
    let digits: Vec<char> = whole.chars().collect();
    let mut groups: Vec<String> = Vec::new();
    let mut end = digits.len();
    let mut size = 3;
    while end > 0 {
        let start = end.saturating_sub(size);
        groups.push(digits.get(start..end).unwrap_or_default().iter().collect());
        end = start;
        if lakh {
            size = 2;
        }
    }
    groups.reverse();
    groups.join(",")
}

/// An unsupported currency code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported currency code: {0}")]
pub struct UnknownCurrency(String);

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Currency symbol used for display.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    const fn uses_lakh_grouping(self) -> bool {
        matches!(self, Self::INR)
    }
}

impl FromStr for CurrencyCode {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Self::INR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            _ => Err(UnknownCurrency(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn inr(amount: Decimal) -> String {
        Price::new(amount, CurrencyCode::INR).display()
    }

    #[test]
    fn test_display_rounds_to_two_places() {
        assert_eq!(inr(Decimal::new(19_990, 3)), "₹19.99");
        assert_eq!(inr(Decimal::ZERO), "₹0.00");
        assert_eq!(
            Price::new(Decimal::new(5, 0), CurrencyCode::EUR).to_string(),
            "€5.00"
        );
    }

    #[test]
    fn test_rupees_use_lakh_grouping() {
        assert_eq!(inr(Decimal::new(999, 0)), "₹999.00");
        assert_eq!(inr(Decimal::new(1_078, 0)), "₹1,078.00");
        assert_eq!(inr(Decimal::new(123_456_789, 2)), "₹12,34,567.89");
        assert_eq!(inr(Decimal::new(-2_500, 0)), "-₹2,500.00");
    }

    #[test]
    fn test_dollars_use_thousands_grouping() {
        let price = Price::new(Decimal::new(123_456_789, 2), CurrencyCode::USD);
        assert_eq!(price.display(), "$1,234,567.89");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("inr".parse::<CurrencyCode>().unwrap(), CurrencyCode::INR);
        assert_eq!(" USD ".parse::<CurrencyCode>().unwrap(), CurrencyCode::USD);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
        assert_eq!(CurrencyCode::default(), CurrencyCode::INR);
    }
}
