//! Price representation in minor currency units.
//!
//! Course prices are stored as integer minor units (paise, cents) to avoid
//! float arithmetic anywhere near money. `rust_decimal` is used only at the
//! display boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price in minor currency units (e.g., paise for INR, cents for USD).
///
/// A price of zero means the course is free: enrollment alone grants full
/// access and no purchase is ever created for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Amount in the smallest currency unit. Never negative.
    pub minor_units: i64,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl Price {
    /// Create a price from minor units.
    #[must_use]
    pub const fn from_minor_units(minor_units: i64, currency: CurrencyCode) -> Self {
        Self {
            minor_units,
            currency,
        }
    }

    /// Whether this price is zero (free course).
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.minor_units == 0
    }

    /// The amount in the currency's standard unit, for display.
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        Decimal::new(self.minor_units, 2)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_decimal(), self.currency.code())
    }
}

/// ISO 4217 currency codes accepted by the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// The three-letter code as sent to the gateway.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INR" => Ok(Self::INR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            _ => Err(format!("unsupported currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_price_is_free() {
        assert!(Price::from_minor_units(0, CurrencyCode::INR).is_free());
        assert!(!Price::from_minor_units(49_900, CurrencyCode::INR).is_free());
    }

    #[test]
    fn display_uses_standard_units() {
        let price = Price::from_minor_units(49_900, CurrencyCode::INR);
        assert_eq!(price.to_string(), "499.00 INR");
    }

    #[test]
    fn currency_round_trips_through_code() {
        let code: CurrencyCode = "USD".parse().expect("parse");
        assert_eq!(code.code(), "USD");
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
