//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A non-negative product price.
///
/// The amount is stored unrounded; rounding to two decimals happens only at
/// display time. On the wire this is a plain JSON number, matching the
/// format the shop pages have always persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, clamping negative amounts to zero.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(amount.max(Decimal::ZERO))
    }

    /// The unrounded amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The amount rounded to two decimals for display.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.0.round_dp(2)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded())
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        rust_decimal::serde::float::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rounds_to_two_decimals() {
        let price = Price::new(Decimal::new(3_505, 3)); // 3.505
        assert_eq!(price.to_string(), "3.51");
        // Stored amount stays unrounded
        assert_eq!(price.amount(), Decimal::new(3_505, 3));
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        let price = Price::new(Decimal::new(-250, 2));
        assert_eq!(price, Price::ZERO);
    }

    #[test]
    fn test_serializes_as_json_number() {
        let price = Price::new(Decimal::new(350, 2)); // 3.50
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "3.5");

        let back: Price = serde_json::from_str("10").unwrap();
        assert_eq!(back.amount(), Decimal::from(10));
    }

    #[test]
    fn test_deserialize_rejects_non_numbers() {
        assert!(serde_json::from_str::<Price>("\"3.50\"").is_err());
    }
}
