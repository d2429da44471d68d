//! Course price representation using decimal arithmetic.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A course price in major currency units (e.g., dollars).
///
/// Prices are stored and displayed in major units, but the payment gateway
/// bills in minor units (cents), so this type owns that conversion.
/// A price of zero means the course is free and bypasses the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

/// Errors constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceError {
    /// Prices cannot be negative.
    #[error("price cannot be negative")]
    Negative,
}

impl Price {
    /// A zero (free) price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount in major units.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in minor units (cents).
    #[must_use]
    pub fn from_minor_units(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The amount in major units.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The amount in minor units (cents), rounded to the nearest cent.
    ///
    /// Saturates at `i64::MAX` for amounts beyond the representable range,
    /// which no real course price approaches.
    #[must_use]
    pub fn to_minor_units(&self) -> i64 {
        (self.0 * Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
            .unwrap_or(i64::MAX)
    }

    /// Whether this price is zero (a free course).
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.0.is_zero()
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert_eq!(Price::new(Decimal::new(-1, 2)), Err(PriceError::Negative));
    }

    #[test]
    fn test_zero_is_free() {
        assert!(Price::ZERO.is_free());
        assert!(Price::new(Decimal::ZERO).unwrap().is_free());
        assert!(!Price::new(Decimal::new(999, 2)).unwrap().is_free());
    }

    #[test]
    fn test_minor_units_conversion() {
        let price = Price::new(Decimal::new(4999, 2)).unwrap(); // 49.99
        assert_eq!(price.to_minor_units(), 4999);
        assert_eq!(Price::from_minor_units(4999), price);
    }

    #[test]
    fn test_minor_units_rounds_sub_cent() {
        // 19.999 rounds to 2000 cents
        let price = Price::new(Decimal::new(19_999, 3)).unwrap();
        assert_eq!(price.to_minor_units(), 2000);
    }
}
