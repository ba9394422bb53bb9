//! Decimal money amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when an amount would leave the representable decimal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("amount out of range")]
pub struct AmountOverflow;

/// A non-currency-aware decimal amount.
///
/// Prices, cart totals and order totals all use this type. It is serialized
/// as a plain JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a money amount from a decimal value.
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a money amount from a whole number of major units.
    pub fn from_major(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the underlying decimal amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Multiplies by a quantity, failing instead of overflowing.
    pub fn checked_mul(&self, quantity: u32) -> Result<Money, AmountOverflow> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Money)
            .ok_or(AmountOverflow)
    }

    pub fn checked_add(&self, rhs: Money) -> Result<Money, AmountOverflow> {
        self.0.checked_add(rhs.0).map(Money).ok_or(AmountOverflow)
    }

    pub fn checked_sub(&self, rhs: Money) -> Result<Money, AmountOverflow> {
        self.0.checked_sub(rhs.0).map(Money).ok_or(AmountOverflow)
    }

    /// Applies a rate, e.g. `0.10` for ten percent.
    pub fn checked_apply_rate(&self, rate: Decimal) -> Result<Money, AmountOverflow> {
        self.0.checked_mul(rate).map(Money).ok_or(AmountOverflow)
    }

    /// Adds up `amounts`, failing on the first overflow.
    pub fn checked_sum<I>(amounts: I) -> Result<Money, AmountOverflow>
    where
        I: IntoIterator<Item = Result<Money, AmountOverflow>>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount?))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.round_dp(2).normalize())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}
