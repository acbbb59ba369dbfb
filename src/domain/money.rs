//! Constrained money types: `Price` (clamped to `[0,1]`) and `Volume` (non-negative).
//!
//! Both wrap `rust_decimal::Decimal` rather than `f64` — exact decimal
//! arithmetic avoids the rounding drift that would otherwise leak into
//! combined-cost and fee calculations.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A price in `[0, 1]`, the valid range for a binary-market outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    /// Construct a price, rejecting values outside `[0, 1]`.
    pub fn new(value: Decimal) -> Result<Self> {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(Error::Trading(format!(
                "price {value} out of range [0, 1]"
            )));
        }
        Ok(Self(value))
    }

    /// The complementary price of a binary outcome: `1 - self`.
    #[must_use]
    pub fn complement(self) -> Self {
        Self(Decimal::ONE - self.0)
    }

    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative size or liquidity depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Volume(Decimal);

impl Volume {
    pub fn new(value: Decimal) -> Result<Self> {
        if value < Decimal::ZERO {
            return Err(Error::Trading(format!("volume {value} cannot be negative")));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for Volume {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn price_rejects_out_of_range() {
        assert!(Price::new(dec!(-0.01)).is_err());
        assert!(Price::new(dec!(1.01)).is_err());
        assert!(Price::new(dec!(0.5)).is_ok());
    }

    #[test]
    fn price_complement_sums_to_one() {
        let p = Price::new(dec!(0.45)).unwrap();
        assert_eq!(p.complement().value(), dec!(0.55));
        assert_eq!((p.value() + p.complement().value()), Decimal::ONE);
    }

    #[test]
    fn volume_rejects_negative() {
        assert!(Volume::new(dec!(-1)).is_err());
        assert!(Volume::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn volume_min_picks_smaller() {
        let a = Volume::new(dec!(10)).unwrap();
        let b = Volume::new(dec!(5)).unwrap();
        assert_eq!(a.min(b).value(), dec!(5));
    }
}
