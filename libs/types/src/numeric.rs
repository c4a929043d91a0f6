//! Fixed-point decimal types for prices and volumes
//!
//! Uses rust_decimal so that every book price is an exact multiple of the
//! tick size. Floating point only appears in the stochastic reference price,
//! and is converted at the tick grid boundary through `TickSize`.

use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Aggregate share count resting at a level or carried by an order
pub type Volume = u64;

/// A price, usually aligned to the tick grid of the book it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Wrap a decimal
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Wrap a decimal, rejecting zero and negative values
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Whole-number price
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Convert from a float, keeping the shortest decimal representation
    pub fn from_f64(value: f64) -> Option<Self> {
        Decimal::from_f64(value).map(Self)
    }

    /// Get the inner decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Lossy conversion for the stochastic side of the simulator
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// Whether the price is strictly positive
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Exact midpoint of two prices (may fall between ticks)
    pub fn midpoint(a: Price, b: Price) -> Price {
        Price((a.0 + b.0) / Decimal::TWO)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str_exact(s).map(Self)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Minimum price increment of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickSize(Decimal);

impl TickSize {
    /// Create a tick size; zero and negative ticks are rejected
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value.normalize()))
        } else {
            None
        }
    }

    /// Create a tick size from a configuration float
    pub fn from_f64(value: f64) -> Option<Self> {
        Decimal::from_f64(value).and_then(Self::try_new)
    }

    /// Get the inner decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Tick as a float, for noise and offset arithmetic
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// Snap to the nearest tick (halves round away from zero)
    pub fn quantize(&self, value: Decimal) -> Price {
        self.snap(value, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Snap to the nearest tick, or `None` if the tick count overflows
    pub fn checked_quantize(&self, value: Decimal) -> Option<Price> {
        self.checked_snap(value, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Snap a float to the nearest tick
    pub fn quantize_f64(&self, value: f64) -> Option<Price> {
        Decimal::from_f64(value).and_then(|d| self.checked_quantize(d))
    }

    /// Largest tick multiple not above `value`
    pub fn floor(&self, value: Decimal) -> Price {
        self.snap(value, RoundingStrategy::ToNegativeInfinity)
    }

    /// Smallest tick multiple not below `value`
    pub fn ceil(&self, value: Decimal) -> Price {
        self.snap(value, RoundingStrategy::ToPositiveInfinity)
    }

    /// Move a price by a signed number of ticks
    pub fn offset(&self, price: Price, ticks: i64) -> Price {
        Price((price.0 + self.0 * Decimal::from(ticks)).round_dp(self.0.scale()))
    }

    /// Signed distance from `from` to `to` in whole ticks
    pub fn ticks_between(&self, from: Price, to: Price) -> i64 {
        ((to.0 - from.0) / self.0)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(0)
    }

    /// Whether a price sits exactly on the tick grid
    pub fn is_aligned(&self, price: Price) -> bool {
        (price.0 % self.0).is_zero()
    }

    /// Values whose tick count overflows are returned unsnapped
    fn snap(&self, value: Decimal, strategy: RoundingStrategy) -> Price {
        self.checked_snap(value, strategy).unwrap_or(Price(value))
    }

    fn checked_snap(&self, value: Decimal, strategy: RoundingStrategy) -> Option<Price> {
        let steps = value.checked_div(self.0)?.round_dp_with_strategy(0, strategy);
        let snapped = steps.checked_mul(self.0)?;
        Some(Price(snapped.round_dp(self.0.scale())))
    }
}

impl fmt::Display for TickSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
