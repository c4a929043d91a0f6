//! Execution records
//!
//! A fill is one (price, volume) execution produced by continuous matching,
//! a midpoint cross or an auction uncross.

use crate::ids::OrderId;
use crate::numeric::{Price, Volume};
use crate::order::Side;
use serde::{Deserialize, Serialize};

/// Where an execution happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FillSource {
    /// Walked the visible ladder
    CONTINUOUS,
    /// Crossed at the bid/ask midpoint
    MIDPOINT,
    /// Uncrossed at a single auction clearing price
    AUCTION,
}

/// A single execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Order that took liquidity (buy side for auction matches)
    pub order_id: OrderId,
    /// Side of the aggressing order
    pub aggressor: Side,
    pub price: Price,
    pub volume: Volume,
    pub source: FillSource,
    pub timestamp: i64,
}

impl Fill {
    /// Notional value of the execution
    pub fn notional(&self) -> rust_decimal::Decimal {
        self.price.as_decimal() * rust_decimal::Decimal::from(self.volume)
    }
}

/// Total volume across a set of fills
pub fn filled_volume(fills: &[Fill]) -> Volume {
    fills.iter().map(|f| f.volume).sum()
}
