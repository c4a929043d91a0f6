//! Order types for synthetic order flow
//!
//! An order is one of five mutually exclusive kinds. The book and the
//! auction controller dispatch on `OrderKind` rather than on separate types.

use crate::ids::OrderId;
use crate::numeric::{Price, Volume};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }
}

/// What an order asks the book to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    /// Execute immediately against the opposite side, remainder discarded
    Market,
    /// Rest at `price`, matching first if it crosses
    Limit { price: Price },
    /// Withdraw resting volume from the level at `price` on the order's side
    Cancel { price: Price },
    /// Large one-sided shock that walks several levels
    Jump,
    /// Cross at the current bid/ask midpoint
    Mid,
}

impl OrderKind {
    /// Short label used in metrics and logs
    pub fn label(&self) -> &'static str {
        match self {
            OrderKind::Market => "market",
            OrderKind::Limit { .. } => "limit",
            OrderKind::Cancel { .. } => "cancel",
            OrderKind::Jump => "jump",
            OrderKind::Mid => "mid",
        }
    }
}

/// A single synthetic order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub kind: OrderKind,
    pub volume: Volume,
    pub timestamp: i64, // epoch ms
}

impl Order {
    /// Create an order of any kind
    pub fn new(id: OrderId, side: Side, kind: OrderKind, volume: Volume, timestamp: i64) -> Self {
        Self { id, side, kind, volume, timestamp }
    }

    pub fn market(id: OrderId, side: Side, volume: Volume, timestamp: i64) -> Self {
        Self::new(id, side, OrderKind::Market, volume, timestamp)
    }

    pub fn limit(id: OrderId, side: Side, price: Price, volume: Volume, timestamp: i64) -> Self {
        Self::new(id, side, OrderKind::Limit { price }, volume, timestamp)
    }

    pub fn cancel(id: OrderId, side: Side, price: Price, volume: Volume, timestamp: i64) -> Self {
        Self::new(id, side, OrderKind::Cancel { price }, volume, timestamp)
    }

    pub fn jump(id: OrderId, side: Side, volume: Volume, timestamp: i64) -> Self {
        Self::new(id, side, OrderKind::Jump, volume, timestamp)
    }

    pub fn mid(id: OrderId, side: Side, volume: Volume, timestamp: i64) -> Self {
        Self::new(id, side, OrderKind::Mid, volume, timestamp)
    }

    /// Limit price, if the order carries one
    pub fn limit_price(&self) -> Option<Price> {
        match self.kind {
            OrderKind::Limit { price } => Some(price),
            _ => None,
        }
    }

    /// Whether the order takes liquidity without a price
    pub fn is_unpriced(&self) -> bool {
        matches!(self.kind, OrderKind::Market | OrderKind::Jump)
    }
}
