//! Run metrics for simulation
//!
//! Tracks orders per kind, fills, volume lost to depth limits, restocking,
//! auctions and throughput.

use matching_engine::{ApplyOutcome, AuctionOutcome};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::numeric::Volume;
use types::order::{Order, OrderKind};

/// Aggregated simulation metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimMetrics {
    pub ticks: u64,
    pub total_orders: u64,
    pub market_orders: u64,
    pub limit_orders: u64,
    pub cancel_orders: u64,
    pub jump_orders: u64,
    pub mid_orders: u64,
    pub queued_orders: u64,
    pub dropped_orders: u64,
    pub total_fills: u64,
    pub traded_volume: Volume,
    pub traded_notional: Decimal,
    pub cancelled_volume: Volume,
    pub evicted_volume: Volume,
    pub discarded_volume: Volume,
    pub restocked_levels: u64,
    pub auction_clearings: u64,
    pub auction_volume: Volume,
    pub auction_residual_volume: Volume,
    pub max_spread_ticks: i64,
    pub elapsed_ns: u64,
}

impl SimMetrics {
    /// Create empty metrics.
    pub fn new() -> Self {
        Self {
            ticks: 0,
            total_orders: 0,
            market_orders: 0,
            limit_orders: 0,
            cancel_orders: 0,
            jump_orders: 0,
            mid_orders: 0,
            queued_orders: 0,
            dropped_orders: 0,
            total_fills: 0,
            traded_volume: 0,
            traded_notional: Decimal::ZERO,
            cancelled_volume: 0,
            evicted_volume: 0,
            discarded_volume: 0,
            restocked_levels: 0,
            auction_clearings: 0,
            auction_volume: 0,
            auction_residual_volume: 0,
            max_spread_ticks: 0,
            elapsed_ns: 0,
        }
    }

    /// Count a generated order by kind.
    pub fn record_order(&mut self, order: &Order) {
        self.total_orders += 1;
        match order.kind {
            OrderKind::Market => self.market_orders += 1,
            OrderKind::Limit { .. } => self.limit_orders += 1,
            OrderKind::Cancel { .. } => self.cancel_orders += 1,
            OrderKind::Jump => self.jump_orders += 1,
            OrderKind::Mid => self.mid_orders += 1,
        }
    }

    /// Record what an applied order did to the book.
    pub fn record_outcome(&mut self, outcome: &ApplyOutcome) {
        for fill in &outcome.fills {
            self.total_fills += 1;
            self.traded_volume += fill.volume;
            self.traded_notional += fill.notional();
        }
        self.cancelled_volume += outcome.cancelled;
        self.evicted_volume += outcome.evicted;
        self.discarded_volume += outcome.discarded;
        self.restocked_levels += outcome.restocked_levels as u64;
    }

    /// Record an auction uncross.
    pub fn record_auction(&mut self, outcome: &AuctionOutcome) {
        self.auction_clearings += 1;
        self.auction_volume += outcome.matched_volume;
        self.auction_residual_volume += outcome.residual_buy_volume + outcome.residual_sell_volume;
        for fill in &outcome.fills {
            self.total_fills += 1;
            self.traded_volume += fill.volume;
            self.traded_notional += fill.notional();
        }
    }

    pub fn record_queued(&mut self) {
        self.queued_orders += 1;
    }

    pub fn record_dropped(&mut self) {
        self.dropped_orders += 1;
    }

    /// Levels added by end-of-tick replenishment.
    pub fn record_restock(&mut self, levels: usize) {
        self.restocked_levels += levels as u64;
    }

    pub fn record_tick(&mut self) {
        self.ticks += 1;
    }

    /// Update max spread.
    pub fn update_spread(&mut self, spread_ticks: i64) {
        if spread_ticks > self.max_spread_ticks {
            self.max_spread_ticks = spread_ticks;
        }
    }

    /// Set elapsed time.
    pub fn set_elapsed(&mut self, ns: u64) {
        self.elapsed_ns = ns;
    }

    /// Throughput: orders per second of wall time.
    pub fn orders_per_second(&self) -> f64 {
        if self.elapsed_ns == 0 {
            return 0.0;
        }
        self.total_orders as f64 / (self.elapsed_ns as f64 / 1_000_000_000.0)
    }

    /// Throughput: ticks per second of wall time.
    pub fn ticks_per_second(&self) -> f64 {
        if self.elapsed_ns == 0 {
            return 0.0;
        }
        self.ticks as f64 / (self.elapsed_ns as f64 / 1_000_000_000.0)
    }

    /// Fold another run's metrics into this one. Spread keeps the maximum.
    pub fn merge(&mut self, other: &SimMetrics) {
        self.ticks += other.ticks;
        self.total_orders += other.total_orders;
        self.market_orders += other.market_orders;
        self.limit_orders += other.limit_orders;
        self.cancel_orders += other.cancel_orders;
        self.jump_orders += other.jump_orders;
        self.mid_orders += other.mid_orders;
        self.queued_orders += other.queued_orders;
        self.dropped_orders += other.dropped_orders;
        self.total_fills += other.total_fills;
        self.traded_volume += other.traded_volume;
        self.traded_notional += other.traded_notional;
        self.cancelled_volume += other.cancelled_volume;
        self.evicted_volume += other.evicted_volume;
        self.discarded_volume += other.discarded_volume;
        self.restocked_levels += other.restocked_levels;
        self.auction_clearings += other.auction_clearings;
        self.auction_volume += other.auction_volume;
        self.auction_residual_volume += other.auction_residual_volume;
        self.max_spread_ticks = self.max_spread_ticks.max(other.max_spread_ticks);
        self.elapsed_ns += other.elapsed_ns;
    }

    /// Build a summary string.
    pub fn summary(&self) -> String {
        format!(
            "Ticks: {} | Orders: {} | Fills: {} | Volume: {} | Cancelled: {} | Evicted: {} | Auctions: {} | Max spread: {} ticks | Throughput: {:.0} orders/s",
            self.ticks,
            self.total_orders,
            self.total_fills,
            self.traded_volume,
            self.cancelled_volume,
            self.evicted_volume,
            self.auction_clearings,
            self.max_spread_ticks,
            self.orders_per_second(),
        )
    }
}

impl Default for SimMetrics {
    fn default() -> Self {
        Self::new()
    }
}
