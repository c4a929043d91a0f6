//! Limit order book core
//!
//! Owns the bid and ask ladders and applies synthetic orders to them.
//! Dispatch happens on `OrderKind`; every operation leaves the book
//! uncrossed with at most `max_depth` non-empty levels per side.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::InvariantViolation;
use types::fill::{Fill, FillSource};
use types::numeric::{Price, TickSize, Volume};
use types::order::{Order, OrderKind, Side};

use crate::book::{Ladder, PriceLevel};
use crate::events::ApplyOutcome;
use crate::matching::crossing::{is_crossed, within_limit};
use crate::matching::executor::MatchExecutor;

/// Depth-limited limit order book for a single instrument
#[derive(Debug, Clone)]
pub struct LimitOrderBook {
    tick: TickSize,
    bids: Ladder,
    asks: Ladder,
    /// Volume placed on each level created by replenishment
    restock_volume: Volume,
    executor: MatchExecutor,
}

/// Order book depth snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub bids: Vec<(Price, Volume)>,
    pub asks: Vec<(Price, Volume)>,
}

impl OrderBookSnapshot {
    pub fn best_bid(&self) -> Option<(Price, Volume)> {
        self.bids.first().copied()
    }

    pub fn best_ask(&self) -> Option<(Price, Volume)> {
        self.asks.first().copied()
    }
}

impl LimitOrderBook {
    /// Create an empty book
    pub fn new(tick: TickSize, max_depth: usize) -> Self {
        Self {
            tick,
            bids: Ladder::new(Side::BUY, max_depth),
            asks: Ladder::new(Side::SELL, max_depth),
            restock_volume: 1,
            executor: MatchExecutor::new(),
        }
    }

    /// Set the per-level volume used when replenishing a side
    pub fn with_restock_volume(mut self, volume: Volume) -> Self {
        self.restock_volume = volume.max(1);
        self
    }

    /// Reset the book to full ladders stepping outward from the given bests
    ///
    /// Bid levels that would reach zero or below are skipped.
    pub fn seed(&mut self, best_bid: Price, best_ask: Price, volume_per_level: Volume) {
        self.bids.clear();
        self.asks.clear();
        let bid = self.tick.quantize(best_bid.as_decimal());
        let ask = self.tick.quantize(best_ask.as_decimal());
        for depth in 0..self.max_depth() as i64 {
            let bid_price = self.tick.offset(bid, -depth);
            if bid_price.is_positive() {
                self.bids.add(bid_price, volume_per_level);
            }
            self.asks.add(self.tick.offset(ask, depth), volume_per_level);
        }
    }

    /// Apply any order, dispatching on its kind
    pub fn apply(&mut self, order: &Order) -> ApplyOutcome {
        match order.kind {
            OrderKind::Market => self.match_market(order),
            OrderKind::Limit { .. } => self.insert_limit(order),
            OrderKind::Cancel { .. } => self.cancel(order),
            OrderKind::Jump => self.apply_jump(order),
            OrderKind::Mid => self.apply_mid(order),
        }
    }

    /// Insert a limit order, matching any crossing volume first
    ///
    /// The remainder rests at the quantized price. If that pushes the side
    /// past `max_depth`, the worst level is evicted.
    pub fn insert_limit(&mut self, order: &Order) -> ApplyOutcome {
        let OrderKind::Limit { price } = order.kind else {
            return ApplyOutcome {
                discarded: order.volume,
                ..Default::default()
            };
        };
        let price = self.tick.quantize(price.as_decimal());
        if !price.is_positive() {
            return ApplyOutcome {
                discarded: order.volume,
                ..Default::default()
            };
        }

        let (fills, remaining) = self.sweep(order, Some(price));

        let own = self.ladder_mut(order.side);
        let evicted = own.add(price, remaining);
        let rested = if remaining > 0 && own.volume_at(price) > 0 {
            remaining
        } else {
            0
        };

        ApplyOutcome {
            fills,
            rested,
            evicted,
            ..Default::default()
        }
    }

    /// Withdraw resting volume from the referenced level, clamped at zero
    pub fn cancel(&mut self, order: &Order) -> ApplyOutcome {
        let OrderKind::Cancel { price } = order.kind else {
            return ApplyOutcome::default();
        };
        let price = self.tick.quantize(price.as_decimal());
        let cancelled = self.ladder_mut(order.side).reduce(price, order.volume);
        ApplyOutcome {
            cancelled,
            ..Default::default()
        }
    }

    /// Walk the opposite side best to worst until filled or empty
    ///
    /// Immediate-or-cancel: any remainder is discarded, never rested.
    pub fn match_market(&mut self, order: &Order) -> ApplyOutcome {
        let (fills, remaining) = self.sweep(order, None);
        ApplyOutcome {
            fills,
            discarded: remaining,
            ..Default::default()
        }
    }

    /// Execute a price shock, then replenish the side it consumed
    pub fn apply_jump(&mut self, order: &Order) -> ApplyOutcome {
        let mut outcome = self.match_market(order);
        outcome.restocked_levels = self.restock(order.side.opposite(), None);
        outcome
    }

    /// Cross against the opposite best level at the exact bid/ask midpoint
    ///
    /// Only the best level is touched; any remainder is discarded.
    pub fn apply_mid(&mut self, order: &Order) -> ApplyOutcome {
        let Some(mid) = self.mid_price() else {
            return ApplyOutcome {
                discarded: order.volume,
                ..Default::default()
            };
        };

        let taken = self.ladder_mut(order.side.opposite()).take_best(order.volume);
        let mut outcome = ApplyOutcome::default();
        let filled = match taken {
            Some((_, volume)) if volume > 0 => {
                outcome.fills.push(self.executor.execute(
                    order.id,
                    order.side,
                    mid,
                    volume,
                    FillSource::MIDPOINT,
                    order.timestamp,
                ));
                volume
            }
            _ => 0,
        };
        outcome.discarded = order.volume - filled;
        outcome
    }

    /// Refill `side` to `max_depth` levels at one-tick spacing
    ///
    /// New levels continue outward from the side's worst level; an empty side
    /// starts one tick away from the opposite best, or from `reference` when
    /// both sides are empty. Returns the number of levels added.
    pub fn restock(&mut self, side: Side, reference: Option<Price>) -> usize {
        let away: i64 = match side {
            Side::BUY => -1,
            Side::SELL => 1,
        };

        let start = match (self.ladder(side).worst_price(), self.ladder(side.opposite()).best_price()) {
            (Some(worst), _) => self.tick.offset(worst, away),
            (None, Some(opposite)) => self.tick.offset(opposite, away),
            (None, None) => {
                let Some(reference) = reference else {
                    return 0;
                };
                let floor = self.tick.floor(reference.as_decimal());
                match side {
                    Side::BUY => floor,
                    Side::SELL => self.tick.offset(floor, 1),
                }
            }
        };

        let volume = self.restock_volume;
        let tick = self.tick;
        let ladder = self.ladder_mut(side);
        let mut price = start;
        let mut added = 0;
        while !ladder.is_full() && price.is_positive() {
            ladder.add(price, volume);
            added += 1;
            price = tick.offset(price, away);
        }
        added
    }

    /// Replenish whichever sides are empty
    pub fn restock_empty_sides(&mut self, reference: Price) -> usize {
        let mut added = 0;
        for side in [Side::BUY, Side::SELL] {
            if self.ladder(side).is_empty() {
                added += self.restock(side, Some(reference));
            }
        }
        added
    }

    /// Verify the book invariants
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for ladder in [&self.bids, &self.asks] {
            let side = format!("{:?}", ladder.side());
            if ladder.len() > ladder.max_depth() {
                return Err(InvariantViolation::DepthExceeded {
                    side,
                    levels: ladder.len(),
                    max_depth: ladder.max_depth(),
                });
            }
            for (i, level) in ladder.levels().iter().enumerate() {
                if level.volume == 0 {
                    return Err(InvariantViolation::EmptyLevel {
                        side,
                        price: level.price.to_string(),
                    });
                }
                if !self.tick.is_aligned(level.price) {
                    return Err(InvariantViolation::OffGrid {
                        side,
                        price: level.price.to_string(),
                    });
                }
                if i > 0 && !ladder.is_better(ladder.levels()[i - 1].price, level.price) {
                    return Err(InvariantViolation::Unsorted {
                        side,
                        price: level.price.to_string(),
                    });
                }
            }
        }

        if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
            if is_crossed(Some(bid), Some(ask)) {
                return Err(InvariantViolation::CrossedBook {
                    bid: bid.to_string(),
                    ask: ask.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Get the best bid price
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    /// Get the best ask price
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Volume resting at the best bid
    pub fn best_bid_volume(&self) -> Volume {
        self.bids.best().map(|l| l.volume).unwrap_or(0)
    }

    /// Volume resting at the best ask
    pub fn best_ask_volume(&self) -> Volume {
        self.asks.best().map(|l| l.volume).unwrap_or(0)
    }

    /// Exact midpoint of the best prices
    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(Price::midpoint(bid, ask)),
            _ => None,
        }
    }

    /// Best ask minus best bid
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.as_decimal() - bid.as_decimal()),
            _ => None,
        }
    }

    /// Spread in whole ticks
    pub fn spread_ticks(&self) -> Option<i64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(self.tick.ticks_between(bid, ask)),
            _ => None,
        }
    }

    /// Bid ladder
    pub fn bids(&self) -> &Ladder {
        &self.bids
    }

    /// Ask ladder
    pub fn asks(&self) -> &Ladder {
        &self.asks
    }

    /// Ladder for a side
    pub fn ladder(&self, side: Side) -> &Ladder {
        match side {
            Side::BUY => &self.bids,
            Side::SELL => &self.asks,
        }
    }

    pub fn levels(&self, side: Side) -> &[PriceLevel] {
        self.ladder(side).levels()
    }

    /// Volume resting on one side across all levels
    pub fn total_volume(&self, side: Side) -> Volume {
        self.ladder(side).total_volume()
    }

    /// Get depth snapshot (top N price levels per side)
    pub fn depth_snapshot(&self, depth: usize) -> OrderBookSnapshot {
        OrderBookSnapshot {
            bids: self.bids.depth_snapshot(depth),
            asks: self.asks.depth_snapshot(depth),
        }
    }

    pub fn tick_size(&self) -> TickSize {
        self.tick
    }

    pub fn max_depth(&self) -> usize {
        self.bids.max_depth()
    }

    /// Executions recorded by this book
    pub fn executions(&self) -> u64 {
        self.executor.executions()
    }

    /// Executor shared with auction uncrossing so counts stay in one place
    pub fn executor_mut(&mut self) -> &mut MatchExecutor {
        &mut self.executor
    }

    fn ladder_mut(&mut self, side: Side) -> &mut Ladder {
        match side {
            Side::BUY => &mut self.bids,
            Side::SELL => &mut self.asks,
        }
    }

    /// Consume opposite-side levels within an optional limit
    fn sweep(&mut self, order: &Order, limit: Option<Price>) -> (Vec<Fill>, Volume) {
        let opposite = match order.side {
            Side::BUY => &mut self.asks,
            Side::SELL => &mut self.bids,
        };

        let mut fills = Vec::new();
        let mut remaining = order.volume;
        while remaining > 0 {
            let Some(best) = opposite.best_price() else {
                break;
            };
            if !within_limit(order.side, limit, best) {
                break;
            }
            let Some((price, taken)) = opposite.take_best(remaining) else {
                break;
            };
            remaining -= taken;
            fills.push(self.executor.execute(
                order.id,
                order.side,
                price,
                taken,
                FillSource::CONTINUOUS,
                order.timestamp,
            ));
        }
        (fills, remaining)
    }
}
