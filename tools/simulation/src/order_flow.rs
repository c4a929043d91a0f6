//! Synthetic order flow
//!
//! Each tick, every enabled order kind draws a Poisson event count with
//! mean `rate * tick_seconds`. Volumes are geometric on {1, 2, ...} with the
//! configured mean. Limit orders land `k - 1` ticks behind the innermost
//! passive price on their own side, with `k` weighted 1/k toward the inside.
//! Cancels target resting levels in proportion to their volume.
//!
//! Draft events are produced in a fixed kind order, shuffled, then stamped
//! with ids and sorted arrival times spread across the tick.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Exp, Poisson};
use serde::{Deserialize, Serialize};
use types::errors::ConfigError;
use types::ids::OrderSequence;
use types::numeric::{Price, TickSize, Volume};
use types::order::{Order, OrderKind, Side};

use matching_engine::LimitOrderBook;

use crate::config::ValidatedConfig;

/// Which optional order kinds may be generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowFlags {
    pub allow_market_orders: bool,
    pub allow_cancel_orders: bool,
    pub allow_mid_orders: bool,
}

impl Default for FlowFlags {
    fn default() -> Self {
        Self {
            allow_market_orders: true,
            allow_cancel_orders: true,
            allow_mid_orders: false,
        }
    }
}

/// Arrival rates (per second) and mean volumes per order kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowRates {
    pub market_order_rate: f64,
    pub limit_order_rate: f64,
    pub cancel_order_rate: f64,
    pub jump_rate: f64,
    pub mid_order_fraction: f64,
    pub market_volume_rate: f64,
    pub limit_volume_rate: f64,
    pub cancel_volume_rate: f64,
    pub jump_volume_rate: f64,
}

impl FlowRates {
    pub fn from_config(config: &ValidatedConfig) -> Self {
        let raw = &config.raw;
        Self {
            market_order_rate: raw.market_order_rate,
            limit_order_rate: raw.limit_order_rate,
            cancel_order_rate: raw.cancel_order_rate,
            jump_rate: raw.jump_rate,
            mid_order_fraction: raw.mid_order_fraction,
            market_volume_rate: raw.market_volume_rate,
            limit_volume_rate: raw.limit_volume_rate,
            cancel_volume_rate: raw.cancel_volume_rate,
            jump_volume_rate: raw.jump_volume_rate,
        }
    }
}

/// Order before it gets an id and timestamp
#[derive(Debug, Clone, Copy)]
struct Draft {
    side: Side,
    kind: OrderKind,
    volume: Volume,
}

/// Samples synthetic orders tick by tick
#[derive(Debug, Clone)]
pub struct OrderFlowGenerator {
    rates: FlowRates,
    tick: TickSize,
    max_depth: usize,
    /// Weight 1/k on placing a limit order k - 1 ticks behind the reference
    depth_weights: WeightedIndex<f64>,
    ids: OrderSequence,
}

impl OrderFlowGenerator {
    pub fn new(rates: FlowRates, tick: TickSize, max_depth: usize) -> Result<Self, ConfigError> {
        let weights: Vec<f64> = (1..=max_depth).map(|k| 1.0 / k as f64).collect();
        let depth_weights =
            WeightedIndex::new(weights).map_err(|e| ConfigError::invalid("max_depth", e.to_string()))?;
        Ok(Self {
            rates,
            tick,
            max_depth,
            depth_weights,
            ids: OrderSequence::default(),
        })
    }

    pub fn from_config(config: &ValidatedConfig) -> Result<Self, ConfigError> {
        Self::new(FlowRates::from_config(config), config.tick, config.raw.max_depth)
    }

    /// Orders issued so far
    pub fn issued(&self) -> u64 {
        self.ids.issued()
    }

    /// Sample the orders arriving in `[tick_start, tick_start + tick_duration_ms)`
    ///
    /// `reference_mid` is the unrounded reference price. `flow` drives
    /// counts, sides, volumes and prices; `shuffle` only drives the arrival
    /// order. Timestamps are non-decreasing in the returned order.
    pub fn generate<R: Rng + ?Sized, S: Rng + ?Sized>(
        &mut self,
        tick_start: i64,
        tick_duration_ms: i64,
        reference_mid: Price,
        flags: &FlowFlags,
        book: &LimitOrderBook,
        flow: &mut R,
        shuffle: &mut S,
    ) -> Vec<Order> {
        if tick_duration_ms <= 0 {
            return Vec::new();
        }
        let seconds = tick_duration_ms as f64 / 1000.0;
        let rates = self.rates;
        let mut drafts = Vec::new();

        if flags.allow_market_orders {
            for _ in 0..poisson_count(rates.market_order_rate * seconds, flow) {
                drafts.push(Draft {
                    side: random_side(flow),
                    kind: OrderKind::Market,
                    volume: geometric_volume(rates.market_volume_rate, flow),
                });
            }
        }

        for _ in 0..poisson_count(rates.limit_order_rate * seconds, flow) {
            let side = random_side(flow);
            let volume = geometric_volume(rates.limit_volume_rate, flow);
            let depth = self.depth_weights.sample(flow) as i64;
            if let Some(price) = self.limit_price(side, reference_mid, book, depth) {
                drafts.push(Draft {
                    side,
                    kind: OrderKind::Limit { price },
                    volume,
                });
            }
        }

        if flags.allow_cancel_orders {
            for _ in 0..poisson_count(rates.cancel_order_rate * seconds, flow) {
                let side = random_side(flow);
                let volume = geometric_volume(rates.cancel_volume_rate, flow);
                if let Some(draft) = cancel_target(book, side, volume, flow) {
                    drafts.push(draft);
                }
            }
        }

        if flags.allow_mid_orders {
            let rate = rates.market_order_rate * rates.mid_order_fraction;
            for _ in 0..poisson_count(rate * seconds, flow) {
                drafts.push(Draft {
                    side: random_side(flow),
                    kind: OrderKind::Mid,
                    volume: geometric_volume(rates.market_volume_rate, flow),
                });
            }
        }

        for _ in 0..poisson_count(rates.jump_rate * seconds, flow) {
            drafts.push(Draft {
                side: random_side(flow),
                kind: OrderKind::Jump,
                volume: geometric_volume(rates.jump_volume_rate, flow),
            });
        }

        drafts.shuffle(shuffle);

        let mut offsets: Vec<i64> = drafts
            .iter()
            .map(|_| shuffle.gen_range(0..tick_duration_ms))
            .collect();
        offsets.sort_unstable();

        drafts
            .into_iter()
            .zip(offsets)
            .map(|(draft, offset)| {
                Order::new(
                    self.ids.next_id(),
                    draft.side,
                    draft.kind,
                    draft.volume,
                    tick_start + offset,
                )
            })
            .collect()
    }

    /// Buys go strictly below the mid, sells strictly above, and neither
    /// crosses the opposite best, so limit flow only adds liquidity
    fn limit_price(&self, side: Side, reference_mid: Price, book: &LimitOrderBook, depth: i64) -> Option<Price> {
        debug_assert!((depth as usize) < self.max_depth);
        let mid = reference_mid.as_decimal();
        let price = match side {
            Side::BUY => {
                let below_mid = self.tick.offset(self.tick.ceil(mid), -1);
                let inside = match book.best_ask() {
                    Some(ask) => below_mid.min(self.tick.offset(ask, -1)),
                    None => below_mid,
                };
                self.tick.offset(inside, -depth)
            }
            Side::SELL => {
                let above_mid = self.tick.offset(self.tick.floor(mid), 1);
                let inside = match book.best_bid() {
                    Some(bid) => above_mid.max(self.tick.offset(bid, 1)),
                    None => above_mid,
                };
                self.tick.offset(inside, depth)
            }
        };
        price.is_positive().then_some(price)
    }
}

/// Poisson draw; zero for a non-positive mean
pub fn poisson_count<R: Rng + ?Sized>(mean: f64, rng: &mut R) -> u64 {
    if !(mean > 0.0) {
        return 0;
    }
    match Poisson::new(mean) {
        Ok(dist) => {
            let draw: f64 = dist.sample(rng);
            draw as u64
        }
        Err(_) => 0,
    }
}

/// Geometric draw on {1, 2, ...} with the given mean
///
/// `ceil(Exp(lambda))` with `lambda = -ln(1 - 1/mean)` is geometric with
/// success probability `1/mean`. Means at or below one always give 1.
pub fn geometric_volume<R: Rng + ?Sized>(mean: f64, rng: &mut R) -> Volume {
    if !(mean > 1.0) {
        return 1;
    }
    let lambda = -(1.0 - 1.0 / mean).ln();
    match Exp::new(lambda) {
        Ok(dist) => {
            let draw: f64 = dist.sample(rng);
            (draw.ceil() as Volume).max(1)
        }
        Err(_) => 1,
    }
}

fn random_side<R: Rng + ?Sized>(rng: &mut R) -> Side {
    if rng.gen_bool(0.5) {
        Side::BUY
    } else {
        Side::SELL
    }
}

/// Level on `side` picked in proportion to resting volume, with the cancel clamped to it
fn cancel_target<R: Rng + ?Sized>(book: &LimitOrderBook, side: Side, volume: Volume, rng: &mut R) -> Option<Draft> {
    let levels = book.ladder(side).levels();
    let weights: Vec<Volume> = levels.iter().map(|l| l.volume).collect();
    let index = WeightedIndex::new(&weights).ok()?.sample(rng);
    let level = levels.get(index)?;
    Some(Draft {
        side,
        kind: OrderKind::Cancel { price: level.price },
        volume: volume.min(level.volume),
    })
}
