//! Open/close auction window state machine
//!
//! `PreOpen -> OpenAuction -> Continuous -> CloseAuction -> Closed`
//!
//! Phases are a function of clock time only. While an auction phase is
//! active, priced and unpriced orders are queued in arrival order; cancels
//! still withdraw resting liquidity immediately. Leaving an auction phase
//! uncrosses the whole queue at one price and drops whatever is left.

use std::fmt;

use matching_engine::matching::auction::{uncross, AuctionInterest};
use matching_engine::{ApplyOutcome, AuctionOutcome, LimitOrderBook};
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::errors::ConfigError;
use types::numeric::Price;
use types::order::{Order, OrderKind, Side};

/// Trading phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "PRE_OPEN")]
    PreOpen,
    #[serde(rename = "OPEN_AUCTION")]
    OpenAuction,
    #[serde(rename = "CONTINUOUS")]
    Continuous,
    #[serde(rename = "CLOSE_AUCTION")]
    CloseAuction,
    #[serde(rename = "CLOSED")]
    Closed,
}

impl Phase {
    /// Whether orders are queued rather than matched
    pub fn is_auction(&self) -> bool {
        matches!(self, Phase::OpenAuction | Phase::CloseAuction)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::PreOpen => "PRE_OPEN",
            Phase::OpenAuction => "OPEN_AUCTION",
            Phase::Continuous => "CONTINUOUS",
            Phase::CloseAuction => "CLOSE_AUCTION",
            Phase::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a routed order went
#[derive(Debug, Clone, PartialEq)]
pub enum Routing {
    /// Applied to the book straight away
    Applied(ApplyOutcome),
    /// Held for the next auction uncross
    Queued,
    /// Arrived outside the session
    Dropped,
}

/// Gates order flow between the auction queue and the book
#[derive(Debug, Clone)]
pub struct AuctionWindowController {
    start_time: i64,
    end_time: i64,
    open_end: i64,
    close_start: i64,
    phase: Phase,
    queue: Vec<Order>,
    clearings: u64,
}

impl AuctionWindowController {
    /// Windows are in milliseconds; together they must fit the session
    pub fn new(start_time: i64, end_time: i64, open_window_ms: i64, close_window_ms: i64) -> Result<Self, ConfigError> {
        let horizon_ms = end_time.checked_sub(start_time).unwrap_or(0);
        if horizon_ms <= 0 {
            return Err(ConfigError::invalid("end_time", "session has no duration"));
        }
        if open_window_ms < 0 || close_window_ms < 0 {
            return Err(ConfigError::invalid("open_window", "auction windows must not be negative"));
        }
        let windows_ms = open_window_ms.checked_add(close_window_ms);
        if windows_ms.map_or(true, |total| total > horizon_ms) {
            return Err(ConfigError::AuctionOverlap {
                open_ms: open_window_ms,
                close_ms: close_window_ms,
                horizon_ms,
            });
        }
        Ok(Self {
            start_time,
            end_time,
            open_end: start_time + open_window_ms,
            close_start: end_time - close_window_ms,
            phase: Phase::PreOpen,
            queue: Vec::new(),
            clearings: 0,
        })
    }

    /// Phase in force at time `t`
    pub fn phase_at(&self, t: i64) -> Phase {
        if t < self.start_time {
            Phase::PreOpen
        } else if t >= self.end_time {
            Phase::Closed
        } else if t < self.open_end {
            Phase::OpenAuction
        } else if t >= self.close_start {
            Phase::CloseAuction
        } else {
            Phase::Continuous
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Orders waiting for the current auction
    pub fn queued(&self) -> &[Order] {
        &self.queue
    }

    /// Auctions uncrossed so far, including ones that matched nothing
    pub fn clearings(&self) -> u64 {
        self.clearings
    }

    /// Move to the phase in force at `t`
    ///
    /// Leaving an auction phase uncrosses its queue against `reference`;
    /// the outcome is returned.
    pub fn advance_to(&mut self, t: i64, book: &mut LimitOrderBook, reference: Price) -> Option<AuctionOutcome> {
        let next = self.phase_at(t);
        if next == self.phase {
            return None;
        }

        let outcome = if self.phase.is_auction() {
            Some(self.clear(t, book, reference))
        } else {
            None
        };

        debug!(from = %self.phase, to = %next, time = t, "Phase transition");
        self.phase = next;
        outcome
    }

    /// Queue or apply one order according to the current phase
    pub fn route(&mut self, order: Order, book: &mut LimitOrderBook) -> Routing {
        match self.phase {
            Phase::Continuous => Routing::Applied(book.apply(&order)),
            Phase::OpenAuction | Phase::CloseAuction => {
                if matches!(order.kind, OrderKind::Cancel { .. }) {
                    Routing::Applied(book.cancel(&order))
                } else {
                    self.queue.push(order);
                    Routing::Queued
                }
            }
            Phase::PreOpen | Phase::Closed => Routing::Dropped,
        }
    }

    /// Uncross and empty the queue
    fn clear(&mut self, t: i64, book: &mut LimitOrderBook, reference: Price) -> AuctionOutcome {
        let queue = std::mem::take(&mut self.queue);
        let tick = book.tick_size();
        let mid = book.mid_price();

        let interest: Vec<AuctionInterest> = queue
            .iter()
            .filter_map(|order| {
                let limit = match order.kind {
                    OrderKind::Limit { price } => Some(tick.quantize(price.as_decimal())),
                    OrderKind::Mid => mid.map(|m| match order.side {
                        Side::BUY => tick.floor(m.as_decimal()),
                        Side::SELL => tick.ceil(m.as_decimal()),
                    }),
                    OrderKind::Market | OrderKind::Jump => None,
                    OrderKind::Cancel { .. } => return None,
                };
                Some(AuctionInterest {
                    order_id: order.id,
                    side: order.side,
                    limit,
                    volume: order.volume,
                })
            })
            .collect();

        let reference = tick.quantize(reference.as_decimal());
        let outcome = uncross(&interest, reference, t, book.executor_mut());
        self.clearings += 1;

        debug!(
            phase = %self.phase,
            queued = queue.len(),
            clearing_price = ?outcome.clearing_price.map(|p| p.to_string()),
            matched = outcome.matched_volume,
            residual_buy = outcome.residual_buy_volume,
            residual_sell = outcome.residual_sell_volume,
            "Auction uncrossed"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::OrderId;
    use types::numeric::TickSize;

    fn p(s: &str) -> Price {
        s.parse().unwrap()
    }

    fn book() -> LimitOrderBook {
        let mut book = LimitOrderBook::new(TickSize::from_f64(0.01).unwrap(), 5).with_restock_volume(10);
        book.seed(p("100.00"), p("100.01"), 10);
        book
    }

    fn controller() -> AuctionWindowController {
        // 1s open auction, 1s close auction, 10s session
        AuctionWindowController::new(0, 10_000, 1_000, 1_000).unwrap()
    }

    #[test]
    fn test_phase_schedule() {
        let c = controller();
        assert_eq!(c.phase_at(-1), Phase::PreOpen);
        assert_eq!(c.phase_at(0), Phase::OpenAuction);
        assert_eq!(c.phase_at(999), Phase::OpenAuction);
        assert_eq!(c.phase_at(1_000), Phase::Continuous);
        assert_eq!(c.phase_at(8_999), Phase::Continuous);
        assert_eq!(c.phase_at(9_000), Phase::CloseAuction);
        assert_eq!(c.phase_at(9_999), Phase::CloseAuction);
        assert_eq!(c.phase_at(10_000), Phase::Closed);
    }

    #[test]
    fn test_zero_windows_skip_auctions() {
        let c = AuctionWindowController::new(0, 10_000, 0, 0).unwrap();
        assert_eq!(c.phase_at(0), Phase::Continuous);
        assert_eq!(c.phase_at(9_999), Phase::Continuous);
        assert_eq!(c.phase_at(10_000), Phase::Closed);
    }

    #[test]
    fn test_overlapping_windows_rejected() {
        let err = AuctionWindowController::new(0, 1_000, 600, 600).unwrap_err();
        assert!(matches!(err, ConfigError::AuctionOverlap { .. }));

        let err = AuctionWindowController::new(0, i64::MAX, i64::MAX, i64::MAX).unwrap_err();
        assert!(matches!(err, ConfigError::AuctionOverlap { .. }));
        assert!(AuctionWindowController::new(i64::MIN, i64::MAX, 0, 0).is_err());
    }

    #[test]
    fn test_orders_queued_during_auction() {
        let mut c = controller();
        let mut book = book();
        c.advance_to(0, &mut book, p("100.00"));
        assert_eq!(c.phase(), Phase::OpenAuction);

        let routed = c.route(Order::market(OrderId::new(1), Side::BUY, 5, 10), &mut book);
        assert_eq!(routed, Routing::Queued);
        assert_eq!(c.queued().len(), 1);
        // Book untouched
        assert_eq!(book.best_ask_volume(), 10);
    }

    #[test]
    fn test_cancels_apply_during_auction() {
        let mut c = controller();
        let mut book = book();
        c.advance_to(0, &mut book, p("100.00"));

        let routed = c.route(Order::cancel(OrderId::new(1), Side::BUY, p("100.00"), 4, 10), &mut book);
        match routed {
            Routing::Applied(outcome) => assert_eq!(outcome.cancelled, 4),
            other => panic!("expected cancel to apply, got {:?}", other),
        }
        assert!(c.queued().is_empty());
        assert_eq!(book.best_bid_volume(), 6);
    }

    #[test]
    fn test_continuous_orders_apply() {
        let mut c = controller();
        let mut book = book();
        c.advance_to(0, &mut book, p("100.00"));
        c.advance_to(1_000, &mut book, p("100.00"));
        assert_eq!(c.phase(), Phase::Continuous);

        match c.route(Order::market(OrderId::new(1), Side::BUY, 4, 1_000), &mut book) {
            Routing::Applied(outcome) => assert_eq!(outcome.filled(), 4),
            other => panic!("expected market order to apply, got {:?}", other),
        }
    }

    #[test]
    fn test_leaving_auction_uncrosses_queue() {
        let mut c = controller();
        let mut book = book();
        c.advance_to(0, &mut book, p("100.5"));

        c.route(Order::limit(OrderId::new(1), Side::BUY, p("101"), 50, 1), &mut book);
        c.route(Order::limit(OrderId::new(2), Side::BUY, p("100"), 30, 2), &mut book);
        c.route(Order::limit(OrderId::new(3), Side::SELL, p("100"), 40, 3), &mut book);
        c.route(Order::limit(OrderId::new(4), Side::SELL, p("101"), 20, 4), &mut book);

        let outcome = c.advance_to(1_000, &mut book, p("100.5")).unwrap();
        assert_eq!(outcome.clearing_price, Some(p("101")));
        assert_eq!(outcome.matched_volume, 50);
        assert!(c.queued().is_empty());
        assert_eq!(c.clearings(), 1);
        // Auction interest never rests on the book
        assert_eq!(book.best_bid(), Some(p("100.00")));
        assert_eq!(book.best_bid_volume(), 10);
    }

    #[test]
    fn test_residual_discarded() {
        let mut c = controller();
        let mut book = book();
        c.advance_to(0, &mut book, p("100.00"));
        c.route(Order::limit(OrderId::new(1), Side::BUY, p("99.00"), 7, 1), &mut book);

        let outcome = c.advance_to(1_000, &mut book, p("100.00")).unwrap();
        assert!(!outcome.has_trades());
        assert_eq!(outcome.residual_buy_volume, 7);
        assert!(c.queued().is_empty());
        assert_eq!(book.bids().volume_at(p("99.00")), 0);
    }

    #[test]
    fn test_mid_orders_priced_at_book_mid() {
        let mut c = controller();
        let mut book = book();
        c.advance_to(0, &mut book, p("100.00"));
        // Mid 100.005: buy prices at 100.00, sell at 100.01, so they do not cross
        c.route(Order::mid(OrderId::new(1), Side::BUY, 5, 1), &mut book);
        c.route(Order::mid(OrderId::new(2), Side::SELL, 5, 2), &mut book);

        let outcome = c.advance_to(1_000, &mut book, p("100.00")).unwrap();
        assert!(!outcome.has_trades());

        // A market sell crosses the priced mid buy
        c.advance_to(9_000, &mut book, p("100.00"));
        c.route(Order::mid(OrderId::new(3), Side::BUY, 5, 9_001), &mut book);
        c.route(Order::market(OrderId::new(4), Side::SELL, 3, 9_002), &mut book);
        let outcome = c.advance_to(10_000, &mut book, p("100.00")).unwrap();
        assert_eq!(outcome.clearing_price, Some(p("100.00")));
        assert_eq!(outcome.matched_volume, 3);
        assert_eq!(c.phase(), Phase::Closed);
    }

    #[test]
    fn test_market_only_queue_clears_at_reference() {
        let mut c = controller();
        let mut book = book();
        c.advance_to(0, &mut book, p("100.00"));
        c.route(Order::market(OrderId::new(1), Side::BUY, 5, 1), &mut book);
        c.route(Order::jump(OrderId::new(2), Side::SELL, 8, 2), &mut book);

        let outcome = c.advance_to(1_000, &mut book, p("100.004")).unwrap();
        assert_eq!(outcome.clearing_price, Some(p("100.00")));
        assert_eq!(outcome.matched_volume, 5);
        assert_eq!(outcome.residual_sell_volume, 3);
    }

    #[test]
    fn test_orders_dropped_outside_session() {
        let mut c = controller();
        let mut book = book();
        assert_eq!(c.phase(), Phase::PreOpen);
        assert_eq!(c.route(Order::market(OrderId::new(1), Side::BUY, 5, -1), &mut book), Routing::Dropped);
    }

    #[test]
    fn test_no_transition_no_outcome() {
        let mut c = controller();
        let mut book = book();
        assert!(c.advance_to(0, &mut book, p("100.00")).is_none());
        assert!(c.advance_to(500, &mut book, p("100.00")).is_none());
        assert_eq!(c.clearings(), 0);
    }
}
