//! Single-price auction uncrossing
//!
//! Opening and closing auctions collect interest without matching, then
//! uncross everything at one clearing price:
//!
//! 1. Candidate prices are the distinct limit prices in the queue (the
//!    reference price alone when nothing is priced)
//! 2. Executable volume at a candidate is min(demand, supply), where demand
//!    counts buys willing to pay at least that price and supply counts sells
//!    willing to accept at most that price; unpriced interest crosses anywhere
//! 3. The candidate with the most executable volume wins; ties go to the
//!    price closest to the reference, then to the lower price
//!
//! Matched volume is allocated by price priority, then queue order. Residual
//! interest is dropped by the caller.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use types::fill::{Fill, FillSource};
use types::ids::OrderId;
use types::numeric::{Price, Volume};
use types::order::Side;

use super::crossing::within_limit;
use super::executor::MatchExecutor;

/// One queued order as seen by the auction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionInterest {
    pub order_id: OrderId,
    pub side: Side,
    /// None for market-style interest that accepts any price
    pub limit: Option<Price>,
    pub volume: Volume,
}

impl AuctionInterest {
    /// Whether this interest executes at `price`
    pub fn crosses_at(&self, price: Price) -> bool {
        within_limit(self.side, self.limit, price)
    }
}

/// Result of uncrossing one auction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuctionOutcome {
    /// None when nothing crossed
    pub clearing_price: Option<Price>,
    pub matched_volume: Volume,
    pub fills: Vec<Fill>,
    pub residual_buy_volume: Volume,
    pub residual_sell_volume: Volume,
}

impl AuctionOutcome {
    /// Check if any volume executed
    pub fn has_trades(&self) -> bool {
        self.matched_volume > 0
    }
}

/// Buy volume willing to trade at `price`
pub fn demand_at(interest: &[AuctionInterest], price: Price) -> Volume {
    interest
        .iter()
        .filter(|i| i.side == Side::BUY && i.crosses_at(price))
        .map(|i| i.volume)
        .sum()
}

/// Sell volume willing to trade at `price`
pub fn supply_at(interest: &[AuctionInterest], price: Price) -> Volume {
    interest
        .iter()
        .filter(|i| i.side == Side::SELL && i.crosses_at(price))
        .map(|i| i.volume)
        .sum()
}

/// Find the volume-maximizing clearing price
///
/// Returns the price and the volume executable there, or None if no
/// candidate has both demand and supply.
pub fn clearing_price(interest: &[AuctionInterest], reference: Price) -> Option<(Price, Volume)> {
    let mut candidates: Vec<Price> = interest.iter().filter_map(|i| i.limit).collect();
    if candidates.is_empty() {
        candidates.push(reference);
    }
    candidates.sort();
    candidates.dedup();

    let distance = |p: Price| (p.as_decimal() - reference.as_decimal()).abs();

    let mut best: Option<(Price, Volume)> = None;
    for price in candidates {
        let matched = demand_at(interest, price).min(supply_at(interest, price));
        if matched == 0 {
            continue;
        }
        // Candidates ascend, so equal distance keeps the lower price
        let replace = match best {
            None => true,
            Some((best_price, best_volume)) => {
                matched > best_volume
                    || (matched == best_volume && distance(price) < distance(best_price))
            }
        };
        if replace {
            best = Some((price, matched));
        }
    }
    best
}

/// Uncross the queued interest at a single price
pub fn uncross(
    interest: &[AuctionInterest],
    reference: Price,
    timestamp: i64,
    executor: &mut MatchExecutor,
) -> AuctionOutcome {
    let total_buy: Volume = side_volume(interest, Side::BUY);
    let total_sell: Volume = side_volume(interest, Side::SELL);

    let Some((price, matched)) = clearing_price(interest, reference) else {
        return AuctionOutcome {
            residual_buy_volume: total_buy,
            residual_sell_volume: total_sell,
            ..Default::default()
        };
    };

    let buys = prioritized(interest, Side::BUY, price);
    let sells = prioritized(interest, Side::SELL, price);

    let mut fills = Vec::new();
    let mut remaining = matched;
    let (mut bi, mut si) = (0, 0);
    let mut buy_left = buys.first().map(|b| b.volume).unwrap_or(0);
    let mut sell_left = sells.first().map(|s| s.volume).unwrap_or(0);

    while remaining > 0 && bi < buys.len() && si < sells.len() {
        let qty = remaining.min(buy_left).min(sell_left);
        fills.push(executor.execute(
            buys[bi].order_id,
            Side::BUY,
            price,
            qty,
            FillSource::AUCTION,
            timestamp,
        ));
        remaining -= qty;
        buy_left -= qty;
        sell_left -= qty;

        if buy_left == 0 {
            bi += 1;
            buy_left = buys.get(bi).map(|b| b.volume).unwrap_or(0);
        }
        if sell_left == 0 {
            si += 1;
            sell_left = sells.get(si).map(|s| s.volume).unwrap_or(0);
        }
    }

    AuctionOutcome {
        clearing_price: Some(price),
        matched_volume: matched,
        fills,
        residual_buy_volume: total_buy - matched,
        residual_sell_volume: total_sell - matched,
    }
}

fn side_volume(interest: &[AuctionInterest], side: Side) -> Volume {
    interest.iter().filter(|i| i.side == side).map(|i| i.volume).sum()
}

/// Eligible interest for one side, most aggressive first, queue order within
fn prioritized(interest: &[AuctionInterest], side: Side, price: Price) -> Vec<AuctionInterest> {
    let mut eligible: Vec<AuctionInterest> = interest
        .iter()
        .filter(|i| i.side == side && i.volume > 0 && i.crosses_at(price))
        .copied()
        .collect();

    eligible.sort_by(|a, b| match (a.limit, b.limit) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => match side {
            Side::BUY => y.cmp(&x),
            Side::SELL => x.cmp(&y),
        },
    });
    eligible
}
