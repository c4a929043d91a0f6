//! Price compatibility between the two sides
//!
//! An unpriced order (market, jump, or limit-less auction interest) crosses
//! every resting price.

use types::numeric::Price;
use types::order::Side;

/// Best bid at or above best ask; a one-sided book is never crossed
pub fn is_crossed(best_bid: Option<Price>, best_ask: Option<Price>) -> bool {
    matches!((best_bid, best_ask), (Some(bid), Some(ask)) if bid >= ask)
}

/// Whether an order on `side` limited at `limit` can trade at `resting`
pub fn within_limit(side: Side, limit: Option<Price>, resting: Price) -> bool {
    match (side, limit) {
        (_, None) => true,
        (Side::BUY, Some(limit)) => resting <= limit,
        (Side::SELL, Some(limit)) => resting >= limit,
    }
}
