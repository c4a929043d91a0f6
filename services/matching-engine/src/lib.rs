//! Limit order book for the synthetic market simulator
//!
//! A depth-limited, price-level aggregated book. Each side is a small sorted
//! ladder of at most `max_depth` levels; volume pushed past the last level is
//! lost to the visible book.
//!
//! **Key Invariants:**
//! - Best bid strictly below best ask after every operation
//! - No level holds zero volume
//! - Each side holds at most `max_depth` levels, sorted best to worst
//! - Conservation of volume: filled + discarded == requested for market orders

pub mod book;
pub mod matching;
pub mod engine;
pub mod events;

pub use book::{Ladder, PriceLevel};
pub use engine::{LimitOrderBook, OrderBookSnapshot};
pub use events::ApplyOutcome;
pub use matching::auction::{AuctionInterest, AuctionOutcome};
