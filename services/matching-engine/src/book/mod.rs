//! Order book infrastructure module
//!
//! Contains price levels and the fixed-depth ladder used for both sides.

pub mod price_level;
pub mod ladder;

pub use price_level::PriceLevel;
pub use ladder::Ladder;
