//! Outcome of applying one order to the book
//!
//! Every book operation reports what happened to the order's volume so the
//! caller can check conservation and feed run metrics.

use serde::{Deserialize, Serialize};
use types::fill::{filled_volume, Fill};
use types::numeric::Volume;

/// What an applied order did to the book
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// Executions in the order they happened
    pub fills: Vec<Fill>,
    /// Volume left resting on the ladder
    pub rested: Volume,
    /// Resting volume withdrawn by a cancel
    pub cancelled: Volume,
    /// Volume pushed off the visible ladder by depth limits
    pub evicted: Volume,
    /// Unfilled remainder of an immediate-or-cancel order
    pub discarded: Volume,
    /// Levels added by liquidity replenishment
    pub restocked_levels: usize,
}

impl ApplyOutcome {
    /// Total filled volume
    pub fn filled(&self) -> Volume {
        filled_volume(&self.fills)
    }

    /// Check if any volume executed
    pub fn has_fills(&self) -> bool {
        !self.fills.is_empty()
    }
}
