//! Fill construction
//!
//! Builds `Fill` records and keeps a running execution count so the book
//! can report how many fills it produced over a run.

use types::fill::{Fill, FillSource};
use types::ids::OrderId;
use types::numeric::{Price, Volume};
use types::order::Side;

/// Fill builder with an execution counter
#[derive(Debug, Clone, Default)]
pub struct MatchExecutor {
    executions: u64,
    volume: Volume,
}

impl MatchExecutor {
    /// Create a new executor
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one execution
    pub fn execute(
        &mut self,
        order_id: OrderId,
        aggressor: Side,
        price: Price,
        volume: Volume,
        source: FillSource,
        timestamp: i64,
    ) -> Fill {
        debug_assert!(volume > 0, "zero-volume fill");
        self.executions += 1;
        self.volume += volume;
        Fill {
            order_id,
            aggressor,
            price,
            volume,
            source,
            timestamp,
        }
    }

    /// Number of executions recorded so far
    pub fn executions(&self) -> u64 {
        self.executions
    }

    /// Total executed volume so far
    pub fn executed_volume(&self) -> Volume {
        self.volume
    }
}
