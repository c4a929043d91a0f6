//! Aggregated price level
//!
//! A level is just a price and the total volume resting there. Individual
//! orders are not tracked: the simulator only needs the visible ladder.

use serde::{Deserialize, Serialize};
use types::numeric::{Price, Volume};

/// Resting volume at one tick-aligned price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    pub volume: Volume,
}

impl PriceLevel {
    /// Create a level with initial volume
    pub fn new(price: Price, volume: Volume) -> Self {
        Self { price, volume }
    }

    /// Add resting volume
    pub fn add(&mut self, volume: Volume) {
        self.volume = self.volume.saturating_add(volume);
    }

    /// Remove up to `volume`, never going below zero
    ///
    /// Returns the volume actually removed
    pub fn remove(&mut self, volume: Volume) -> Volume {
        let removed = volume.min(self.volume);
        self.volume -= removed;
        removed
    }

    /// Check if the level has been exhausted
    pub fn is_empty(&self) -> bool {
        self.volume == 0
    }
}
