//! Fixed-depth price ladder for one side of the book
//!
//! Levels live in a small sorted array indexed by depth: index 0 is the
//! best price (highest bid, lowest ask). `max_depth` is small, so a linear
//! scan beats any tree here and keeps iteration order deterministic.

use types::numeric::{Price, Volume};
use types::order::Side;

use super::price_level::PriceLevel;

/// One side of a depth-limited book
#[derive(Debug, Clone)]
pub struct Ladder {
    side: Side,
    max_depth: usize,
    /// Sorted best to worst, never longer than `max_depth`
    levels: Vec<PriceLevel>,
}

impl Ladder {
    /// Create an empty ladder
    pub fn new(side: Side, max_depth: usize) -> Self {
        Self {
            side,
            max_depth,
            levels: Vec::with_capacity(max_depth.saturating_add(1)),
        }
    }

    /// Side this ladder belongs to
    pub fn side(&self) -> Side {
        self.side
    }

    /// Maximum number of visible levels
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether `a` is a strictly better price than `b` for this side
    pub fn is_better(&self, a: Price, b: Price) -> bool {
        better(self.side, a, b)
    }

    /// Add volume at `price`, creating the level if needed
    ///
    /// Returns the volume pushed off the visible ladder: either the evicted
    /// worst level, or the new volume itself when `price` ranks below every
    /// level of a full ladder.
    pub fn add(&mut self, price: Price, volume: Volume) -> Volume {
        if volume == 0 {
            return 0;
        }

        let side = self.side;
        let mut index = self.levels.len();
        for (i, level) in self.levels.iter_mut().enumerate() {
            if level.price == price {
                level.add(volume);
                return 0;
            }
            if better(side, price, level.price) {
                index = i;
                break;
            }
        }

        if index >= self.max_depth {
            return volume;
        }

        self.levels.insert(index, PriceLevel::new(price, volume));
        if self.levels.len() > self.max_depth {
            self.levels.pop().map(|evicted| evicted.volume).unwrap_or(0)
        } else {
            0
        }
    }

    /// Remove up to `volume` from the level at `price`
    ///
    /// Returns the volume actually removed (zero if no such level). The
    /// level is dropped once it reaches zero.
    pub fn reduce(&mut self, price: Price, volume: Volume) -> Volume {
        let Some(index) = self.levels.iter().position(|l| l.price == price) else {
            return 0;
        };
        let removed = self.levels[index].remove(volume);
        if self.levels[index].is_empty() {
            self.levels.remove(index);
        }
        removed
    }

    /// Consume up to `volume` from the best level
    ///
    /// Returns the level price and the volume taken, or None if empty.
    pub fn take_best(&mut self, volume: Volume) -> Option<(Price, Volume)> {
        let best = self.levels.first_mut()?;
        let price = best.price;
        let taken = best.remove(volume);
        if best.is_empty() {
            self.levels.remove(0);
        }
        Some((price, taken))
    }

    /// Best level (highest bid or lowest ask)
    pub fn best(&self) -> Option<&PriceLevel> {
        self.levels.first()
    }

    /// Best price
    pub fn best_price(&self) -> Option<Price> {
        self.levels.first().map(|l| l.price)
    }

    /// Worst visible price
    pub fn worst_price(&self) -> Option<Price> {
        self.levels.last().map(|l| l.price)
    }

    /// Volume resting at an exact price
    pub fn volume_at(&self, price: Price) -> Volume {
        self.levels
            .iter()
            .find(|l| l.price == price)
            .map(|l| l.volume)
            .unwrap_or(0)
    }

    /// Levels, best first
    pub fn levels(&self) -> &[PriceLevel] {
        &self.levels
    }

    /// Top `depth` levels as (price, volume) pairs
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Volume)> {
        self.levels
            .iter()
            .take(depth)
            .map(|l| (l.price, l.volume))
            .collect()
    }

    /// Total visible volume on this side
    pub fn total_volume(&self) -> Volume {
        self.levels.iter().map(|l| l.volume).sum()
    }

    /// Number of price levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Whether every visible slot is taken
    pub fn is_full(&self) -> bool {
        self.levels.len() >= self.max_depth
    }

    /// Drop every level
    pub fn clear(&mut self) {
        self.levels.clear();
    }
}

fn better(side: Side, a: Price, b: Price) -> bool {
    match side {
        Side::BUY => a > b,
        Side::SELL => a < b,
    }
}
