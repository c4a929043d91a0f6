//! Discrete simulation clock
//!
//! Time moves forward by exactly `timestep_ms` per tick. When the horizon is
//! not a whole number of steps the last tick is shortened to end exactly at
//! `end_time`.

use serde::{Deserialize, Serialize};

/// One clock tick: `[start, start + duration_ms)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub index: u64,
    pub start: i64,
    pub duration_ms: i64,
}

impl Tick {
    pub fn end(&self) -> i64 {
        self.start + self.duration_ms
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationClock {
    start_time: i64,
    end_time: i64,
    timestep_ms: i64,
    current_time: i64,
    ticks: u64,
}

impl SimulationClock {
    pub fn new(start_time: i64, end_time: i64, timestep_ms: i64) -> Self {
        Self {
            start_time,
            end_time,
            timestep_ms: timestep_ms.max(1),
            current_time: start_time,
            ticks: 0,
        }
    }

    pub fn current_time(&self) -> i64 {
        self.current_time
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn end_time(&self) -> i64 {
        self.end_time
    }

    pub fn timestep_ms(&self) -> i64 {
        self.timestep_ms
    }

    /// Ticks handed out so far
    pub fn ticks_elapsed(&self) -> u64 {
        self.ticks
    }

    /// Whether the terminal time has been reached
    pub fn is_finished(&self) -> bool {
        self.current_time >= self.end_time
    }

    /// Total ticks in the horizon, counting a final partial tick
    pub fn total_ticks(&self) -> u64 {
        let span = self.end_time.saturating_sub(self.start_time).max(0);
        (span / self.timestep_ms + i64::from(span % self.timestep_ms != 0)) as u64
    }

    /// Hand out the next tick and move time to its end
    pub fn next_tick(&mut self) -> Option<Tick> {
        if self.is_finished() {
            return None;
        }
        let duration_ms = self.timestep_ms.min(self.end_time - self.current_time);
        let tick = Tick {
            index: self.ticks,
            start: self.current_time,
            duration_ms,
        };
        self.current_time += duration_ms;
        self.ticks += 1;
        Some(tick)
    }
}
