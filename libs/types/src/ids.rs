//! Identifier types for simulated orders
//!
//! Ids are plain sequence numbers handed out by a per-run `OrderSequence`,
//! so two runs with the same seed assign the same ids to the same orders.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an order within one simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Create from a raw sequence number
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw sequence number
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic order id generator owned by one run
#[derive(Debug, Clone, Default)]
pub struct OrderSequence {
    next: u64,
}

impl OrderSequence {
    /// Start a sequence at `first`
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Hand out the next id
    pub fn next_id(&mut self) -> OrderId {
        let id = OrderId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids issued so far when started at zero
    pub fn issued(&self) -> u64 {
        self.next
    }
}
