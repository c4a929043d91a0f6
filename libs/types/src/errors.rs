//! Error types for the simulator
//!
//! Error taxonomy using thiserror:
//! - `ConfigError`: bad or contradictory parameters, fatal before any tick
//! - `InvariantViolation`: a book state that correct matching never produces
//! - `SimError`: everything a run can fail with

use thiserror::Error;

/// Top-level simulation error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("Report error: {message}")]
    Report { message: String },
}

/// Configuration errors, detected at initialization
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Auction windows overlap: open {open_ms}ms + close {close_ms}ms exceeds horizon {horizon_ms}ms")]
    AuctionOverlap {
        open_ms: i64,
        close_ms: i64,
        horizon_ms: i64,
    },

    #[error("Unknown price method: {0}")]
    UnknownPriceMethod(String),
}

impl ConfigError {
    /// Shorthand for a field validation failure
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Book states that must never be observable after an operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("Crossed book: best bid {bid} >= best ask {ask}")]
    CrossedBook { bid: String, ask: String },

    #[error("Non-positive volume on {side} level {price}")]
    EmptyLevel { side: String, price: String },

    #[error("{side} ladder holds {levels} levels, max depth {max_depth}")]
    DepthExceeded {
        side: String,
        levels: usize,
        max_depth: usize,
    },

    #[error("{side} ladder out of order at {price}")]
    Unsorted { side: String, price: String },

    #[error("{side} price {price} is off the tick grid")]
    OffGrid { side: String, price: String },
}
