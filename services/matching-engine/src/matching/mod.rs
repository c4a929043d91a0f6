//! Matching logic module
//!
//! Continuous crossing rules, fill construction and single-price auction
//! uncrossing.

pub mod crossing;
pub mod executor;
pub mod auction;

pub use crossing::{is_crossed, within_limit};
pub use executor::MatchExecutor;
