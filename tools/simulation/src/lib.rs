//! Synthetic Market Simulator
//!
//! Discrete-time simulation of a single instrument: a mean-reverting
//! reference price, Poisson order flow, a depth-limited limit order book and
//! open/close auctions. Every run is reproducible from its configuration and
//! seed.
//!
//! # Modules
//! - `config`: JSON parameter document and validation
//! - `rng`: Seeded per-component random streams
//! - `price_process`: Mean-reverting reference price
//! - `order_flow`: Synthetic order generation
//! - `auction`: Auction window state machine and uncrossing
//! - `clock`: Discrete simulation clock
//! - `runner`: Tick loop tying the components together
//! - `report`: Per-tick snapshots, collectors and CSV output
//! - `metrics`: Run counters and throughput
//! - `replay`: Report digests and determinism checks
//! - `monte_carlo`: Parallel independent runs
//! - `export`: Run summary JSON export

pub mod config;
pub mod rng;
pub mod price_process;
pub mod order_flow;
pub mod auction;
pub mod clock;
pub mod runner;
pub mod report;
pub mod metrics;
pub mod replay;
pub mod monte_carlo;
pub mod export;

pub use config::SimConfig;
pub use report::{ReportCollector, SimulationReport, TickSnapshot};
pub use runner::{run, RunStatus, Simulation};

/// Crate version constant
pub const VERSION: &str = "1.0.0";
