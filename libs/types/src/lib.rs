//! Types library for the synthetic limit order book simulator
//!
//! Core type definitions shared by the order book and the simulation
//! driver. Prices are exact decimals aligned to a tick grid so that book
//! state is reproducible bit for bit across runs.
//!
//! # Modules
//! - `ids`: Order identifiers and the per-run id sequence
//! - `numeric`: Fixed-point price and tick types, volumes
//! - `order`: Order side and the tagged order kind
//! - `fill`: Execution records produced by the book and the auctions
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod order;
pub mod fill;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::fill::*;
    pub use crate::errors::*;
}
