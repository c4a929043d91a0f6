//! Simulation parameter document
//!
//! A JSON object read once at startup. Every key is optional and falls back
//! to the stock market defaults; unknown keys are rejected so that a typo
//! never silently runs the default scenario.

use std::path::Path;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::ConfigError;
use types::numeric::{Price, TickSize};

use crate::report::PriceMethod;

/// Largest accepted `max_depth`
pub const MAX_DEPTH: usize = 10_000;

/// Largest price, in ticks, accepted for start prices and the anchor
pub const MAX_PRICE_TICKS: u64 = 1_000_000_000_000;

/// Largest accepted arrival rate, orders per second
pub const MAX_ORDER_RATE: f64 = 1e6;

/// Largest accepted mean order volume
pub const MAX_VOLUME_RATE: f64 = 1e9;

/// Raw parameters as they appear in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    // Timing (epoch ms)
    pub start_time: i64,
    pub end_time: i64,
    pub timestep_ms: i64,

    // Price
    pub tick_size: f64,
    pub start_bid: f64,
    pub start_ask: f64,
    pub price_drift: f64,
    pub mean_reversion: f64,
    pub mean_deviation: f64,
    /// Long-run anchor, defaults to the start midpoint
    pub anchor_price: Option<f64>,

    // Book
    pub max_depth: usize,

    // Order flow (events per second, mean volume per event)
    pub market_order_rate: f64,
    pub limit_order_rate: f64,
    pub cancel_order_rate: f64,
    pub jump_rate: f64,
    pub market_volume_rate: f64,
    pub limit_volume_rate: f64,
    pub cancel_volume_rate: f64,
    pub jump_volume_rate: f64,
    /// Mid orders arrive at this fraction of the market order rate
    pub mid_order_fraction: f64,

    // Flags
    pub allow_market_orders: bool,
    pub allow_cancel_orders: bool,
    pub allow_mid_orders: bool,

    // Auction windows (seconds)
    pub open_window: f64,
    pub close_window: f64,

    // Reporting
    pub price_method: String,
    pub output_file: Option<String>,

    // Run control
    pub seed: u64,
    pub log_level: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_time: 0,
            end_time: 60_000,
            timestep_ms: 100,
            tick_size: 0.01,
            start_bid: 100.00,
            start_ask: 100.01,
            price_drift: 0.0,
            mean_reversion: 0.01,
            mean_deviation: 2.0,
            anchor_price: None,
            max_depth: 5,
            market_order_rate: 2.0,
            limit_order_rate: 5.0,
            cancel_order_rate: 1.0,
            jump_rate: 0.01,
            market_volume_rate: 10.0,
            limit_volume_rate: 10.0,
            cancel_volume_rate: 3.0,
            jump_volume_rate: 50.0,
            mid_order_fraction: 0.5,
            allow_market_orders: true,
            allow_cancel_orders: true,
            allow_mid_orders: false,
            open_window: 5.0,
            close_window: 5.0,
            price_method: "mid".to_string(),
            output_file: Some("simulation_result.csv".to_string()),
            seed: 42,
            log_level: "info".to_string(),
        }
    }
}

/// Parameters after validation, converted to the book's exact types
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    pub raw: SimConfig,
    pub tick: TickSize,
    pub start_bid: Price,
    pub start_ask: Price,
    pub anchor: f64,
    pub price_method: PriceMethod,
    pub open_window_ms: i64,
    pub close_window_ms: i64,
}

impl ValidatedConfig {
    /// Number of clock ticks in the horizon, counting a final partial tick
    pub fn horizon_steps(&self) -> u64 {
        let span = self.horizon_ms();
        let step = self.raw.timestep_ms;
        (span / step + i64::from(span % step != 0)) as u64
    }

    /// Session length; `validate` guarantees it does not overflow
    pub fn horizon_ms(&self) -> i64 {
        self.raw.end_time.saturating_sub(self.raw.start_time)
    }

    /// Per-level volume used when seeding and replenishing the book
    pub fn restock_volume(&self) -> u64 {
        self.raw.limit_volume_rate.ceil().max(1.0) as u64
    }
}

impl SimConfig {
    /// Load and parse a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Parse a configuration document
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Copy with a different seed
    pub fn with_seed(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    /// Whether no order kind can ever be generated
    pub fn is_degenerate(&self) -> bool {
        let market = self.allow_market_orders && self.market_order_rate > 0.0;
        let mid = self.allow_mid_orders && self.market_order_rate * self.mid_order_fraction > 0.0;
        let cancel = self.allow_cancel_orders && self.cancel_order_rate > 0.0;
        !(market || mid || cancel || self.limit_order_rate > 0.0 || self.jump_rate > 0.0)
    }

    /// Check every parameter and convert to exact types
    ///
    /// Fails before any tick runs; nothing is clamped or defaulted here.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        if self.timestep_ms <= 0 {
            return Err(ConfigError::invalid("timestep_ms", "must be positive"));
        }
        if self.start_time >= self.end_time {
            return Err(ConfigError::invalid(
                "end_time",
                format!("{} is not after start_time {}", self.end_time, self.start_time),
            ));
        }
        let horizon_ms = self
            .end_time
            .checked_sub(self.start_time)
            .ok_or_else(|| ConfigError::invalid("end_time", "session length overflows"))?;

        let tick = positive("tick_size", self.tick_size)
            .and_then(|v| TickSize::from_f64(v).ok_or_else(|| ConfigError::invalid("tick_size", "not representable")))?;

        let start_bid = price("start_bid", self.start_bid, tick)?;
        let start_ask = price("start_ask", self.start_ask, tick)?;
        if start_bid >= start_ask {
            return Err(ConfigError::invalid(
                "start_bid",
                format!("{} must be below start_ask {}", start_bid, start_ask),
            ));
        }

        if self.max_depth == 0 {
            return Err(ConfigError::invalid("max_depth", "must be positive"));
        }
        if self.max_depth > MAX_DEPTH {
            return Err(ConfigError::invalid(
                "max_depth",
                format!("{} exceeds {}", self.max_depth, MAX_DEPTH),
            ));
        }

        finite("price_drift", self.price_drift)?;
        non_negative("mean_deviation", self.mean_deviation)?;
        let reversion = non_negative("mean_reversion", self.mean_reversion)?;
        if reversion > 1.0 {
            return Err(ConfigError::invalid("mean_reversion", "must not exceed 1"));
        }

        for (field, rate) in [
            ("market_order_rate", self.market_order_rate),
            ("limit_order_rate", self.limit_order_rate),
            ("cancel_order_rate", self.cancel_order_rate),
            ("jump_rate", self.jump_rate),
        ] {
            at_most(field, non_negative(field, rate)?, MAX_ORDER_RATE)?;
        }
        at_most("mid_order_fraction", non_negative("mid_order_fraction", self.mid_order_fraction)?, 1.0)?;
        for (field, mean) in [
            ("market_volume_rate", self.market_volume_rate),
            ("limit_volume_rate", self.limit_volume_rate),
            ("cancel_volume_rate", self.cancel_volume_rate),
            ("jump_volume_rate", self.jump_volume_rate),
        ] {
            at_most(field, positive(field, mean)?, MAX_VOLUME_RATE)?;
        }

        let open_window_ms = window_ms("open_window", self.open_window, horizon_ms)?;
        let close_window_ms = window_ms("close_window", self.close_window, horizon_ms)?;
        let windows_ms = open_window_ms.checked_add(close_window_ms);
        if windows_ms.map_or(true, |total| total > horizon_ms) {
            return Err(ConfigError::AuctionOverlap {
                open_ms: open_window_ms,
                close_ms: close_window_ms,
                horizon_ms,
            });
        }

        let anchor = match self.anchor_price {
            Some(anchor) => {
                price("anchor_price", anchor, tick)?;
                anchor
            }
            None => Price::midpoint(start_bid, start_ask).to_f64(),
        };

        let price_method: PriceMethod = self.price_method.parse()?;

        Ok(ValidatedConfig {
            raw: self.clone(),
            tick,
            start_bid,
            start_ask,
            anchor,
            price_method,
            open_window_ms,
            close_window_ms,
        })
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::invalid(field, "must be a finite number"))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    let value = finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::invalid(field, format!("{} is negative", value)));
    }
    Ok(value)
}

fn positive(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    let value = finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::invalid(field, format!("{} is not positive", value)));
    }
    Ok(value)
}

fn at_most(field: &'static str, value: f64, max: f64) -> Result<f64, ConfigError> {
    if value > max {
        return Err(ConfigError::invalid(field, format!("{} exceeds {}", value, max)));
    }
    Ok(value)
}

/// Positive, representable, and at most `MAX_PRICE_TICKS` ticks from zero
fn price(field: &'static str, value: f64, tick: TickSize) -> Result<Price, ConfigError> {
    let value = positive(field, value)?;
    let decimal = Decimal::from_f64(value).ok_or_else(|| ConfigError::invalid(field, "not representable"))?;
    decimal
        .checked_div(tick.as_decimal())
        .filter(|ticks| *ticks <= Decimal::from(MAX_PRICE_TICKS))
        .ok_or_else(|| {
            ConfigError::invalid(field, format!("more than {} ticks of {}", MAX_PRICE_TICKS, tick))
        })?;
    let price = tick
        .checked_quantize(decimal)
        .ok_or_else(|| ConfigError::invalid(field, "not representable"))?;
    if !price.is_positive() {
        return Err(ConfigError::invalid(field, "rounds to zero on the tick grid"));
    }
    Ok(price)
}

/// Window length in ms; anything longer than the session is rejected
fn window_ms(field: &'static str, seconds: f64, horizon_ms: i64) -> Result<i64, ConfigError> {
    let ms = (non_negative(field, seconds)? * 1000.0).round();
    if ms > horizon_ms as f64 {
        return Err(ConfigError::invalid(
            field,
            format!("{}s is longer than the {}ms session", seconds, horizon_ms),
        ));
    }
    Ok(ms as i64)
}
