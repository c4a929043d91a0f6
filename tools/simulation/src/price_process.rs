//! Mean-reverting reference price
//!
//! One step per clock tick:
//!
//! `mid' = mid + drift + mean_reversion * (anchor - mid) + noise`
//!
//! with Gaussian noise. The noise scale is calibrated so that a driftless
//! walk over the whole horizon has expected absolute deviation equal to
//! `mean_deviation`: for `N` steps, `E|sum| = sigma * sqrt(N) * sqrt(2/pi)`.
//!
//! The process only produces a reference for order placement. It never
//! touches the book.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use types::numeric::{Price, TickSize};

use crate::config::ValidatedConfig;

/// State of the reference price after some number of steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceState {
    pub mid: f64,
    pub anchor: f64,
    pub drift: f64,
    pub mean_reversion: f64,
    /// Standard deviation of the per-step noise
    pub noise_scale: f64,
    pub steps: u64,
}

/// Per-step noise scale for a horizon of `steps` steps
pub fn noise_scale(mean_deviation: f64, steps: u64) -> f64 {
    if steps == 0 || mean_deviation <= 0.0 {
        return 0.0;
    }
    mean_deviation / ((steps as f64).sqrt() * (2.0 / std::f64::consts::PI).sqrt())
}

/// Advances `PriceState` and maps it onto the tick grid
#[derive(Debug, Clone, Copy)]
pub struct PriceProcess {
    tick: TickSize,
}

impl PriceProcess {
    pub fn new(tick: TickSize) -> Self {
        Self { tick }
    }

    /// Starting state for a validated configuration
    pub fn initial_state(config: &ValidatedConfig) -> PriceState {
        PriceState {
            mid: Price::midpoint(config.start_bid, config.start_ask).to_f64(),
            anchor: config.anchor,
            drift: config.raw.price_drift,
            mean_reversion: config.raw.mean_reversion,
            noise_scale: noise_scale(config.raw.mean_deviation, config.horizon_steps()),
            steps: 0,
        }
    }

    /// Take one step
    pub fn advance<R: Rng + ?Sized>(&self, current: &PriceState, rng: &mut R) -> PriceState {
        let z: f64 = rng.sample(StandardNormal);
        let noise = current.noise_scale * z;
        let mid = current.mid
            + current.drift
            + current.mean_reversion * (current.anchor - current.mid)
            + noise;
        PriceState {
            mid,
            steps: current.steps + 1,
            ..*current
        }
    }

    /// Reference price on the tick grid, never below one tick
    pub fn reference_price(&self, state: &PriceState) -> Price {
        let floor = self.tick.offset(Price::new(rust_decimal::Decimal::ZERO), 1);
        match self.tick.quantize_f64(state.mid) {
            Some(price) if price >= floor => price,
            _ => floor,
        }
    }

    /// Unrounded reference mid, floored at one tick
    ///
    /// Falls back to `reference_price` when the mid cannot be placed on the
    /// grid.
    pub fn reference_mid(&self, state: &PriceState) -> Price {
        let floor = self.tick.offset(Price::new(rust_decimal::Decimal::ZERO), 1);
        match Price::from_f64(state.mid) {
            Some(mid) if mid >= floor && self.tick.checked_quantize(mid.as_decimal()).is_some() => mid,
            _ => self.reference_price(state),
        }
    }

    /// Run `n` steps and keep every state, for diagnostics
    pub fn sample_path<R: Rng + ?Sized>(&self, start: &PriceState, n: usize, rng: &mut R) -> Vec<PriceState> {
        let mut path = Vec::with_capacity(n);
        let mut state = *start;
        for _ in 0..n {
            state = self.advance(&state, rng);
            path.push(state);
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngStreams;

    fn tick() -> TickSize {
        TickSize::from_f64(0.01).unwrap()
    }

    fn state(mid: f64, anchor: f64, reversion: f64, sigma: f64) -> PriceState {
        PriceState {
            mid,
            anchor,
            drift: 0.0,
            mean_reversion: reversion,
            noise_scale: sigma,
            steps: 0,
        }
    }

    #[test]
    fn test_noise_scale_calibration() {
        // 2.0 over 100 steps: 2 / (10 * 0.7978845608)
        let sigma = noise_scale(2.0, 100);
        assert!((sigma - 0.250_662_827).abs() < 1e-6);
        assert_eq!(noise_scale(2.0, 0), 0.0);
        assert_eq!(noise_scale(0.0, 100), 0.0);
    }

    #[test]
    fn test_deterministic_step_without_noise() {
        let process = PriceProcess::new(tick());
        let mut rngs = RngStreams::from_seed(1);
        let next = process.advance(&state(90.0, 100.0, 0.5, 0.0), &mut rngs.price);
        assert!((next.mid - 95.0).abs() < 1e-12);
        assert_eq!(next.steps, 1);
    }

    #[test]
    fn test_drift_applied() {
        let process = PriceProcess::new(tick());
        let mut rngs = RngStreams::from_seed(1);
        let mut s = state(100.0, 100.0, 0.0, 0.0);
        s.drift = 0.05;
        let next = process.advance(&s, &mut rngs.price);
        assert!((next.mid - 100.05).abs() < 1e-12);
    }

    #[test]
    fn test_reverts_toward_anchor() {
        let process = PriceProcess::new(tick());
        let mut rngs = RngStreams::from_seed(5);
        let start = state(110.0, 100.0, 0.1, 0.01);
        let path = process.sample_path(&start, 200, &mut rngs.price);
        let last = path.last().unwrap();
        assert!((last.mid - 100.0).abs() < 1.0);
        assert_eq!(last.steps, 200);
    }

    #[test]
    fn test_empirical_deviation_matches_calibration() {
        let process = PriceProcess::new(tick());
        let mut rngs = RngStreams::from_seed(11);
        let steps = 400u64;
        let sigma = noise_scale(2.0, steps);
        let runs = 400;
        let mut total = 0.0;
        for _ in 0..runs {
            let path = process.sample_path(&state(100.0, 100.0, 0.0, sigma), steps as usize, &mut rngs.price);
            total += (path[path.len() - 1].mid - 100.0).abs();
        }
        let mean = total / runs as f64;
        assert!((mean - 2.0).abs() < 0.3, "mean absolute deviation {}", mean);
    }

    #[test]
    fn test_reference_price_on_grid() {
        let process = PriceProcess::new(tick());
        let price = process.reference_price(&state(100.004_9, 100.0, 0.0, 0.0));
        assert_eq!(price, "100.00".parse().unwrap());
        assert!(tick().is_aligned(price));
    }

    #[test]
    fn test_reference_price_floor() {
        let process = PriceProcess::new(tick());
        let price = process.reference_price(&state(-3.0, 100.0, 0.0, 0.0));
        assert_eq!(price, "0.01".parse().unwrap());
    }

    #[test]
    fn test_reference_mid_keeps_sub_tick_position() {
        let process = PriceProcess::new(tick());
        let mid = process.reference_mid(&state(100.005, 100.0, 0.0, 0.0));
        assert_eq!(mid, "100.005".parse().unwrap());
        assert!(!tick().is_aligned(mid));

        let low = process.reference_mid(&state(-3.0, 100.0, 0.0, 0.0));
        assert_eq!(low, "0.01".parse().unwrap());
        let huge = process.reference_mid(&state(1e300, 100.0, 0.0, 0.0));
        assert_eq!(huge, "0.01".parse().unwrap());
    }

    #[test]
    fn test_same_seed_same_path() {
        let process = PriceProcess::new(tick());
        let start = state(100.0, 100.0, 0.01, 0.1);
        let a = process.sample_path(&start, 50, &mut RngStreams::from_seed(4).price);
        let b = process.sample_path(&start, 50, &mut RngStreams::from_seed(4).price);
        assert_eq!(a, b);
    }
}
