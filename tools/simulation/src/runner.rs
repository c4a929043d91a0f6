//! Tick loop
//!
//! For each clock tick starting at `t` with duration `d`:
//!
//! 1. Move the auction controller to the phase at `t` (may uncross)
//! 2. Step the reference price
//! 3. Sample the tick's order flow
//! 4. Route every order to the queue or the book
//! 5. On the last tick, move the controller to `end_time` (close uncross)
//! 6. Replenish any empty book side
//! 7. Check book invariants; a violation aborts the run
//! 8. Hand a snapshot to the collector
//!
//! A run is a pure function of its configuration and seed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use matching_engine::{ApplyOutcome, AuctionOutcome, LimitOrderBook};
use tracing::{debug, error, info, trace, warn};
use types::errors::SimError;
use types::fill::Fill;
use types::numeric::{Price, Volume};

use crate::auction::{AuctionWindowController, Phase, Routing};
use crate::clock::{SimulationClock, Tick};
use crate::config::{SimConfig, ValidatedConfig};
use crate::metrics::SimMetrics;
use crate::order_flow::{FlowFlags, OrderFlowGenerator};
use crate::price_process::{PriceProcess, PriceState};
use crate::report::{ReportCollector, SimulationReport, TickSnapshot};
use crate::rng::RngStreams;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Reached `end_time`
    Completed,
    /// Stopped at a tick boundary on request
    Stopped,
}

/// Trades accumulated within one tick
#[derive(Debug, Default)]
struct TickTrades {
    count: u64,
    volume: Volume,
}

impl TickTrades {
    fn add(&mut self, fills: &[Fill], last_trade: &mut Option<Price>) {
        for fill in fills {
            self.count += 1;
            self.volume += fill.volume;
            *last_trade = Some(fill.price);
        }
    }
}

/// One simulation run and all state it owns
pub struct Simulation {
    config: ValidatedConfig,
    clock: SimulationClock,
    process: PriceProcess,
    price: PriceState,
    flow: OrderFlowGenerator,
    flags: FlowFlags,
    controller: AuctionWindowController,
    book: LimitOrderBook,
    rngs: RngStreams,
    metrics: SimMetrics,
    last_trade: Option<Price>,
}

impl Simulation {
    /// Validate the configuration and set up a seeded book
    pub fn new(config: &SimConfig) -> Result<Self, SimError> {
        let config = config.validate()?;
        let raw = &config.raw;

        let mut book = LimitOrderBook::new(config.tick, raw.max_depth).with_restock_volume(config.restock_volume());
        book.seed(config.start_bid, config.start_ask, config.restock_volume());

        let controller = AuctionWindowController::new(
            raw.start_time,
            raw.end_time,
            config.open_window_ms,
            config.close_window_ms,
        )?;

        if raw.is_degenerate() {
            warn!(seed = raw.seed, "All order rates are zero; the report will contain no trades");
        }

        info!(
            seed = raw.seed,
            start_time = raw.start_time,
            end_time = raw.end_time,
            timestep_ms = raw.timestep_ms,
            max_depth = raw.max_depth,
            tick_size = %config.tick,
            "Simulation initialized"
        );

        Ok(Self {
            clock: SimulationClock::new(raw.start_time, raw.end_time, raw.timestep_ms),
            process: PriceProcess::new(config.tick),
            price: PriceProcess::initial_state(&config),
            flow: OrderFlowGenerator::from_config(&config)?,
            flags: FlowFlags {
                allow_market_orders: raw.allow_market_orders,
                allow_cancel_orders: raw.allow_cancel_orders,
                allow_mid_orders: raw.allow_mid_orders,
            },
            controller,
            book,
            rngs: RngStreams::from_seed(raw.seed),
            metrics: SimMetrics::new(),
            last_trade: None,
            config,
        })
    }

    pub fn book(&self) -> &LimitOrderBook {
        &self.book
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn metrics(&self) -> &SimMetrics {
        &self.metrics
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    pub fn price_state(&self) -> &PriceState {
        &self.price
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }

    /// Run one tick; returns false once the clock is exhausted
    pub fn step<C: ReportCollector + ?Sized>(&mut self, collector: &mut C) -> Result<bool, SimError> {
        let Some(tick) = self.clock.next_tick() else {
            return Ok(false);
        };
        let snapshot = self.run_tick(tick)?;
        collector.record(snapshot);
        Ok(true)
    }

    /// Run every remaining tick
    pub fn run_with<C: ReportCollector + ?Sized>(&mut self, collector: &mut C) -> Result<(), SimError> {
        let never = AtomicBool::new(false);
        self.run_until(collector, &never).map(|_| ())
    }

    /// Run until the end of the horizon or until `stop` is raised
    ///
    /// `stop` is checked between ticks only, so the book is never left
    /// mid-tick.
    pub fn run_until<C: ReportCollector + ?Sized>(&mut self, collector: &mut C, stop: &AtomicBool) -> Result<RunStatus, SimError> {
        let started = Instant::now();
        let mut status = RunStatus::Completed;

        while !self.clock.is_finished() {
            if stop.load(Ordering::Relaxed) {
                status = RunStatus::Stopped;
                break;
            }
            self.step(collector)?;
        }

        self.metrics.set_elapsed(started.elapsed().as_nanos() as u64);
        collector.finish()?;

        info!(
            seed = self.config.raw.seed,
            ticks = self.clock.ticks_elapsed(),
            stopped = status == RunStatus::Stopped,
            summary = %self.metrics.summary(),
            "Simulation finished"
        );
        Ok(status)
    }

    fn run_tick(&mut self, tick: Tick) -> Result<TickSnapshot, SimError> {
        let mut trades = TickTrades::default();

        let reference = self.process.reference_price(&self.price);
        if let Some(outcome) = self.controller.advance_to(tick.start, &mut self.book, reference) {
            self.record_auction(&outcome, &mut trades);
        }

        self.price = self.process.advance(&self.price, &mut self.rngs.price);
        let reference = self.process.reference_price(&self.price);

        let orders = self.flow.generate(
            tick.start,
            tick.duration_ms,
            self.process.reference_mid(&self.price),
            &self.flags,
            &self.book,
            &mut self.rngs.flow,
            &mut self.rngs.shuffle,
        );

        for order in orders {
            self.metrics.record_order(&order);
            match self.controller.route(order, &mut self.book) {
                Routing::Applied(outcome) => self.record_outcome(&outcome, &mut trades),
                Routing::Queued => self.metrics.record_queued(),
                Routing::Dropped => self.metrics.record_dropped(),
            }
        }

        let end_time = self.clock.end_time();
        if tick.end() >= end_time {
            if let Some(outcome) = self.controller.advance_to(end_time, &mut self.book, reference) {
                self.record_auction(&outcome, &mut trades);
            }
        }

        let restocked = self.book.restock_empty_sides(reference);
        if restocked > 0 {
            debug!(time = tick.start, levels = restocked, "Replenished empty book side");
            self.metrics.record_restock(restocked);
        }

        if let Err(violation) = self.book.check_invariants() {
            error!(time = tick.start, %violation, "Book invariant violated");
            return Err(violation.into());
        }

        if let Some(spread) = self.book.spread_ticks() {
            self.metrics.update_spread(spread);
        }
        self.metrics.record_tick();

        let best_bid = self.book.best_bid().map(|p| (p, self.book.best_bid_volume()));
        let best_ask = self.book.best_ask().map(|p| (p, self.book.best_ask_volume()));
        let snapshot = TickSnapshot {
            time: tick.start,
            duration_ms: tick.duration_ms,
            phase: self.controller.phase_at(tick.start),
            best_bid: best_bid.map(|(p, _)| p),
            best_ask: best_ask.map(|(p, _)| p),
            bid_volume: best_bid.map(|(_, v)| v).unwrap_or(0),
            ask_volume: best_ask.map(|(_, v)| v).unwrap_or(0),
            price: self.config.price_method.compute(best_bid, best_ask, self.last_trade),
            reference_price: reference,
            trades: trades.count,
            traded_volume: trades.volume,
            last_trade_price: self.last_trade,
        };

        trace!(
            time = snapshot.time,
            phase = %snapshot.phase,
            trades = snapshot.trades,
            volume = snapshot.traded_volume,
            "Tick complete"
        );
        Ok(snapshot)
    }

    fn record_outcome(&mut self, outcome: &ApplyOutcome, trades: &mut TickTrades) {
        if outcome.evicted > 0 {
            warn!(volume = outcome.evicted, "Volume pushed past max depth");
        }
        trades.add(&outcome.fills, &mut self.last_trade);
        self.metrics.record_outcome(outcome);
    }

    fn record_auction(&mut self, outcome: &AuctionOutcome, trades: &mut TickTrades) {
        trades.add(&outcome.fills, &mut self.last_trade);
        self.metrics.record_auction(outcome);
    }
}

/// Run a configuration to completion and collect its report
pub fn run(config: &SimConfig) -> Result<SimulationReport, SimError> {
    let mut simulation = Simulation::new(config)?;
    let mut report = SimulationReport::new();
    simulation.run_with(&mut report)?;
    Ok(report)
}

/// Like `run`, also returning the run's metrics
pub fn run_with_metrics(config: &SimConfig) -> Result<(SimulationReport, SimMetrics), SimError> {
    let mut simulation = Simulation::new(config)?;
    let mut report = SimulationReport::new();
    simulation.run_with(&mut report)?;
    Ok((report, simulation.metrics.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config() -> SimConfig {
        SimConfig {
            end_time: 2_000,
            open_window: 0.2,
            close_window: 0.2,
            seed: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_one_tick_horizon() {
        let config = SimConfig {
            end_time: 100,
            timestep_ms: 100,
            open_window: 0.0,
            close_window: 0.0,
            ..Default::default()
        };
        let report = run(&config).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.snapshots()[0].time, 0);
        assert_eq!(report.snapshots()[0].duration_ms, 100);
    }

    #[test]
    fn test_partial_final_tick() {
        let config = SimConfig {
            end_time: 250,
            open_window: 0.0,
            close_window: 0.0,
            ..Default::default()
        };
        let report = run(&config).unwrap();
        let durations: Vec<i64> = report.snapshots().iter().map(|s| s.duration_ms).collect();
        assert_eq!(durations, vec![100, 100, 50]);
    }

    #[test]
    fn test_book_uncrossed_every_tick() {
        let report = run(&short_config()).unwrap();
        assert_eq!(report.len(), 20);
        for s in report.snapshots() {
            if let (Some(bid), Some(ask)) = (s.best_bid, s.best_ask) {
                assert!(bid < ask, "crossed at {}", s.time);
            }
        }
    }

    #[test]
    fn test_phases_in_report() {
        let report = run(&short_config()).unwrap();
        let phases: Vec<Phase> = report.snapshots().iter().map(|s| s.phase).collect();
        assert_eq!(phases[0], Phase::OpenAuction);
        assert_eq!(phases[1], Phase::OpenAuction);
        assert_eq!(phases[2], Phase::Continuous);
        assert_eq!(phases[17], Phase::Continuous);
        assert_eq!(phases[18], Phase::CloseAuction);
        assert_eq!(phases[19], Phase::CloseAuction);
    }

    #[test]
    fn test_run_ends_closed_with_both_auctions_cleared() {
        let mut simulation = Simulation::new(&short_config()).unwrap();
        let mut rows: Vec<TickSnapshot> = Vec::new();
        simulation.run_with(&mut rows).unwrap();
        assert_eq!(simulation.phase(), Phase::Closed);
        assert_eq!(simulation.metrics().auction_clearings, 2);
        assert_eq!(simulation.metrics().ticks, 20);
    }

    #[test]
    fn test_degenerate_flow_gives_complete_quiet_report() {
        let config = SimConfig {
            market_order_rate: 0.0,
            limit_order_rate: 0.0,
            cancel_order_rate: 0.0,
            jump_rate: 0.0,
            ..short_config()
        };
        let report = run(&config).unwrap();
        assert_eq!(report.len(), 20);
        assert_eq!(report.total_trades(), 0);
        for s in report.snapshots() {
            assert_eq!(s.best_bid, Some("100.00".parse().unwrap()));
            assert_eq!(s.best_ask, Some("100.01".parse().unwrap()));
        }
    }

    #[test]
    fn test_limit_only_flow_rests_without_trading() {
        let config = SimConfig {
            end_time: 60_000,
            market_order_rate: 0.0,
            cancel_order_rate: 0.0,
            jump_rate: 0.0,
            open_window: 0.0,
            close_window: 0.0,
            ..Default::default()
        };
        let (report, metrics) = run_with_metrics(&config).unwrap();
        assert!(metrics.limit_orders > 100);
        assert_eq!(metrics.total_fills, 0);
        assert_eq!(report.total_trades(), 0);
        for s in report.snapshots() {
            assert!(matches!((s.best_bid, s.best_ask), (Some(bid), Some(ask)) if bid < ask));
        }
    }

    #[test]
    fn test_invalid_config_fails_before_first_tick() {
        let config = SimConfig {
            tick_size: -0.01,
            ..Default::default()
        };
        assert!(matches!(Simulation::new(&config), Err(SimError::Config(_))));
    }

    #[test]
    fn test_stop_flag_halts_at_tick_boundary() {
        let mut simulation = Simulation::new(&short_config()).unwrap();
        let mut report = SimulationReport::new();
        simulation.step(&mut report).unwrap();
        simulation.step(&mut report).unwrap();

        let stop = AtomicBool::new(true);
        let status = simulation.run_until(&mut report, &stop).unwrap();
        assert_eq!(status, RunStatus::Stopped);
        assert_eq!(report.len(), 2);
        assert_eq!(simulation.clock().current_time(), 200);
        assert!(simulation.book().check_invariants().is_ok());
    }

    #[test]
    fn test_step_after_finish() {
        let config = SimConfig {
            end_time: 100,
            open_window: 0.0,
            close_window: 0.0,
            ..Default::default()
        };
        let mut simulation = Simulation::new(&config).unwrap();
        let mut report = SimulationReport::new();
        assert!(simulation.step(&mut report).unwrap());
        assert!(!simulation.step(&mut report).unwrap());
        assert!(simulation.is_finished());
    }

    #[test]
    fn test_trades_reported_per_tick() {
        let config = SimConfig {
            market_order_rate: 20.0,
            ..short_config()
        };
        let (report, metrics) = run_with_metrics(&config).unwrap();
        assert!(report.total_trades() > 0);
        assert_eq!(report.total_trades(), metrics.total_fills);
        assert_eq!(report.total_volume(), metrics.traded_volume);
    }

    #[test]
    fn test_same_seed_same_report() {
        assert_eq!(run(&short_config()).unwrap(), run(&short_config()).unwrap());
    }

    #[test]
    fn test_different_seed_different_report() {
        let a = run(&short_config()).unwrap();
        let b = run(&short_config().with_seed(2)).unwrap();
        assert_ne!(a, b);
    }
}
