//! Book invariant properties over whole runs
//!
//! Every emitted tick must show an uncrossed book with at most `max_depth`
//! levels per side, on the tick grid.

use proptest::prelude::*;
use simulation::{ReportCollector, Simulation, SimConfig, TickSnapshot};

/// Collector that rejects crossed top-of-book rows
struct Checked {
    rows: Vec<TickSnapshot>,
}

impl ReportCollector for Checked {
    fn record(&mut self, snapshot: TickSnapshot) {
        if let (Some(bid), Some(ask)) = (snapshot.best_bid, snapshot.best_ask) {
            assert!(bid < ask, "crossed book at {}", snapshot.time);
        }
        self.rows.push(snapshot);
    }
}

fn run_checked(config: &SimConfig) -> (Vec<TickSnapshot>, Simulation) {
    let mut sim = Simulation::new(config).unwrap();
    let mut rows = Checked { rows: Vec::new() };
    while sim.step(&mut rows).unwrap() {
        let book = sim.book();
        assert!(book.bids().len() <= config.max_depth);
        assert!(book.asks().len() <= config.max_depth);
        assert!(book.check_invariants().is_ok());
    }
    (rows.rows, sim)
}

#[test]
fn test_heavy_flow_keeps_invariants() {
    let config = SimConfig {
        end_time: 10_000,
        market_order_rate: 30.0,
        limit_order_rate: 40.0,
        cancel_order_rate: 20.0,
        cancel_volume_rate: 15.0,
        jump_rate: 2.0,
        jump_volume_rate: 80.0,
        allow_mid_orders: true,
        open_window: 1.0,
        close_window: 1.0,
        seed: 77,
        ..Default::default()
    };
    let (rows, sim) = run_checked(&config);
    assert_eq!(rows.len(), 100);
    assert!(sim.metrics().total_fills > 0);
    assert!(sim.metrics().cancelled_volume > 0);
}

#[test]
fn test_one_level_book() {
    let config = SimConfig {
        end_time: 5_000,
        max_depth: 1,
        market_order_rate: 10.0,
        seed: 5,
        ..Default::default()
    };
    let (rows, _) = run_checked(&config);
    assert_eq!(rows.len(), 50);
}

#[test]
fn test_wide_tick_and_far_prices() {
    let config = SimConfig {
        end_time: 3_000,
        tick_size: 0.5,
        start_bid: 10.0,
        start_ask: 11.0,
        mean_deviation: 20.0,
        seed: 8,
        ..Default::default()
    };
    let (rows, sim) = run_checked(&config);
    let tick = sim.config().tick;
    for row in rows {
        if let Some(bid) = row.best_bid {
            assert!(tick.is_aligned(bid));
        }
        if let Some(ask) = row.best_ask {
            assert!(tick.is_aligned(ask));
        }
    }
}

#[test]
#[ignore] // Run with: cargo test --test invariants -- --ignored
fn test_full_default_session() {
    let config = SimConfig {
        market_order_rate: 50.0,
        limit_order_rate: 100.0,
        cancel_order_rate: 50.0,
        jump_rate: 1.0,
        allow_mid_orders: true,
        ..Default::default()
    };
    let start = std::time::Instant::now();
    let (rows, sim) = run_checked(&config);
    let elapsed = start.elapsed();
    assert_eq!(rows.len(), 600);
    println!("{} in {:?}", sim.metrics().summary(), elapsed);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_random_configs_keep_invariants(
        seed in any::<u64>(),
        max_depth in 1usize..8,
        market in 0.0f64..30.0,
        limit in 0.0f64..30.0,
        cancel in 0.0f64..30.0,
        jump in 0.0f64..3.0,
        mid in any::<bool>(),
    ) {
        let config = SimConfig {
            end_time: 2_000,
            max_depth,
            market_order_rate: market,
            limit_order_rate: limit,
            cancel_order_rate: cancel,
            jump_rate: jump,
            allow_mid_orders: mid,
            open_window: 0.3,
            close_window: 0.3,
            seed,
            ..Default::default()
        };
        let (rows, _) = run_checked(&config);
        prop_assert_eq!(rows.len(), 20);
    }
}
