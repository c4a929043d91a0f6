//! Monte Carlo batches
//!
//! Runs independent copies of one configuration, seeded `seed + i`, on
//! scoped threads. Runs share nothing mutable; each owns its book, price
//! state and random streams.

use std::thread;

use serde::{Deserialize, Serialize};
use tracing::info;
use types::errors::SimError;
use types::numeric::Price;

use crate::config::SimConfig;
use crate::metrics::SimMetrics;
use crate::replay::report_digest;
use crate::runner;

/// Outcome of one run in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRun {
    pub index: usize,
    pub seed: u64,
    pub digest: String,
    pub ticks: usize,
    pub final_price: Option<Price>,
    pub metrics: SimMetrics,
}

/// All runs of a batch plus their combined metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub runs: Vec<BatchRun>,
    pub aggregate: SimMetrics,
}

impl BatchSummary {
    fn from_runs(runs: Vec<BatchRun>) -> Self {
        let mut aggregate = SimMetrics::new();
        for run in &runs {
            aggregate.merge(&run.metrics);
        }
        Self { runs, aggregate }
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Mean traded volume per run
    pub fn mean_traded_volume(&self) -> f64 {
        if self.runs.is_empty() {
            return 0.0;
        }
        self.aggregate.traded_volume as f64 / self.runs.len() as f64
    }
}

/// Run one batch member
pub fn run_one(config: &SimConfig, index: usize) -> Result<BatchRun, SimError> {
    let seed = config.seed.wrapping_add(index as u64);
    let (report, metrics) = runner::run_with_metrics(&config.with_seed(seed))?;
    Ok(BatchRun {
        index,
        seed,
        digest: report_digest(&report),
        ticks: report.len(),
        final_price: report.last().and_then(|s| s.price),
        metrics,
    })
}

/// Run `runs` seeds in parallel, one scoped thread per run
///
/// Results come back in index order. The first failing run's error is
/// returned.
pub fn run_batch(config: &SimConfig, runs: usize) -> Result<BatchSummary, SimError> {
    info!(runs, base_seed = config.seed, "Starting Monte Carlo batch");

    let results: Vec<Result<BatchRun, SimError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..runs)
            .map(|index| scope.spawn(move || run_one(config, index)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    Err(SimError::Report {
                        message: "simulation thread panicked".to_string(),
                    })
                })
            })
            .collect()
    });

    let runs = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    let summary = BatchSummary::from_runs(runs);
    info!(runs = summary.run_count(), summary = %summary.aggregate.summary(), "Monte Carlo batch finished");
    Ok(summary)
}

/// Same as `run_batch` on the calling thread
pub fn run_sequential(config: &SimConfig, runs: usize) -> Result<BatchSummary, SimError> {
    let runs = (0..runs)
        .map(|index| run_one(config, index))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(BatchSummary::from_runs(runs))
}
