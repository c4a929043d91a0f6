//! Run summary export
//!
//! Serializes the configuration, metrics and report digest of a run to JSON
//! for external consumption.

use serde::{Deserialize, Serialize};
use types::errors::SimError;
use types::numeric::Price;

use crate::config::SimConfig;
use crate::metrics::SimMetrics;
use crate::replay::report_digest;
use crate::report::SimulationReport;

/// Combined export containing all simulation outputs except the rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationExport {
    pub version: String,
    pub seed: u64,
    pub config: SimConfig,
    pub metrics: SimMetrics,
    pub ticks: usize,
    pub total_trades: u64,
    pub report_digest: String,
    pub final_best_bid: Option<Price>,
    pub final_best_ask: Option<Price>,
    pub final_price: Option<Price>,
}

/// Build a complete simulation export.
pub fn build_export(config: &SimConfig, report: &SimulationReport, metrics: &SimMetrics) -> SimulationExport {
    let last = report.last();
    SimulationExport {
        version: crate::VERSION.to_string(),
        seed: config.seed,
        config: config.clone(),
        metrics: metrics.clone(),
        ticks: report.len(),
        total_trades: report.total_trades(),
        report_digest: report_digest(report),
        final_best_bid: last.and_then(|s| s.best_bid),
        final_best_ask: last.and_then(|s| s.best_ask),
        final_price: last.and_then(|s| s.price),
    }
}

/// Export complete simulation data as JSON.
pub fn export_json(export: &SimulationExport) -> String {
    serde_json::to_string_pretty(export).unwrap_or_default()
}

/// Write export to a file path.
pub fn write_to_file(export: &SimulationExport, path: &str) -> Result<(), SimError> {
    std::fs::write(path, export_json(export)).map_err(|e| SimError::Report {
        message: format!("{}: {}", path, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner;

    fn config() -> SimConfig {
        SimConfig {
            end_time: 500,
            open_window: 0.0,
            close_window: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_build_export() {
        let (report, metrics) = runner::run_with_metrics(&config()).unwrap();
        let export = build_export(&config(), &report, &metrics);
        assert_eq!(export.version, crate::VERSION);
        assert_eq!(export.ticks, 5);
        assert_eq!(export.seed, 42);
        assert_eq!(export.report_digest, report_digest(&report));
        assert!(export.final_best_bid.is_some());
    }

    #[test]
    fn test_export_json_roundtrip() {
        let export = build_export(&config(), &SimulationReport::new(), &SimMetrics::new());
        let json = export_json(&export);
        let parsed: SimulationExport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, export);
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let path = path.to_str().unwrap();
        let export = build_export(&config(), &SimulationReport::new(), &SimMetrics::new());
        write_to_file(&export, path).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("\"report_digest\""));
    }
}
