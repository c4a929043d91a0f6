//! Report digests and deterministic replay validation
//!
//! Same configuration and seed → byte-identical report. The digest is the
//! SHA-256 of the canonical CSV rendering, so two runs can be compared
//! without keeping both reports around.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use types::errors::SimError;

use crate::config::SimConfig;
use crate::report::SimulationReport;
use crate::runner;

/// Hex SHA-256 of the report's CSV bytes
pub fn report_digest(report: &SimulationReport) -> String {
    let mut hasher = Sha256::new();
    hasher.update(report.to_csv().as_bytes());
    hex::encode(hasher.finalize())
}

/// Result of running one configuration twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterminismCheck {
    pub matches: bool,
    pub digest_a: String,
    pub digest_b: String,
}

/// Run `config` twice from scratch and compare report digests
pub fn verify_determinism(config: &SimConfig) -> Result<DeterminismCheck, SimError> {
    let digest_a = report_digest(&runner::run(config)?);
    let digest_b = report_digest(&runner::run(config)?);
    let matches = digest_a == digest_b;

    if matches {
        info!(seed = config.seed, digest = %digest_a, "Replay reproduced the report");
    } else {
        warn!(seed = config.seed, digest_a = %digest_a, digest_b = %digest_b, "Replay diverged");
    }

    Ok(DeterminismCheck {
        matches,
        digest_a,
        digest_b,
    })
}

/// Compare a stored report against a fresh run of its configuration
pub fn validate_report(config: &SimConfig, expected: &SimulationReport) -> Result<DeterminismCheck, SimError> {
    let digest_a = report_digest(expected);
    let digest_b = report_digest(&runner::run(config)?);
    Ok(DeterminismCheck {
        matches: digest_a == digest_b,
        digest_a,
        digest_b,
    })
}

/// Export a report as JSON.
pub fn export_report(report: &SimulationReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_default()
}

/// Import a report from JSON.
pub fn import_report(json: &str) -> Result<SimulationReport, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimConfig {
        SimConfig {
            end_time: 1_500,
            open_window: 0.3,
            close_window: 0.3,
            allow_mid_orders: true,
            jump_rate: 1.0,
            seed: 99,
            ..Default::default()
        }
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let digest = report_digest(&SimulationReport::new());
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_replay_determinism() {
        let check = verify_determinism(&config()).unwrap();
        assert!(check.matches, "Replay produced a different report");
        assert_eq!(check.digest_a, check.digest_b);
    }

    #[test]
    fn test_seed_changes_digest() {
        let a = report_digest(&runner::run(&config()).unwrap());
        let b = report_digest(&runner::run(&config().with_seed(100)).unwrap());
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_stored_report() {
        let report = runner::run(&config()).unwrap();
        let check = validate_report(&config(), &report).unwrap();
        assert!(check.matches);

        let other = runner::run(&config().with_seed(1)).unwrap();
        assert!(!validate_report(&config(), &other).unwrap().matches);
    }

    #[test]
    fn test_report_json_roundtrip_keeps_digest() {
        let report = runner::run(&config()).unwrap();
        let imported = import_report(&export_report(&report)).unwrap();
        assert_eq!(report_digest(&imported), report_digest(&report));
    }
}
