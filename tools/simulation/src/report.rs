//! Per-tick report rows and their sinks
//!
//! The runner hands one `TickSnapshot` per tick to a `ReportCollector`.
//! `SimulationReport` is the in-memory collector; it also renders the CSV
//! written to `output_file`.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::{ConfigError, SimError};
use types::numeric::{Price, Volume};

use crate::auction::Phase;

/// CSV header, one column per `TickSnapshot` field that leaves the process
pub const CSV_HEADER: &str = "Timestamp,Time,BidPrice,BidVolume,AskPrice,AskVolume,Price,Trades,Volume";

/// How the instantaneous price column is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceMethod {
    /// Midpoint of best bid and best ask
    Mid,
    /// Last trade price, falling back to the midpoint
    Last,
    /// Best prices weighted by the opposite side's best volume
    Microprice,
}

impl PriceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceMethod::Mid => "mid",
            PriceMethod::Last => "last",
            PriceMethod::Microprice => "microprice",
        }
    }

    /// Price for one row; None when the book is one-sided and nothing traded
    pub fn compute(
        &self,
        best_bid: Option<(Price, Volume)>,
        best_ask: Option<(Price, Volume)>,
        last_trade: Option<Price>,
    ) -> Option<Price> {
        let mid = match (best_bid, best_ask) {
            (Some((bid, _)), Some((ask, _))) => Some(Price::midpoint(bid, ask)),
            _ => None,
        };
        match self {
            PriceMethod::Mid => mid,
            PriceMethod::Last => last_trade.or(mid),
            PriceMethod::Microprice => match (best_bid, best_ask) {
                (Some((bid, bid_volume)), Some((ask, ask_volume))) if bid_volume + ask_volume > 0 => {
                    let bid_w = Decimal::from(bid_volume);
                    let ask_w = Decimal::from(ask_volume);
                    let weighted = (bid.as_decimal() * ask_w + ask.as_decimal() * bid_w) / (bid_w + ask_w);
                    Some(Price::new(weighted.round_dp(8)))
                }
                _ => mid,
            },
        }
    }
}

impl FromStr for PriceMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mid" => Ok(PriceMethod::Mid),
            "last" => Ok(PriceMethod::Last),
            "microprice" => Ok(PriceMethod::Microprice),
            _ => Err(ConfigError::UnknownPriceMethod(s.to_string())),
        }
    }
}

impl fmt::Display for PriceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Book and trade state at the end of one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    /// Tick start, epoch ms
    pub time: i64,
    pub duration_ms: i64,
    pub phase: Phase,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    pub bid_volume: Volume,
    pub ask_volume: Volume,
    /// Per the configured price method
    pub price: Option<Price>,
    pub reference_price: Price,
    /// Fills executed during the tick, auction fills included
    pub trades: u64,
    pub traded_volume: Volume,
    pub last_trade_price: Option<Price>,
}

impl TickSnapshot {
    /// One CSV row matching `CSV_HEADER`
    pub fn csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            self.time,
            format_time(self.time),
            opt(self.best_bid),
            self.bid_volume,
            opt(self.best_ask),
            self.ask_volume,
            opt(self.price),
            self.trades,
            self.traded_volume,
        )
    }
}

fn opt(price: Option<Price>) -> String {
    price.map(|p| p.to_string()).unwrap_or_default()
}

/// Epoch milliseconds as an ISO-8601 UTC time
fn format_time(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
        .unwrap_or_default()
}

/// Sink for per-tick snapshots
///
/// Called once per tick in time order. Collectors must not feed anything
/// back into the run.
pub trait ReportCollector {
    fn record(&mut self, snapshot: TickSnapshot);

    /// Called once after the last tick
    fn finish(&mut self) -> Result<(), SimError> {
        Ok(())
    }
}

impl ReportCollector for Vec<TickSnapshot> {
    fn record(&mut self, snapshot: TickSnapshot) {
        self.push(snapshot);
    }
}

/// Append-only sequence of tick snapshots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    snapshots: Vec<TickSnapshot>,
}

impl SimulationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> &[TickSnapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn last(&self) -> Option<&TickSnapshot> {
        self.snapshots.last()
    }

    /// Fills across every tick
    pub fn total_trades(&self) -> u64 {
        self.snapshots.iter().map(|s| s.trades).sum()
    }

    /// Volume traded across every tick
    pub fn total_volume(&self) -> Volume {
        self.snapshots.iter().map(|s| s.traded_volume).sum()
    }

    /// Write the CSV rendering to any writer
    pub fn write_csv<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(writer, "{}", CSV_HEADER)?;
        for snapshot in &self.snapshots {
            writeln!(writer, "{}", snapshot.csv_row())?;
        }
        writer.flush()
    }

    /// CSV rendering as a string
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(64 * (self.snapshots.len() + 1));
        out.push_str(CSV_HEADER);
        out.push('\n');
        for snapshot in &self.snapshots {
            out.push_str(&snapshot.csv_row());
            out.push('\n');
        }
        out
    }

    /// Write the CSV rendering to a file
    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| SimError::Report {
            message: format!("{}: {}", path.display(), e),
        })?;
        self.write_csv(io::BufWriter::new(file)).map_err(|e| SimError::Report {
            message: format!("{}: {}", path.display(), e),
        })
    }
}

impl ReportCollector for SimulationReport {
    fn record(&mut self, snapshot: TickSnapshot) {
        self.snapshots.push(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Price {
        s.parse().unwrap()
    }

    fn snapshot(time: i64, trades: u64) -> TickSnapshot {
        TickSnapshot {
            time,
            duration_ms: 100,
            phase: Phase::Continuous,
            best_bid: Some(p("100.00")),
            best_ask: Some(p("100.01")),
            bid_volume: 10,
            ask_volume: 30,
            price: Some(p("100.005")),
            reference_price: p("100.00"),
            trades,
            traded_volume: trades * 5,
            last_trade_price: None,
        }
    }

    #[test]
    fn test_mid_price() {
        let price = PriceMethod::Mid.compute(Some((p("100.00"), 10)), Some((p("100.01"), 30)), None);
        assert_eq!(price, Some(p("100.005")));
    }

    #[test]
    fn test_mid_price_one_sided() {
        assert_eq!(PriceMethod::Mid.compute(Some((p("100.00"), 10)), None, None), None);
    }

    #[test]
    fn test_last_price_falls_back_to_mid() {
        let bid = Some((p("100.00"), 10));
        let ask = Some((p("100.02"), 10));
        assert_eq!(PriceMethod::Last.compute(bid, ask, Some(p("99.99"))), Some(p("99.99")));
        assert_eq!(PriceMethod::Last.compute(bid, ask, None), Some(p("100.01")));
    }

    #[test]
    fn test_microprice_leans_toward_thin_side() {
        // Heavy bid, thin ask: price sits closer to the ask
        let price = PriceMethod::Microprice
            .compute(Some((p("100.00"), 30)), Some((p("100.04"), 10)), None)
            .unwrap();
        assert_eq!(price, p("100.03"));
    }

    #[test]
    fn test_parse_price_method() {
        assert_eq!("mid".parse::<PriceMethod>().unwrap(), PriceMethod::Mid);
        assert_eq!("Microprice".parse::<PriceMethod>().unwrap(), PriceMethod::Microprice);
        assert!(matches!("vwap".parse::<PriceMethod>(), Err(ConfigError::UnknownPriceMethod(_))));
    }

    #[test]
    fn test_csv_row() {
        let row = snapshot(1_500, 2).csv_row();
        assert_eq!(row, "1500,1970-01-01T00:00:01.500Z,100.00,10,100.01,30,100.005,2,10");
    }

    #[test]
    fn test_csv_row_empty_side() {
        let mut s = snapshot(0, 0);
        s.best_ask = None;
        s.ask_volume = 0;
        s.price = None;
        assert_eq!(s.csv_row(), "0,1970-01-01T00:00:00.000Z,100.00,10,,0,,0,0");
    }

    #[test]
    fn test_report_collects_in_order() {
        let mut report = SimulationReport::new();
        report.record(snapshot(0, 1));
        report.record(snapshot(100, 3));
        assert_eq!(report.len(), 2);
        assert_eq!(report.total_trades(), 4);
        assert_eq!(report.total_volume(), 20);
        assert_eq!(report.last().unwrap().time, 100);

        let csv = report.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
    }

    #[test]
    fn test_write_csv_matches_to_csv() {
        let mut report = SimulationReport::new();
        report.record(snapshot(0, 1));
        let mut buf = Vec::new();
        report.write_csv(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), report.to_csv());
    }

    #[test]
    fn test_save_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut report = SimulationReport::new();
        report.record(snapshot(0, 0));
        report.save_csv(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), report.to_csv());

        let err = report.save_csv(dir.path().join("missing/out.csv")).unwrap_err();
        assert!(matches!(err, SimError::Report { .. }));
    }
}
