//! CSV file data adapter.
//!
//! One file per symbol and interval: `{data_dir}/{SYMBOL}_{interval}.csv`
//! with header `timestamp,open,high,low,close,volume`.

use crate::domain::error::SignalbenchError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize, Deserialize)]
struct BarRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, symbol: &str, interval: &str) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", symbol.to_uppercase(), interval))
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS` or a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Read every bar in `path`, sorted by time with duplicate timestamps removed.
pub fn read_bars(path: &Path, symbol: &str) -> Result<Vec<OhlcvBar>, SignalbenchError> {
    let fetch_error = |reason: String| SignalbenchError::DataFetch {
        symbol: symbol.to_string(),
        reason,
    };

    let mut rdr = csv::Reader::from_path(path)
        .map_err(|e| fetch_error(format!("failed to read {}: {}", path.display(), e)))?;

    let mut bars = Vec::new();
    for (line, result) in rdr.deserialize::<BarRecord>().enumerate() {
        let record = result.map_err(|e| fetch_error(format!("CSV parse error: {e}")))?;
        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| {
            fetch_error(format!(
                "invalid timestamp `{}` on row {}",
                record.timestamp,
                line + 1
            ))
        })?;
        bars.push(OhlcvBar {
            symbol: symbol.to_string(),
            timestamp,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);
    Ok(bars)
}

/// Write `bars` in the same layout [`read_bars`] reads.
pub fn write_bars(path: &Path, bars: &[OhlcvBar]) -> Result<(), SignalbenchError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path).map_err(io::Error::from)?;
    for bar in bars {
        wtr.serialize(BarRecord {
            timestamp: bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        })
        .map_err(io::Error::from)?;
    }
    wtr.flush()?;
    Ok(())
}

impl DataPort for CsvAdapter {
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Vec<OhlcvBar>, SignalbenchError> {
        let path = self.csv_path(symbol, interval);
        if !path.exists() {
            return Err(SignalbenchError::NoData {
                symbol: symbol.to_string(),
            });
        }

        let bars: Vec<OhlcvBar> = read_bars(&path, symbol)?
            .into_iter()
            .filter(|b| (start..=end).contains(&b.date()))
            .collect();

        tracing::debug!(symbol, bars = bars.len(), path = %path.display(), "read csv bars");
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "timestamp,open,high,low,close,volume\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-17 00:00:00,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("AAPL_1d.csv"), csv_content).unwrap();
        fs::write(path.join("MSFT_1d.csv"), "timestamp,open,high,low,close,volume\n").unwrap();
        fs::write(
            path.join("BAD_1d.csv"),
            "timestamp,open,high,low,close,volume\n15/01/2024,1,1,1,1,1\n",
        )
        .unwrap();

        (dir, path)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn fetch_returns_sorted_bars() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch("AAPL", day(15), day(17), "1d").unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date(), day(15));
        assert_eq!(bars[0].symbol, "AAPL");
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000.0);
        assert_eq!(bars[2].date(), day(17));
    }

    #[test]
    fn fetch_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch("aapl", day(16), day(16), "1d").unwrap();

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date(), day(16));
    }

    #[test]
    fn missing_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch("XYZ", day(1), day(31), "1d").unwrap_err();
        assert!(matches!(err, SignalbenchError::NoData { symbol } if symbol == "XYZ"));
    }

    #[test]
    fn header_only_file_is_empty() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(adapter.fetch("MSFT", day(1), day(31), "1d").unwrap().is_empty());
    }

    #[test]
    fn bad_timestamp_is_fetch_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let err = adapter.fetch("BAD", day(1), day(31), "1d").unwrap_err();
        assert!(matches!(err, SignalbenchError::DataFetch { .. }));
    }

    #[test]
    fn written_bars_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache").join("AAPL.csv");
        let bars = read_bars(&setup_test_data().1.join("AAPL_1d.csv"), "AAPL").unwrap();

        write_bars(&path, &bars).unwrap();
        assert_eq!(read_bars(&path, "AAPL").unwrap(), bars);
    }
}
