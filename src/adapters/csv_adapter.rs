//! CSV file data adapter.
//!
//! Reads `<dir>/<SYMBOL>.csv` with the header
//! `timestamp,open,high,low,close,volume`. Timestamps are RFC 3339 or Unix
//! seconds. Files hold bars at whatever granularity they were exported at;
//! the requested interval is not checked.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::period::{Interval, Period};
use crate::ports::data_port::DataPort;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, SignalError> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0).ok_or_else(|| SignalError::DataSource {
            reason: format!("timestamp out of range: {}", raw),
        });
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| SignalError::DataSource {
            reason: format!("invalid timestamp '{}': {}", raw, e),
        })
}

fn parse_field(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, SignalError> {
    record
        .get(index)
        .ok_or_else(|| SignalError::DataSource {
            reason: format!("missing {} column", name),
        })?
        .trim()
        .parse()
        .map_err(|e| SignalError::DataSource {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<OhlcvBar>, SignalError> {
        let path = self.csv_path(symbol);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(symbol = %symbol, path = %path.display(), "no csv file");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(SignalError::DataSource {
                    reason: format!("failed to read {}: {}", path.display(), e),
                })
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SignalError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let ts_str = record.get(0).ok_or_else(|| SignalError::DataSource {
                reason: "missing timestamp column".into(),
            })?;

            let bar = OhlcvBar {
                timestamp: parse_timestamp(ts_str)?,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_field(&record, 5, "volume")?,
            };

            if !bar.is_consistent() {
                warn!(symbol = %symbol, timestamp = %bar.timestamp, "skipping inconsistent bar");
                continue;
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.timestamp);

        if let Some(newest) = bars.last().map(|b| b.timestamp) {
            let cutoff = newest - period.lookback();
            bars.retain(|b| b.timestamp >= cutoff);
        }

        debug!(symbol = %symbol, %period, %interval, bars = bars.len(), "loaded csv bars");
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "timestamp,open,high,low,close,volume\n\
            2024-01-15T14:30:00Z,100.0,110.0,90.0,105.0,50000\n\
            2024-01-15T15:30:00Z,105.0,115.0,100.0,110.0,60000\n\
            1705336200,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("BHP.csv"), csv_content).unwrap();
        fs::write(path.join("CBA.csv"), "timestamp,open,high,low,close,volume\n").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_ohlcv_returns_correct_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter
            .fetch_ohlcv("BHP", Period::default(), Interval::FETCH)
            .unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap());
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000.0);
        // 1705336200 is 2024-01-15T16:30:00Z
        assert_eq!(bars[2].timestamp, Utc.with_ymd_and_hms(2024, 1, 15, 16, 30, 0).unwrap());
    }

    #[test]
    fn rows_are_sorted_by_timestamp() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("X.csv"),
            "timestamp,open,high,low,close,volume\n\
             2024-01-02T00:00:00Z,2,2,2,2,1\n\
             2024-01-01T00:00:00Z,1,1,1,1,1\n",
        )
        .unwrap();

        let bars = CsvAdapter::new(dir.path().to_path_buf())
            .fetch_ohlcv("X", Period::default(), Interval::FETCH)
            .unwrap();
        assert!(bars[0].timestamp < bars[1].timestamp);
        assert_eq!(bars[0].close, 1.0);
    }

    #[test]
    fn period_drops_rows_older_than_lookback() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("X.csv"),
            "timestamp,open,high,low,close,volume\n\
             2023-01-01T00:00:00Z,1,1,1,1,1\n\
             2024-05-01T00:00:00Z,2,2,2,2,1\n\
             2024-06-01T00:00:00Z,3,3,3,3,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let month = adapter.fetch_ohlcv("X", Period::OneMonth, Interval::FETCH).unwrap();
        assert_eq!(month.len(), 1);

        let half_year = adapter.fetch_ohlcv("X", Period::SixMonths, Interval::FETCH).unwrap();
        assert_eq!(half_year.len(), 2);
    }

    #[test]
    fn inconsistent_rows_are_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("X.csv"),
            "timestamp,open,high,low,close,volume\n\
             2024-01-01T00:00:00Z,10,9,8,9,1\n\
             2024-01-01T01:00:00Z,9,10,8,9,1\n",
        )
        .unwrap();

        let bars = CsvAdapter::new(dir.path().to_path_buf())
            .fetch_ohlcv("X", Period::default(), Interval::FETCH)
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].high, 10.0);
    }

    #[test]
    fn fetch_ohlcv_returns_empty_for_missing_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_ohlcv("XYZ", Period::default(), Interval::FETCH).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn header_only_file_is_empty() {
        let (_dir, path) = setup_test_data();
        let bars = CsvAdapter::new(path)
            .fetch_ohlcv("CBA", Period::default(), Interval::FETCH)
            .unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn malformed_number_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("X.csv"),
            "timestamp,open,high,low,close,volume\n2024-01-01T00:00:00Z,abc,1,1,1,1\n",
        )
        .unwrap();

        let err = CsvAdapter::new(dir.path().to_path_buf())
            .fetch_ohlcv("X", Period::default(), Interval::FETCH)
            .unwrap_err();
        assert!(err.to_string().contains("invalid open value"));
    }

    #[test]
    fn malformed_timestamp_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("X.csv"),
            "timestamp,open,high,low,close,volume\nyesterday,1,1,1,1,1\n",
        )
        .unwrap();

        let err = CsvAdapter::new(dir.path().to_path_buf())
            .fetch_ohlcv("X", Period::default(), Interval::FETCH)
            .unwrap_err();
        assert!(matches!(err, SignalError::DataSource { .. }));
    }
}
