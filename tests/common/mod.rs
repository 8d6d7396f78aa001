#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
pub use sellsignal::domain::ohlcv::OhlcvBar;
use sellsignal::domain::error::SignalError;
use sellsignal::domain::period::{Interval, Period};
use sellsignal::ports::data_port::DataPort;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub panics: HashSet<String>,
    pub delays: HashMap<String, std::time::Duration>,
    pub calls: Mutex<Vec<String>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            panics: HashSet::new(),
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn with_panic(mut self, symbol: &str) -> Self {
        self.panics.insert(symbol.to_string());
        self
    }

    pub fn with_delay(mut self, symbol: &str, delay: std::time::Duration) -> Self {
        self.delays.insert(symbol.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        _period: Period,
        interval: Interval,
    ) -> Result<Vec<OhlcvBar>, SignalError> {
        assert_eq!(interval, Interval::FETCH);
        self.calls.lock().unwrap().push(symbol.to_string());

        if let Some(delay) = self.delays.get(symbol) {
            std::thread::sleep(*delay);
        }
        if self.panics.contains(symbol) {
            panic!("mock data port panicked for {}", symbol);
        }
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SignalError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

/// Monday 2024-01-01 00:00 UTC, aligned to every 4h bucket boundary.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn make_bar(ts: DateTime<Utc>, close: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp: ts,
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume: 1_000.0,
    }
}

/// Hourly bars whose closes come from `price(i)`.
pub fn hourly_bars(count: usize, price: impl Fn(usize) -> f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| make_bar(start() + Duration::hours(i as i64), price(i)))
        .collect()
}

/// Hourly bars filling exactly `buckets` four-hour buckets with a gentle wave.
pub fn bars_for_buckets(buckets: usize) -> Vec<OhlcvBar> {
    hourly_bars(buckets * 4, |i| 100.0 + (i as f64 * 0.2).sin() * 3.0)
}

/// A long flat stretch followed by a steep rally into the final buckets.
pub fn rally_bars(buckets: usize) -> Vec<OhlcvBar> {
    let hours = buckets * 4;
    let rally_start = hours - 16;
    hourly_bars(hours, |i| {
        let wave = 100.0 + (i as f64 * 0.5).sin() * 0.5;
        if i < rally_start {
            wave
        } else {
            wave + (i - rally_start + 1) as f64 * 2.0
        }
    })
}
