//! Per-symbol bar series.

use crate::domain::ohlcv::OhlcvBar;
use chrono::{DateTime, Utc};

/// Bars for one symbol, ascending by timestamp with no duplicate timestamps.
/// Missing periods are simply absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub symbol: String,
    bars: Vec<OhlcvBar>,
}

impl Series {
    /// Sorts `bars` ascending and keeps the last occurrence of any repeated
    /// timestamp.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<OhlcvBar>) -> Self {
        // stable sort keeps source order among equal timestamps
        bars.sort_by_key(|b| b.timestamp);
        let mut deduped: Vec<OhlcvBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self {
            symbol: symbol.into(),
            bars: deduped,
        }
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    /// First and last timestamp, if any bars exist.
    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.bars.first(), self.bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }
}
