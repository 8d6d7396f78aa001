//! Fixed-width time bucket resampling.
//!
//! Each output bar aggregates the raw bars falling in one bucket:
//! - open: first raw open
//! - high: max raw high
//! - low: min raw low
//! - close: last raw close
//! - volume: sum of raw volumes
//!
//! Bucket boundaries sit at `offset + k * width` from the Unix epoch, so
//! alignment never depends on where the data starts. Empty buckets are not
//! emitted and nothing is forward-filled. Output bars are labelled with their
//! bucket's start.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::period::Interval;
use crate::domain::series::Series;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSpec {
    width_secs: i64,
    offset_secs: i64,
}

impl BucketSpec {
    pub fn new(width: Duration, offset: Duration) -> Result<Self, SignalError> {
        let width_secs = width.num_seconds();
        if width_secs <= 0 {
            return Err(SignalError::InvalidResample {
                reason: format!("bucket width must be at least one second, got {width}"),
            });
        }
        if width != Duration::seconds(width_secs) {
            return Err(SignalError::InvalidResample {
                reason: format!("bucket width must be whole seconds, got {width}"),
            });
        }
        Ok(Self {
            width_secs,
            offset_secs: offset.num_seconds(),
        })
    }

    /// Buckets aligned to UTC midnight.
    pub fn aligned(width: Duration) -> Result<Self, SignalError> {
        Self::new(width, Duration::zero())
    }

    pub fn width(&self) -> Duration {
        Duration::seconds(self.width_secs)
    }

    pub fn bucket_start(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let rem = (ts.timestamp() - self.offset_secs).rem_euclid(self.width_secs);
        ts - Duration::seconds(rem) - Duration::nanoseconds(i64::from(ts.timestamp_subsec_nanos()))
    }
}

impl Default for BucketSpec {
    /// Four-hour buckets aligned to UTC midnight.
    fn default() -> Self {
        Self {
            width_secs: Interval::RESAMPLE.duration().num_seconds(),
            offset_secs: 0,
        }
    }
}

pub fn resample(series: &Series, spec: &BucketSpec) -> Series {
    let mut out: Vec<OhlcvBar> = Vec::new();

    for bar in series.bars() {
        let start = spec.bucket_start(bar.timestamp);
        match out.last_mut() {
            Some(current) if current.timestamp == start => {
                current.high = current.high.max(bar.high);
                current.low = current.low.min(bar.low);
                current.close = bar.close;
                current.volume += bar.volume;
            }
            _ => out.push(OhlcvBar {
                timestamp: start,
                ..bar.clone()
            }),
        }
    }

    Series::new(series.symbol.clone(), out)
}
