//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values
//!
//! Positions before an indicator's window has filled carry `None`, never a
//! placeholder number.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod stddev;

pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use stddev::Deviation;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Option<IndicatorValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: Option<f64>,
        histogram: Option<f64>,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
        deviation: Deviation,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at the most recent position, `None` if the series is empty or
    /// the window had not filled by then.
    pub fn latest(&self) -> Option<&IndicatorValue> {
        self.values.last().and_then(|p| p.value.as_ref())
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|p| p.value.is_some()).count()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
                deviation,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                match deviation {
                    Deviation::Sample => write!(f, "BOLLINGER({},{})", period, mult),
                    Deviation::Population => write!(f, "BOLLINGER({},{},POP)", period, mult),
                }
            }
        }
    }
}

pub fn compute_indicator(bars: &[OhlcvBar], indicator_type: &IndicatorType) -> IndicatorSeries {
    match *indicator_type {
        IndicatorType::Ema(period) => calculate_ema(bars, period),
        IndicatorType::Rsi(period) => calculate_rsi(bars, period),
        IndicatorType::Macd { fast, slow, signal } => calculate_macd(bars, fast, slow, signal),
        IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
            deviation,
        } => calculate_bollinger(bars, period, stddev_mult_x100, deviation),
    }
}

pub fn compute_indicators(
    bars: &[OhlcvBar],
    types: &[IndicatorType],
) -> HashMap<IndicatorType, IndicatorSeries> {
    types
        .iter()
        .map(|t| (*t, compute_indicator(bars, t)))
        .collect()
}

/// Closing prices, the input every transform starts from.
pub(crate) fn closes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

pub(crate) fn zip_points<T>(
    bars: &[OhlcvBar],
    values: Vec<Option<T>>,
    wrap: impl Fn(T) -> IndicatorValue,
) -> Vec<IndicatorPoint> {
    bars.iter()
        .zip(values)
        .map(|(bar, v)| IndicatorPoint {
            timestamp: bar.timestamp,
            value: v.map(&wrap),
        })
        .collect()
}
