//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=8, slow=21, signal=5
//! The line is defined from index max(fast, slow) - 1, the signal and
//! histogram from max(fast, slow) - 1 + signal - 1.

use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{closes, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 8;
pub const DEFAULT_SLOW: usize = 21;
pub const DEFAULT_SIGNAL: usize = 5;

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let prices = closes(bars);
    let ema_fast = ema_values(&prices, fast);
    let ema_slow = ema_values(&prices, slow);

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    // the line is contiguous once defined, so the signal EMA runs over that tail
    let signal = match line.iter().position(Option::is_some) {
        Some(first) => {
            let defined: Vec<f64> = line[first..].iter().flatten().copied().collect();
            let mut signal = vec![None; first];
            signal.extend(ema_values(&defined, signal_period));
            signal
        }
        None => vec![None; line.len()],
    };

    let values = bars
        .iter()
        .zip(line.iter().zip(&signal))
        .map(|(bar, (line, signal))| IndicatorPoint {
            timestamp: bar.timestamp,
            value: line.map(|line| IndicatorValue::Macd {
                line,
                signal: *signal,
                histogram: signal.map(|s| line - s),
            }),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Macd {
            fast,
            slow,
            signal: signal_period,
        },
        values,
    }
}

pub fn calculate_macd_default(bars: &[OhlcvBar]) -> IndicatorSeries {
    calculate_macd(bars, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
