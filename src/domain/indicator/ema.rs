//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) positions are undefined.

use crate::domain::indicator::{closes, zip_points, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let values = ema_values(&closes(bars), period);
    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values: zip_points(bars, values, IndicatorValue::Simple),
    }
}

/// EMA over a plain value sequence. Output has the same length as the input.
pub(crate) fn ema_values(input: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; input.len()];
    if period == 0 || input.len() < period {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = input[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(ema);

    for i in period..input.len() {
        ema = input[i] * k + ema * (1.0 - k);
        out[i] = Some(ema);
    }

    out
}
