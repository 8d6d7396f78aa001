//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the sample deviation (n-1) unless `Deviation::Population` is
//! requested.
//!
//! Default parameters: period=100, multiplier=2.0
//! Warmup: first (period-1) positions are undefined.

use crate::domain::indicator::stddev::{mean, stddev, Deviation};
use crate::domain::indicator::{closes, zip_points, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 100;
pub const DEFAULT_MULT_X100: u32 = 200;

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    period: usize,
    stddev_mult_x100: u32,
    deviation: Deviation,
) -> IndicatorSeries {
    let prices = closes(bars);
    let mult = stddev_mult_x100 as f64 / 100.0;

    let bands: Vec<Option<(f64, f64, f64)>> = (0..prices.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                return None;
            }
            let window = &prices[i + 1 - period..=i];
            let middle = mean(window)?;
            let sd = stddev(window, middle, deviation)?;
            Some((middle + mult * sd, middle, middle - mult * sd))
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
            deviation,
        },
        values: zip_points(bars, bands, |(upper, middle, lower)| {
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            }
        }),
    }
}
