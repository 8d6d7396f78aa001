//! Sell signal evaluation over the latest indicator readings.
//!
//! Three independent conditions, each false when its inputs are undefined:
//! 1. close > upper Bollinger band
//! 2. RSI > overbought threshold
//! 3. MACD line < MACD signal line

use crate::domain::indicator::bollinger::{DEFAULT_MULT_X100, DEFAULT_PERIOD};
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::{compute_indicators, Deviation, IndicatorType, IndicatorValue};
use crate::domain::series::Series;

pub const DEFAULT_RSI_PERIOD: usize = 10;
pub const DEFAULT_RSI_OVERBOUGHT: f64 = 70.0;
pub const DEFAULT_MIN_BARS: usize = 100;

/// Indicator windows and thresholds for one evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalParams {
    pub bollinger_period: usize,
    /// Band width multiplier in hundredths; configured values are rounded to 0.01.
    pub bollinger_mult_x100: u32,
    pub bollinger_deviation: Deviation,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Resampled bars required before indicators are computed.
    pub min_bars: usize,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            bollinger_period: DEFAULT_PERIOD,
            bollinger_mult_x100: DEFAULT_MULT_X100,
            bollinger_deviation: Deviation::Sample,
            rsi_period: DEFAULT_RSI_PERIOD,
            rsi_overbought: DEFAULT_RSI_OVERBOUGHT,
            macd_fast: DEFAULT_FAST,
            macd_slow: DEFAULT_SLOW,
            macd_signal: DEFAULT_SIGNAL,
            min_bars: DEFAULT_MIN_BARS,
        }
    }
}

impl SignalParams {
    pub fn bollinger(&self) -> IndicatorType {
        IndicatorType::Bollinger {
            period: self.bollinger_period,
            stddev_mult_x100: self.bollinger_mult_x100,
            deviation: self.bollinger_deviation,
        }
    }

    pub fn rsi(&self) -> IndicatorType {
        IndicatorType::Rsi(self.rsi_period)
    }

    pub fn macd(&self) -> IndicatorType {
        IndicatorType::Macd {
            fast: self.macd_fast,
            slow: self.macd_slow,
            signal: self.macd_signal,
        }
    }

    pub fn indicator_types(&self) -> [IndicatorType; 3] {
        [self.bollinger(), self.rsi(), self.macd()]
    }
}

/// Most recent indicator readings for one symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub close: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_middle: Option<f64>,
    pub bollinger_lower: Option<f64>,
    pub rsi: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
}

impl IndicatorSnapshot {
    pub fn from_series(series: &Series, params: &SignalParams) -> Self {
        let bars = series.bars();
        let indicators = compute_indicators(bars, &params.indicator_types());
        let mut snapshot = IndicatorSnapshot {
            close: series.last().map(|b| b.close),
            ..Default::default()
        };

        if let Some(IndicatorValue::Bollinger {
            upper,
            middle,
            lower,
        }) = indicators.get(&params.bollinger()).and_then(|s| s.latest())
        {
            snapshot.bollinger_upper = Some(*upper);
            snapshot.bollinger_middle = Some(*middle);
            snapshot.bollinger_lower = Some(*lower);
        }

        if let Some(IndicatorValue::Simple(rsi)) =
            indicators.get(&params.rsi()).and_then(|s| s.latest())
        {
            snapshot.rsi = Some(*rsi);
        }

        if let Some(IndicatorValue::Macd {
            line,
            signal,
            histogram,
        }) = indicators.get(&params.macd()).and_then(|s| s.latest())
        {
            snapshot.macd_line = Some(*line);
            snapshot.macd_signal = *signal;
            snapshot.macd_histogram = *histogram;
        }

        snapshot
    }
}

/// `[price_above_upper_band, rsi_overbought, macd_bearish_crossover]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConditionVector(pub [bool; 3]);

impl ConditionVector {
    pub fn price_above_upper_band(&self) -> bool {
        self.0[0]
    }

    pub fn rsi_overbought(&self) -> bool {
        self.0[1]
    }

    pub fn macd_bearish_crossover(&self) -> bool {
        self.0[2]
    }

    /// Number of conditions met, 0 to 3.
    pub fn score(&self) -> usize {
        self.0.iter().filter(|c| **c).count()
    }

    pub fn strength(&self) -> SignalStrength {
        match self.score() {
            3 => SignalStrength::Strong,
            2 => SignalStrength::Moderate,
            _ => SignalStrength::NoSignal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalStrength {
    Strong,
    Moderate,
    NoSignal,
}

pub fn evaluate_conditions(snapshot: &IndicatorSnapshot, params: &SignalParams) -> ConditionVector {
    let above_band = matches!(
        (snapshot.close, snapshot.bollinger_upper),
        (Some(close), Some(upper)) if close > upper
    );
    let overbought = matches!(snapshot.rsi, Some(rsi) if rsi > params.rsi_overbought);
    let bearish = matches!(
        (snapshot.macd_line, snapshot.macd_signal),
        (Some(line), Some(signal)) if line < signal
    );
    ConditionVector([above_band, overbought, bearish])
}
