//! Window mean and standard deviation helpers.
//!
//! Sample deviation divides the squared deviations by n-1, population
//! deviation by n.

use crate::domain::error::SignalError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Deviation {
    #[default]
    Sample,
    Population,
}

impl Deviation {
    fn divisor(&self, n: usize) -> usize {
        match self {
            Deviation::Sample => n.saturating_sub(1),
            Deviation::Population => n,
        }
    }
}

impl fmt::Display for Deviation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deviation::Sample => f.write_str("sample"),
            Deviation::Population => f.write_str("population"),
        }
    }
}

impl FromStr for Deviation {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sample" => Ok(Deviation::Sample),
            "population" => Ok(Deviation::Population),
            other => Err(SignalError::ConfigInvalid {
                section: "signal".into(),
                key: "bollinger_deviation".into(),
                reason: format!("expected 'sample' or 'population', got '{other}'"),
            }),
        }
    }
}

pub fn mean(window: &[f64]) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    Some(window.iter().sum::<f64>() / window.len() as f64)
}

/// Standard deviation of `window` around `mean`. `None` when the divisor
/// would be zero (an empty window, or a single value under `Sample`).
pub fn stddev(window: &[f64], mean: f64, deviation: Deviation) -> Option<f64> {
    let divisor = deviation.divisor(window.len());
    if divisor == 0 {
        return None;
    }
    let sum_sq: f64 = window
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum();
    Some((sum_sq / divisor as f64).sqrt())
}
