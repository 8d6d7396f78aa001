//! Lookback periods and bar intervals understood by the data sources.

use crate::domain::error::SignalError;
use chrono::Duration;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Period {
    OneMonth,
    ThreeMonths,
    #[default]
    SixMonths,
    OneYear,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
        }
    }

    /// Calendar span covered by the period, used by sources that filter
    /// locally instead of asking a remote service for a range.
    pub fn lookback(&self) -> Duration {
        match self {
            Period::OneMonth => Duration::days(30),
            Period::ThreeMonths => Duration::days(91),
            Period::SixMonths => Duration::days(182),
            Period::OneYear => Duration::days(365),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == token)
            .ok_or_else(|| SignalError::InvalidPeriod(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    OneHour,
    FourHours,
}

impl Interval {
    /// Granularity requested from the data source.
    pub const FETCH: Interval = Interval::OneHour;
    /// Bucket width the fetched bars are resampled to.
    pub const RESAMPLE: Interval = Interval::FourHours;

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Interval::OneHour => Duration::hours(1),
            Interval::FourHours => Duration::hours(4),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
