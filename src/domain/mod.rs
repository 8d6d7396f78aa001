//! Core domain types and logic.

pub mod ohlcv;
pub mod period;
pub mod series;
pub mod resample;
pub mod indicator;
pub mod signal;
pub mod evaluation;
pub mod config_validation;
pub mod error;
