//! Configuration validation.
//!
//! Validates all config fields before an analysis runs. Missing keys fall
//! back to their defaults, so only values that are present can fail.

use crate::domain::error::SignalError;
use crate::domain::indicator::Deviation;
use crate::domain::period::Period;
use crate::ports::config_port::ConfigPort;

pub const DATA_SOURCES: [&str; 2] = ["yahoo", "csv"];

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), SignalError> {
    validate_period(config)?;
    validate_timeout(config)?;
    validate_max_concurrency(config)?;
    validate_windows(config)?;
    validate_macd_order(config)?;
    validate_bollinger_mult(config)?;
    validate_bollinger_deviation(config)?;
    validate_rsi_overbought(config)?;
    validate_utc_offset(config)?;
    validate_data_source(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SignalError {
    SignalError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_period(config: &dyn ConfigPort) -> Result<(), SignalError> {
    match config.get_non_empty("analysis", "period") {
        Some(p) => p
            .parse::<Period>()
            .map(|_| ())
            .map_err(|e| invalid("analysis", "period", e.to_string())),
        None => Ok(()),
    }
}

fn validate_timeout(config: &dyn ConfigPort) -> Result<(), SignalError> {
    let value = config.get_int("analysis", "timeout_secs", 30);
    if value <= 0 {
        return Err(invalid("analysis", "timeout_secs", "timeout_secs must be positive"));
    }
    Ok(())
}

fn validate_max_concurrency(config: &dyn ConfigPort) -> Result<(), SignalError> {
    let value = config.get_int("analysis", "max_concurrency", 4);
    if value < 1 {
        return Err(invalid("analysis", "max_concurrency", "max_concurrency must be at least 1"));
    }
    Ok(())
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), SignalError> {
    for (key, default) in [
        ("bollinger_period", 100),
        ("rsi_period", 10),
        ("macd_fast", 8),
        ("macd_slow", 21),
        ("macd_signal", 5),
        ("min_bars", 100),
    ] {
        if config.get_int("signal", key, default) < 1 {
            return Err(invalid("signal", key, format!("{} must be a positive integer", key)));
        }
    }
    Ok(())
}

fn validate_macd_order(config: &dyn ConfigPort) -> Result<(), SignalError> {
    let fast = config.get_int("signal", "macd_fast", 8);
    let slow = config.get_int("signal", "macd_slow", 21);
    if fast >= slow {
        return Err(invalid("signal", "macd_fast", "macd_fast must be less than macd_slow"));
    }
    Ok(())
}

fn validate_bollinger_mult(config: &dyn ConfigPort) -> Result<(), SignalError> {
    let value = config.get_double("signal", "bollinger_mult", 2.0);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid("signal", "bollinger_mult", "bollinger_mult must be positive"));
    }
    if (value * 100.0).round() < 1.0 {
        return Err(invalid(
            "signal",
            "bollinger_mult",
            "bollinger_mult must be at least 0.01",
        ));
    }
    Ok(())
}

fn validate_bollinger_deviation(config: &dyn ConfigPort) -> Result<(), SignalError> {
    match config.get_non_empty("signal", "bollinger_deviation") {
        Some(d) => d.parse::<Deviation>().map(|_| ()),
        None => Ok(()),
    }
}

fn validate_rsi_overbought(config: &dyn ConfigPort) -> Result<(), SignalError> {
    let value = config.get_double("signal", "rsi_overbought", 70.0);
    if !(value > 0.0 && value < 100.0) {
        return Err(invalid(
            "signal",
            "rsi_overbought",
            "rsi_overbought must be between 0 and 100",
        ));
    }
    Ok(())
}

fn validate_utc_offset(config: &dyn ConfigPort) -> Result<(), SignalError> {
    let value = config.get_int("resample", "utc_offset_minutes", 0);
    if !(-24 * 60..=24 * 60).contains(&value) {
        return Err(invalid(
            "resample",
            "utc_offset_minutes",
            "utc_offset_minutes must be within one day",
        ));
    }
    Ok(())
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), SignalError> {
    let source = config
        .get_non_empty("data", "source")
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "yahoo".to_string());

    if !DATA_SOURCES.contains(&source.as_str()) {
        return Err(invalid(
            "data",
            "source",
            format!("unknown data source '{}' (expected yahoo or csv)", source),
        ));
    }
    if source == "csv" && config.get_non_empty("data", "csv_dir").is_none() {
        return Err(SignalError::ConfigMissing {
            section: "data".to_string(),
            key: "csv_dir".to_string(),
        });
    }
    Ok(())
}
