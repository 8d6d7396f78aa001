//! Domain error types.

use std::time::Duration;

/// Why a single symbol could not be evaluated.
///
/// The `Display` form is the failure reason surfaced to callers, so the
/// messages here are part of the batch contract.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("No data available")]
    NoData,

    #[error("Insufficient data: {bars} points (need {minimum}+)")]
    InsufficientHistory { bars: usize, minimum: usize },

    #[error("Timed out after {}", format_limit(.limit))]
    Timeout { limit: Duration },

    #[error("{0}")]
    ComputeOrFetch(String),
}

/// Top-level error type for sellsignal.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid period '{0}' (expected one of 1mo, 3mo, 6mo, 1y)")]
    InvalidPeriod(String),

    #[error("invalid resample width: {reason}")]
    InvalidResample { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Whole seconds print as `30s`, anything finer as milliseconds.
fn format_limit(limit: &Duration) -> String {
    if limit.subsec_nanos() == 0 {
        format!("{}s", limit.as_secs())
    } else {
        format!("{}ms", limit.as_millis())
    }
}

impl From<SignalError> for EvaluationError {
    fn from(err: SignalError) -> Self {
        match err {
            SignalError::DataSource { reason } => EvaluationError::ComputeOrFetch(reason),
            other => EvaluationError::ComputeOrFetch(other.to_string()),
        }
    }
}

impl From<&SignalError> for std::process::ExitCode {
    fn from(err: &SignalError) -> Self {
        let code: u8 = match err {
            SignalError::Io(_) => 1,
            SignalError::ConfigParse { .. }
            | SignalError::ConfigMissing { .. }
            | SignalError::ConfigInvalid { .. } => 2,
            SignalError::DataSource { .. } => 3,
            SignalError::InvalidPeriod(_) | SignalError::InvalidResample { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
