//! Batch evaluation of sell signals across a symbol list.
//!
//! Each symbol runs the same pipeline independently: fetch hourly bars,
//! resample into buckets, compute the indicator snapshot on the latest bar
//! and evaluate the three sell conditions. Any failure along the way becomes
//! a [`SymbolResult::Failure`] for that symbol only; nothing aborts the batch.

use crate::domain::error::EvaluationError;
use crate::domain::period::{Interval, Period};
use crate::domain::resample::{resample, BucketSpec};
use crate::domain::series::Series;
use crate::domain::signal::{
    evaluate_conditions, ConditionVector, IndicatorSnapshot, SignalParams, SignalStrength,
};
use crate::ports::data_port::DataPort;
use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, info_span, warn};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolResult {
    Success {
        /// The resampled series the indicators were computed on.
        series: Series,
        conditions: ConditionVector,
        indicators: IndicatorSnapshot,
    },
    Failure {
        reason: EvaluationError,
    },
}

impl SymbolResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SymbolResult::Success { .. })
    }

    pub fn conditions(&self) -> Option<&ConditionVector> {
        match self {
            SymbolResult::Success { conditions, .. } => Some(conditions),
            SymbolResult::Failure { .. } => None,
        }
    }

    pub fn indicators(&self) -> Option<&IndicatorSnapshot> {
        match self {
            SymbolResult::Success { indicators, .. } => Some(indicators),
            SymbolResult::Failure { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&EvaluationError> {
        match self {
            SymbolResult::Success { .. } => None,
            SymbolResult::Failure { reason } => Some(reason),
        }
    }

    fn failure(reason: EvaluationError) -> Self {
        SymbolResult::Failure { reason }
    }
}

/// Results keyed by normalized symbol, in first-seen input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    pub entries: Vec<(String, SymbolResult)>,
}

impl BatchResult {
    pub fn get(&self, symbol: &str) -> Option<&SymbolResult> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, result)| result)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SymbolResult)> {
        self.entries.iter().map(|(s, r)| (s.as_str(), r))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for (_, result) in &self.entries {
            match result.conditions().map(ConditionVector::strength) {
                Some(SignalStrength::Strong) => summary.strong += 1,
                Some(SignalStrength::Moderate) => summary.moderate += 1,
                Some(SignalStrength::NoSignal) => summary.no_signal += 1,
                None => summary.failures += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub strong: usize,
    pub moderate: usize,
    pub no_signal: usize,
    pub failures: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.strong + self.moderate + self.no_signal + self.failures
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationConfig {
    pub signal: SignalParams,
    pub buckets: BucketSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimits {
    /// Per-symbol budget for fetch plus compute.
    pub timeout: Duration,
    pub max_in_flight: usize,
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Split a comma-delimited symbol list.
///
/// Tokens are trimmed and uppercased; empty tokens are dropped and repeats
/// keep their first position.
pub fn parse_symbols(input: &str) -> Vec<String> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            continue;
        }
        let symbol = trimmed.to_uppercase();
        if seen.insert(symbol.clone()) {
            symbols.push(symbol);
        }
    }

    symbols
}

/// Run the full pipeline for one symbol. Never panics and never errors.
pub fn evaluate_symbol(
    port: &dyn DataPort,
    symbol: &str,
    period: Period,
    config: &EvaluationConfig,
) -> SymbolResult {
    let _span = info_span!("symbol", symbol = %symbol).entered();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        run_pipeline(port, symbol, period, config)
    }))
    .unwrap_or_else(|payload| {
        Err(EvaluationError::ComputeOrFetch(format!(
            "Evaluation panicked: {}",
            panic_message(payload.as_ref())
        )))
    });

    match result {
        Ok(success) => success,
        Err(reason) => {
            warn!(symbol = %symbol, %reason, "evaluation failed");
            SymbolResult::failure(reason)
        }
    }
}

fn run_pipeline(
    port: &dyn DataPort,
    symbol: &str,
    period: Period,
    config: &EvaluationConfig,
) -> Result<SymbolResult, EvaluationError> {
    let raw = port.fetch_ohlcv(symbol, period, Interval::FETCH)?;
    debug!(symbol = %symbol, bars = raw.len(), "fetched");
    if raw.is_empty() {
        return Err(EvaluationError::NoData);
    }

    let series = resample(&Series::new(symbol, raw), &config.buckets);
    debug!(symbol = %symbol, bars = series.len(), "resampled");

    let minimum = config.signal.min_bars;
    if series.len() < minimum {
        return Err(EvaluationError::InsufficientHistory {
            bars: series.len(),
            minimum,
        });
    }

    let indicators = IndicatorSnapshot::from_series(&series, &config.signal);
    let conditions = evaluate_conditions(&indicators, &config.signal);
    debug!(symbol = %symbol, score = conditions.score(), "evaluated");

    Ok(SymbolResult::Success {
        series,
        conditions,
        indicators,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Evaluate every symbol in `symbols` one after another.
pub fn evaluate(
    port: &dyn DataPort,
    symbols: &str,
    period: Period,
    config: &EvaluationConfig,
) -> BatchResult {
    let symbols = parse_symbols(symbols);
    info!(count = symbols.len(), %period, "evaluating batch");

    let entries = symbols
        .into_iter()
        .map(|symbol| {
            let result = evaluate_symbol(port, &symbol, period, config);
            (symbol, result)
        })
        .collect();

    BatchResult { entries }
}

/// Evaluate symbols on the blocking pool, at most `limits.max_in_flight` at
/// a time, each bounded by `limits.timeout`.
///
/// The permit is released as soon as a symbol finishes or times out, so a
/// hung port call never holds back the rest of the batch. Its blocking worker
/// is detached and runs until the port returns.
pub async fn evaluate_concurrent(
    port: Arc<dyn DataPort + Send + Sync>,
    symbols: &str,
    period: Period,
    config: &EvaluationConfig,
    limits: ConcurrencyLimits,
) -> BatchResult {
    let symbols = parse_symbols(symbols);
    info!(
        count = symbols.len(),
        %period,
        max_in_flight = limits.max_in_flight,
        "evaluating batch concurrently"
    );

    let semaphore = Arc::new(Semaphore::new(limits.max_in_flight.max(1)));

    let handles: Vec<_> = symbols
        .iter()
        .map(|symbol| {
            let port = Arc::clone(&port);
            let semaphore = Arc::clone(&semaphore);
            let symbol = symbol.clone();
            let config = config.clone();
            let timeout = limits.timeout;

            tokio::spawn(async move {
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return SymbolResult::failure(EvaluationError::ComputeOrFetch(e.to_string())),
                };

                let task_symbol = symbol.clone();
                let work = tokio::task::spawn_blocking(move || {
                    evaluate_symbol(port.as_ref(), &task_symbol, period, &config)
                });

                let outcome = tokio::time::timeout(timeout, work).await;
                drop(permit);

                match outcome {
                    Ok(Ok(result)) => result,
                    Ok(Err(join_err)) => {
                        let reason = EvaluationError::ComputeOrFetch(join_err.to_string());
                        warn!(symbol = %symbol, %reason, "evaluation task failed");
                        SymbolResult::failure(reason)
                    }
                    Err(_) => {
                        let reason = EvaluationError::Timeout { limit: timeout };
                        warn!(symbol = %symbol, %reason, "evaluation timed out");
                        SymbolResult::failure(reason)
                    }
                }
            })
        })
        .collect();

    let mut entries = Vec::with_capacity(symbols.len());
    for (symbol, handle) in symbols.into_iter().zip(handles) {
        let result = handle.await.unwrap_or_else(|join_err| {
            SymbolResult::failure(EvaluationError::ComputeOrFetch(join_err.to_string()))
        });
        entries.push((symbol, result));
    }

    BatchResult { entries }
}
