//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::validate_analysis_config;
use crate::domain::error::SignalError;
use crate::domain::evaluation::{
    self, BatchResult, ConcurrencyLimits, EvaluationConfig, SymbolResult, DEFAULT_MAX_IN_FLIGHT,
    DEFAULT_TIMEOUT_SECS,
};
use crate::domain::indicator::Deviation;
use crate::domain::period::{Interval, Period};
use crate::domain::resample::{resample, BucketSpec};
use crate::domain::series::Series;
use crate::domain::signal::{SignalParams, SignalStrength};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "sellsignal", about = "Profit-taking sell signal scanner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate sell conditions for a list of symbols
    Analyze {
        /// Comma-separated symbols, overrides [analysis] symbols
        #[arg(long)]
        symbols: Option<String>,
        #[arg(short, long)]
        period: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Read `<SYMBOL>.csv` files from this directory instead of the configured source
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Per-symbol timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        #[arg(long)]
        sequential: bool,
    },
    /// Show raw and resampled data coverage for one symbol
    Info {
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        period: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Validate an analysis configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            symbols,
            period,
            config,
            data_dir,
            timeout,
            sequential,
        } => run_analyze(&AnalyzeArgs {
            symbols,
            period,
            config,
            data_dir,
            timeout,
            sequential,
        }),
        Command::Info {
            symbol,
            period,
            config,
            data_dir,
        } => run_info(&symbol, period.as_deref(), config.as_ref(), data_dir.as_ref()),
        Command::Validate { config } => run_validate(&config),
    }
}

#[derive(Debug, Default)]
pub struct AnalyzeArgs {
    pub symbols: Option<String>,
    pub period: Option<String>,
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub timeout: Option<u64>,
    pub sequential: bool,
}

fn fail(err: SignalError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(&err)
}

/// Load the INI file at `path`, or an empty configuration when none is given.
pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, SignalError> {
    match path {
        Some(p) => FileConfigAdapter::from_file(p),
        None => FileConfigAdapter::from_string(""),
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `[logging] level`.
pub fn init_tracing(config: &dyn ConfigPort) {
    let level = config
        .get_non_empty("logging", "level")
        .unwrap_or_else(|| "info".to_string());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn positive(config: &dyn ConfigPort, section: &str, key: &str, default: i64) -> Result<usize, SignalError> {
    usize::try_from(config.get_int(section, key, default))
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| SignalError::ConfigInvalid {
            section: section.into(),
            key: key.into(),
            reason: format!("{} must be a positive integer", key),
        })
}

pub fn build_signal_params(config: &dyn ConfigPort) -> Result<SignalParams, SignalError> {
    let defaults = SignalParams::default();

    let bollinger_deviation = match config.get_non_empty("signal", "bollinger_deviation") {
        Some(d) => d.parse::<Deviation>()?,
        None => defaults.bollinger_deviation,
    };
    let mult = config.get_double(
        "signal",
        "bollinger_mult",
        f64::from(defaults.bollinger_mult_x100) / 100.0,
    );

    Ok(SignalParams {
        bollinger_period: positive(config, "signal", "bollinger_period", defaults.bollinger_period as i64)?,
        bollinger_mult_x100: (mult * 100.0).round() as u32,
        bollinger_deviation,
        rsi_period: positive(config, "signal", "rsi_period", defaults.rsi_period as i64)?,
        rsi_overbought: config.get_double("signal", "rsi_overbought", defaults.rsi_overbought),
        macd_fast: positive(config, "signal", "macd_fast", defaults.macd_fast as i64)?,
        macd_slow: positive(config, "signal", "macd_slow", defaults.macd_slow as i64)?,
        macd_signal: positive(config, "signal", "macd_signal", defaults.macd_signal as i64)?,
        min_bars: positive(config, "signal", "min_bars", defaults.min_bars as i64)?,
    })
}

pub fn build_evaluation_config(config: &dyn ConfigPort) -> Result<EvaluationConfig, SignalError> {
    // buckets start at local midnight for the configured offset, i.e. UTC midnight minus it
    let offset = config.get_int("resample", "utc_offset_minutes", 0);
    if !(-24 * 60..=24 * 60).contains(&offset) {
        return Err(SignalError::ConfigInvalid {
            section: "resample".into(),
            key: "utc_offset_minutes".into(),
            reason: "utc_offset_minutes must be within one day".into(),
        });
    }
    Ok(EvaluationConfig {
        signal: build_signal_params(config)?,
        buckets: BucketSpec::new(Interval::RESAMPLE.duration(), chrono::Duration::minutes(-offset))?,
    })
}

pub fn resolve_symbols(symbols_override: Option<&str>, config: &dyn ConfigPort) -> String {
    match symbols_override {
        Some(s) => s.to_string(),
        None => config.get_non_empty("analysis", "symbols").unwrap_or_default(),
    }
}

pub fn resolve_period(period_override: Option<&str>, config: &dyn ConfigPort) -> Result<Period, SignalError> {
    match period_override {
        Some(p) => p.parse(),
        None => match config.get_non_empty("analysis", "period") {
            Some(p) => p.parse(),
            None => Ok(Period::default()),
        },
    }
}

fn resolve_timeout(timeout_override: Option<u64>, config: &dyn ConfigPort) -> Result<Duration, SignalError> {
    let secs = match timeout_override {
        Some(secs) => secs,
        None => positive(config, "analysis", "timeout_secs", DEFAULT_TIMEOUT_SECS as i64)? as u64,
    };
    if secs == 0 {
        return Err(SignalError::ConfigInvalid {
            section: "analysis".into(),
            key: "timeout_secs".into(),
            reason: "timeout must be positive".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Pick the data source: `--data-dir` first, then `[data] source`.
pub fn build_data_port(
    config: &dyn ConfigPort,
    data_dir: Option<&PathBuf>,
    timeout: Duration,
) -> Result<Arc<dyn DataPort + Send + Sync>, SignalError> {
    if let Some(dir) = data_dir {
        return Ok(Arc::new(CsvAdapter::new(dir.clone())));
    }

    let source = config
        .get_non_empty("data", "source")
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "yahoo".to_string());

    match source.as_str() {
        "csv" => {
            let dir = config
                .get_non_empty("data", "csv_dir")
                .ok_or_else(|| SignalError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_dir".into(),
                })?;
            Ok(Arc::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        "yahoo" => build_yahoo_port(config, timeout),
        other => Err(SignalError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unknown data source '{}'", other),
        }),
    }
}

#[cfg(feature = "yahoo")]
fn build_yahoo_port(
    config: &dyn ConfigPort,
    timeout: Duration,
) -> Result<Arc<dyn DataPort + Send + Sync>, SignalError> {
    use crate::adapters::yahoo_adapter::{YahooAdapter, DEFAULT_BASE_URL};

    let base_url = config
        .get_non_empty("data", "base_url")
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    Ok(Arc::new(YahooAdapter::new(&base_url, timeout)?))
}

#[cfg(not(feature = "yahoo"))]
fn build_yahoo_port(
    _config: &dyn ConfigPort,
    _timeout: Duration,
) -> Result<Arc<dyn DataPort + Send + Sync>, SignalError> {
    Err(SignalError::ConfigInvalid {
        section: "data".into(),
        key: "source".into(),
        reason: "yahoo feature is required for the yahoo source".into(),
    })
}

pub fn run_analyze(args: &AnalyzeArgs) -> ExitCode {
    let config = match load_config(args.config.as_ref()) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    init_tracing(&config);

    match analyze(args, &config) {
        Ok(batch) => {
            print_batch(&batch);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Resolve settings from flags and config, then run the batch.
pub fn analyze(args: &AnalyzeArgs, config: &dyn ConfigPort) -> Result<BatchResult, SignalError> {
    validate_analysis_config(config)?;

    let eval_config = build_evaluation_config(config)?;
    let period = resolve_period(args.period.as_deref(), config)?;
    let timeout = resolve_timeout(args.timeout, config)?;
    let symbols = resolve_symbols(args.symbols.as_deref(), config);
    let port = build_data_port(config, args.data_dir.as_ref(), timeout)?;

    if evaluation::parse_symbols(&symbols).is_empty() {
        warn!("no symbols to evaluate (use --symbols or set [analysis] symbols)");
    }

    let concurrent = !args.sequential && config.get_bool("analysis", "concurrent", true);
    if !concurrent {
        return Ok(evaluation::evaluate(port.as_ref(), &symbols, period, &eval_config));
    }

    let limits = ConcurrencyLimits {
        timeout,
        max_in_flight: positive(config, "analysis", "max_concurrency", DEFAULT_MAX_IN_FLIGHT as i64)?,
    };
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let batch = runtime.block_on(evaluation::evaluate_concurrent(
        Arc::clone(&port),
        &symbols,
        period,
        &eval_config,
        limits,
    ));
    // timed-out fetches may still be running on the blocking pool
    runtime.shutdown_timeout(Duration::from_secs(1));

    Ok(batch)
}

fn strength_label(strength: SignalStrength) -> &'static str {
    match strength {
        SignalStrength::Strong => "STRONG",
        SignalStrength::Moderate => "MODERATE",
        SignalStrength::NoSignal => "-",
    }
}

fn mark(met: bool) -> &'static str {
    if met { "yes" } else { "no" }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

pub fn format_header() -> String {
    format!(
        "{:<8} {:<9} {:<5} {:<5} {:<5} {:<5} {:>10} {:>7}",
        "SYMBOL", "SIGNAL", "BAND", "RSI", "MACD", "SCORE", "CLOSE", "RSI"
    )
}

pub fn format_row(symbol: &str, result: &SymbolResult) -> String {
    match result {
        SymbolResult::Success {
            conditions,
            indicators,
            ..
        } => format!(
            "{:<8} {:<9} {:<5} {:<5} {:<5} {:<5} {:>10} {:>7}",
            symbol,
            strength_label(conditions.strength()),
            mark(conditions.price_above_upper_band()),
            mark(conditions.rsi_overbought()),
            mark(conditions.macd_bearish_crossover()),
            format!("{}/3", conditions.score()),
            fmt_opt(indicators.close),
            fmt_opt(indicators.rsi),
        ),
        SymbolResult::Failure { reason } => format!("{:<8} {:<9} {}", symbol, "FAILED", reason),
    }
}

fn print_batch(batch: &BatchResult) {
    println!("{}", format_header());
    for (symbol, result) in batch.iter() {
        println!("{}", format_row(symbol, result));
    }

    let summary = batch.summary();
    info!(
        strong = summary.strong,
        moderate = summary.moderate,
        no_signal = summary.no_signal,
        failures = summary.failures,
        "batch complete"
    );
    eprintln!(
        "\n{} symbols: {} strong, {} moderate, {} no signal, {} failed",
        summary.total(),
        summary.strong,
        summary.moderate,
        summary.no_signal,
        summary.failures
    );
}

fn run_info(
    symbol: &str,
    period: Option<&str>,
    config_path: Option<&PathBuf>,
    data_dir: Option<&PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    init_tracing(&config);

    match info_report(symbol, period, &config, data_dir) {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Raw and resampled bar counts and time ranges for one symbol.
pub fn info_report(
    symbol: &str,
    period: Option<&str>,
    config: &dyn ConfigPort,
    data_dir: Option<&PathBuf>,
) -> Result<Vec<String>, SignalError> {
    let eval_config = build_evaluation_config(config)?;
    let period = resolve_period(period, config)?;
    let timeout = resolve_timeout(None, config)?;
    let port = build_data_port(config, data_dir, timeout)?;

    let symbol = symbol.trim().to_uppercase();
    let raw = Series::new(symbol.as_str(), port.fetch_ohlcv(&symbol, period, Interval::FETCH)?);
    let resampled = resample(&raw, &eval_config.buckets);

    let describe = |label: &str, interval: Interval, series: &Series| match series.time_range() {
        Some((first, last)) => format!(
            "{} {} ({}): {} bars, {} to {}",
            symbol, label, interval, series.len(), first.to_rfc3339(), last.to_rfc3339()
        ),
        None => format!("{} {} ({}): no data", symbol, label, interval),
    };

    let minimum = eval_config.signal.min_bars;
    Ok(vec![
        describe("raw", Interval::FETCH, &raw),
        describe("resampled", Interval::RESAMPLE, &resampled),
        format!(
            "{} history: {} (need {}+ resampled bars over {})",
            symbol,
            if resampled.len() >= minimum { "sufficient" } else { "insufficient" },
            minimum,
            period
        ),
    ])
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(Some(config_path)) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    eprintln!("Validating {}...", config_path.display());
    match validate_analysis_config(&config).and_then(|_| build_evaluation_config(&config)) {
        Ok(eval_config) => {
            eprintln!(
                "  indicators: {}",
                eval_config
                    .signal
                    .indicator_types()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            let symbols = evaluation::parse_symbols(&resolve_symbols(None, &config));
            eprintln!("  symbols: {}", symbols.len());
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::EvaluationError;
    use crate::domain::signal::{ConditionVector, IndicatorSnapshot};

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn cli_parses_analyze_flags() {
        let cli = Cli::parse_from([
            "sellsignal",
            "analyze",
            "--symbols",
            "AAPL,MSFT",
            "--period",
            "1y",
            "--timeout",
            "10",
            "--sequential",
        ]);
        match cli.command {
            Command::Analyze {
                symbols,
                period,
                timeout,
                sequential,
                ..
            } => {
                assert_eq!(symbols.as_deref(), Some("AAPL,MSFT"));
                assert_eq!(period.as_deref(), Some("1y"));
                assert_eq!(timeout, Some(10));
                assert!(sequential);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn signal_params_default_when_section_missing() {
        let params = build_signal_params(&config("")).unwrap();
        assert_eq!(params, SignalParams::default());
    }

    #[test]
    fn signal_params_read_from_config() {
        let params = build_signal_params(&config(
            "[signal]\nbollinger_period = 20\nbollinger_mult = 2.5\nbollinger_deviation = population\nrsi_period = 14\nrsi_overbought = 80\nmin_bars = 40\n",
        ))
        .unwrap();
        assert_eq!(params.bollinger_period, 20);
        assert_eq!(params.bollinger_mult_x100, 250);
        assert_eq!(params.bollinger_deviation, Deviation::Population);
        assert_eq!(params.rsi_period, 14);
        assert_eq!(params.rsi_overbought, 80.0);
        assert_eq!(params.min_bars, 40);
        assert_eq!(params.macd_fast, 8);
    }

    #[test]
    fn negative_window_is_rejected() {
        let err = build_signal_params(&config("[signal]\nmacd_slow = -3\n")).unwrap_err();
        assert!(matches!(err, SignalError::ConfigInvalid { key, .. } if key == "macd_slow"));
    }

    #[test]
    fn evaluation_config_applies_offset() {
        // UTC-5: local midnight is 05:00 UTC, so buckets open at 01:00, 05:00, 09:00 UTC
        let eval = build_evaluation_config(&config("[resample]\nutc_offset_minutes = -300\n")).unwrap();
        let expected = BucketSpec::new(chrono::Duration::hours(4), chrono::Duration::hours(5)).unwrap();
        assert_eq!(eval.buckets, expected);

        let ts = chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2024, 3, 4, 8, 30, 0).unwrap();
        let open = chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2024, 3, 4, 5, 0, 0).unwrap();
        assert_eq!(eval.buckets.bucket_start(ts), open);
    }

    #[test]
    fn symbols_flag_overrides_config() {
        let cfg = config("[analysis]\nsymbols = AAPL, MSFT\n");
        assert_eq!(resolve_symbols(Some("nvda"), &cfg), "nvda");
        assert_eq!(resolve_symbols(None, &cfg), "AAPL, MSFT");
        assert_eq!(resolve_symbols(None, &config("")), "");
    }

    #[test]
    fn period_flag_overrides_config() {
        let cfg = config("[analysis]\nperiod = 3mo\n");
        assert_eq!(resolve_period(None, &cfg).unwrap(), Period::ThreeMonths);
        assert_eq!(resolve_period(Some("1y"), &cfg).unwrap(), Period::OneYear);
        assert_eq!(resolve_period(None, &config("")).unwrap(), Period::SixMonths);
        assert!(matches!(
            resolve_period(Some("2w"), &cfg),
            Err(SignalError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn timeout_defaults_and_overrides() {
        assert_eq!(resolve_timeout(None, &config("")).unwrap(), Duration::from_secs(30));
        assert_eq!(resolve_timeout(Some(5), &config("")).unwrap(), Duration::from_secs(5));
        assert!(resolve_timeout(Some(0), &config("")).is_err());
    }

    #[test]
    fn csv_source_without_dir_is_missing_key() {
        let result = build_data_port(&config("[data]\nsource = csv\n"), None, Duration::from_secs(1));
        assert!(matches!(result, Err(SignalError::ConfigMissing { key, .. }) if key == "csv_dir"));
    }

    #[test]
    fn unknown_source_is_invalid() {
        let result = build_data_port(&config("[data]\nsource = ftp\n"), None, Duration::from_secs(1));
        assert!(matches!(result, Err(SignalError::ConfigInvalid { key, .. }) if key == "source"));
    }

    #[test]
    fn format_row_success_and_failure() {
        let success = SymbolResult::Success {
            series: Series::new("AAPL", vec![]),
            conditions: ConditionVector([true, true, false]),
            indicators: IndicatorSnapshot {
                close: Some(187.254),
                rsi: Some(74.1),
                ..IndicatorSnapshot::default()
            },
        };
        let row = format_row("AAPL", &success);
        assert!(row.starts_with("AAPL"));
        assert!(row.contains("MODERATE"));
        assert!(row.contains("2/3"));
        assert!(row.contains("187.25"));
        assert!(row.contains("74.10"));

        let failure = SymbolResult::Failure {
            reason: EvaluationError::NoData,
        };
        assert!(format_row("BADSYM", &failure).ends_with("FAILED    No data available"));
    }
}
