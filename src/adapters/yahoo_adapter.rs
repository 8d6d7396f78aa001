//! Yahoo Finance chart API data adapter.
//!
//! Fetches `{base_url}/v8/finance/chart/{symbol}?interval=..&range=..` with a
//! blocking client. Rows with any missing OHLCV field are skipped. A "Not
//! Found" chart error or an empty result means the symbol is unknown and
//! yields no bars.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::period::{Interval, Period};
use crate::ports::data_port::DataPort;
use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (compatible; sellsignal)";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

pub struct YahooAdapter {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl YahooAdapter {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SignalError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SignalError::DataSource {
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn chart_url(&self, symbol: &str, period: Period, interval: Interval) -> String {
        format!(
            "{}/v8/finance/chart/{}?interval={}&range={}",
            self.base_url, symbol, interval, period
        )
    }
}

/// Decode a chart API body into bars.
pub fn parse_chart(body: &str) -> Result<Vec<OhlcvBar>, SignalError> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| SignalError::DataSource {
            reason: format!("failed to parse chart response: {}", e),
        })?;

    if let Some(error) = response.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Ok(Vec::new());
        }
        return Err(SignalError::DataSource {
            reason: format!("Yahoo API error: {} - {}", error.code, error.description),
        });
    }

    let Some(data) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

    let field = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    let bars = data
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            Some(OhlcvBar {
                timestamp: DateTime::from_timestamp(ts, 0)?,
                open: field(&quote.open, i)?,
                high: field(&quote.high, i)?,
                low: field(&quote.low, i)?,
                close: field(&quote.close, i)?,
                volume: field(&quote.volume, i)?,
            })
        })
        .collect();

    Ok(bars)
}

impl DataPort for YahooAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<OhlcvBar>, SignalError> {
        let url = self.chart_url(symbol, period, interval);
        debug!(symbol = %symbol, %url, "fetching chart");

        // unknown symbols come back as 404 with a chart error body
        let body = self
            .client
            .get(&url)
            .send()
            .and_then(|resp| resp.text())
            .map_err(|e| SignalError::DataSource {
                reason: format!("request failed: {}", e),
            })?;

        let bars = parse_chart(&body)?;
        info!(symbol = %symbol, bars = bars.len(), "fetched chart");
        Ok(bars)
    }
}
