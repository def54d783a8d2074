//! Yahoo Finance v8 chart API price source.

use super::{effective_range, sanitize_bars, PriceProvider};
use crate::config::ProviderConfig;
use crate::types::PriceBar;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/122.0.0 Safari/537.36";

/// Daily history from the anonymous chart endpoint.
///
/// Rate-limited requests (HTTP 429) are retried with a fixed delay; any
/// other non-success status yields an empty series.
#[derive(Debug, Clone)]
pub struct YahooPriceProvider {
    client: Client,
    base_url: String,
    max_attempts: u32,
    retry_delay: Duration,
}

impl YahooPriceProvider {
    /// Create a provider with default tuning.
    pub fn new() -> Result<Self> {
        Self::from_config(&ProviderConfig::default())
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay(),
        })
    }

    /// Point the provider at another host (e.g. a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=div%2Csplit",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(symbol),
            unix_seconds(start),
            unix_seconds(end),
        )
    }

    /// Chart URL for a stored ticker. The symbol is sent as held, with
    /// no exchange suffix added.
    fn history_url(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        let (start, end) = effective_range(start, end);
        self.chart_url(&ticker.trim().to_uppercase(), start, end)
    }

    async fn fetch_with_retry(&self, symbol: &str, url: &str) -> Result<Option<String>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let response = self
                .client
                .get(url)
                .header(header::ACCEPT, "application/json")
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS && attempt < self.max_attempts {
                tracing::warn!(
                    "Rate limited fetching {} (attempt {}/{}), retrying in {:?}",
                    symbol,
                    attempt,
                    self.max_attempts,
                    self.retry_delay
                );
                tokio::time::sleep(self.retry_delay).await;
                continue;
            }

            if !status.is_success() {
                tracing::warn!("Chart request for {} failed: {}", symbol, status);
                return Ok(None);
            }

            return Ok(Some(response.text().await?));
        }
    }
}

#[async_trait]
impl PriceProvider for YahooPriceProvider {
    async fn daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        let symbol = ticker.trim().to_uppercase();
        let url = self.history_url(&symbol, start, end);

        match self.fetch_with_retry(&symbol, &url).await? {
            Some(body) => {
                let bars = parse_chart(&body)?;
                tracing::debug!("Fetched {} bars for {}", bars.len(), symbol);
                Ok(bars)
            }
            None => Ok(Vec::new()),
        }
    }
}

fn unix_seconds(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
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

/// Parse a chart API body into sanitized daily bars.
///
/// Timestamps are shifted by the exchange's GMT offset before being cut
/// down to a calendar date. A body without a result is an empty series.
pub fn parse_chart(body: &str) -> Result<Vec<PriceBar>> {
    let response: ChartResponse = serde_json::from_str(body)?;

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let offset = result.meta.map(|m| m.gmtoffset).unwrap_or(0);
    let quote = result
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .unwrap_or_default();

    let value = |series: &[Option<f64>], i: usize| series.get(i).copied().flatten();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(date) = ts
            .checked_add(offset)
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .map(|dt| dt.date_naive())
        else {
            continue;
        };

        if let (Some(open), Some(high), Some(low), Some(close)) = (
            value(&quote.open, i),
            value(&quote.high, i),
            value(&quote.low, i),
            value(&quote.close, i),
        ) {
            let volume = value(&quote.volume, i).unwrap_or(0.0).max(0.0) as u64;
            bars.push(PriceBar::new(date, open, high, low, close).with_volume(volume));
        }
    }

    Ok(sanitize_bars(bars))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "MC.PA", "gmtoffset": 3600},
                "timestamp": [1704182400, 1704268800, 1704355200, 1704441600],
                "indicators": {"quote": [{
                    "open":   [700.0, 705.0, null, 710.0],
                    "high":   [710.0, 712.0, 715.0, 0.0],
                    "low":    [695.0, 701.0, 702.0, 705.0],
                    "close":  [705.0, 709.0, 711.0, 708.0],
                    "volume": [1200, null, 900, 1000]
                }]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_skips_incomplete_and_invalid_bars() {
        let bars = parse_chart(SAMPLE).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].close, 705.0);
        assert_eq!(bars[0].volume, 1200);
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(bars[1].volume, 0);
    }

    #[test]
    fn test_parse_chart_applies_gmt_offset() {
        // 23:00 UTC on Jan 1 is already Jan 2 at +02:00
        let body = r#"{"chart": {"result": [{
            "meta": {"gmtoffset": 7200},
            "timestamp": [1704150000],
            "indicators": {"quote": [{"open": [1.0], "high": [1.0], "low": [1.0], "close": [1.0]}]}
        }]}}"#;

        let bars = parse_chart(body).unwrap();
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_parse_chart_skips_out_of_range_timestamps() {
        let body = format!(
            r#"{{"chart": {{"result": [{{
                "meta": {{"gmtoffset": 3600}},
                "timestamp": [{}, 1704182400],
                "indicators": {{"quote": [{{"open": [1.0, 2.0], "high": [1.0, 2.0], "low": [1.0, 2.0], "close": [1.0, 2.0]}}]}}
            }}]}}}}"#,
            i64::MAX
        );

        let bars = parse_chart(&body).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 2.0);
    }

    #[test]
    fn test_history_url_does_not_add_exchange_suffix() {
        let provider = YahooPriceProvider::new()
            .unwrap()
            .with_base_url("http://localhost:9999");
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let url = provider.history_url(" ai ", day, day);

        assert!(url.starts_with("http://localhost:9999/v8/finance/chart/AI?"));
        assert!(url.contains("period2=1704153600"));
    }

    #[test]
    fn test_parse_chart_without_result_is_empty() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found"}}}"#;
        assert!(parse_chart(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_chart_rejects_garbage() {
        assert!(parse_chart("<html>").is_err());
    }

    #[test]
    fn test_chart_url() {
        let provider = YahooPriceProvider::new()
            .unwrap()
            .with_base_url("http://localhost:9999/");
        let url = provider.chart_url(
            "^GSPC",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        );

        assert_eq!(
            url,
            "http://localhost:9999/v8/finance/chart/%5EGSPC?period1=1704067200&period2=1704153600&interval=1d&events=div%2Csplit"
        );
    }
}
