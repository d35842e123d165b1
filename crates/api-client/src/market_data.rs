// In crates/api-client/src/market_data.rs

use crate::types::{ChartEnvelope, DataRange, validate_interval};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use core_types::Bar;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// A client for the public Yahoo Finance chart endpoint.
#[derive(Debug, Clone)]
pub struct MarketDataClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl MarketDataClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(CHART_BASE_URL)
    }

    /// Create with a custom base URL (for proxies or test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            // The endpoint rejects requests without a browser-like agent.
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) signal-lab")
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;
        Ok(Self { http_client, base_url: base_url.into() })
    }

    /// Downloads OHLCV bars for one symbol.
    ///
    /// # Arguments
    ///
    /// * `symbol`: Ticker symbol (e.g., "AAPL", "BTC-USD").
    /// * `range`: A lookback period or an explicit date range.
    /// * `interval`: Bar interval (e.g., "1d", "1h").
    pub async fn load_bars(&self, symbol: &str, range: &DataRange, interval: &str) -> Result<Vec<Bar>> {
        validate_interval(interval)?;

        let mut params = format!("interval={}&includePrePost=false", interval);
        match range {
            DataRange::Period(period) => params.push_str(&format!("&range={}", period)),
            DataRange::Dates { start, end } => {
                params.push_str(&format!(
                    "&period1={}&period2={}",
                    day_start(*start).timestamp(),
                    day_start(*end).timestamp()
                ));
            }
        }
        let url = format!("{}/v8/finance/chart/{}?{}", self.base_url, symbol, params);

        tracing::info!(symbol, interval, ?range, "Requesting bars from chart endpoint.");
        let body = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(Error::RequestFailed)?
            .text()
            .await
            .map_err(Error::RequestFailed)?;

        let bars = parse_chart_response(symbol, &body)?;
        tracing::info!(symbol, count = bars.len(), "Loaded bars.");
        Ok(bars)
    }

    /// Downloads bars for several symbols with the same range and interval.
    pub async fn load_many(
        &self,
        symbols: &[String],
        range: &DataRange,
        interval: &str,
    ) -> Result<BTreeMap<String, Vec<Bar>>> {
        let requests = symbols.iter().map(|symbol| async move {
            let bars = self.load_bars(symbol, range, interval).await?;
            Ok::<_, Error>((symbol.clone(), bars))
        });
        let loaded = futures::future::try_join_all(requests).await?;
        Ok(loaded.into_iter().collect())
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Converts a chart response body into validated bars.
///
/// Rows where open, high, low and close are all `null` (non-trading sessions) are dropped;
/// a row with only some of them missing is rejected.
pub fn parse_chart_response(symbol: &str, body: &str) -> Result<Vec<Bar>> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(err) = envelope.chart.error {
        return Err(Error::ApiError { code: err.code, msg: err.description });
    }

    let result = envelope
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
        .ok_or_else(|| Error::NoData(symbol.to_string()))?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let column = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let (open, high, low, close) = (
            column(&quote.open, i),
            column(&quote.high, i),
            column(&quote.low, i),
            column(&quote.close, i),
        );
        if open.is_none() && high.is_none() && low.is_none() && close.is_none() {
            continue;
        }
        let timestamp = Utc
            .timestamp_opt(*ts, 0)
            .single()
            .ok_or_else(|| Error::BadTimestamp(ts.to_string()))?;
        bars.push(Bar::from_optional(
            bars.len(),
            timestamp,
            open,
            high,
            low,
            close,
            column(&quote.volume, i),
        )?);
    }

    if bars.is_empty() {
        return Err(Error::NoData(symbol.to_string()));
    }
    Bar::validate_series(&bars)?;
    Ok(bars)
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date", alias = "Datetime", alias = "date")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: Option<f64>,
    #[serde(alias = "High")]
    high: Option<f64>,
    #[serde(alias = "Low")]
    low: Option<f64>,
    #[serde(alias = "Close")]
    close: Option<f64>,
    #[serde(alias = "Volume", default)]
    volume: Option<f64>,
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(day_start(date));
    }
    Err(Error::BadTimestamp(raw.to_string()))
}

/// Loads bars from a CSV file with `timestamp,open,high,low,close,volume` columns.
///
/// Capitalized headers (`Date,Open,High,Low,Close,Volume`) are accepted as well.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let mut bars = Vec::new();
    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        bars.push(Bar::from_optional(
            index,
            parse_timestamp(&row.timestamp)?,
            row.open,
            row.high,
            row.low,
            row.close,
            row.volume,
        )?);
    }
    Bar::validate_series(&bars)?;
    tracing::info!(path = %path.as_ref().display(), count = bars.len(), "Loaded bars from CSV.");
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "AAPL"},
                "timestamp": [1704153600, 1704240000, 1704326400],
                "indicators": {"quote": [{
                    "open":   [187.1, null, 184.2],
                    "high":   [188.4, null, 185.9],
                    "low":    [183.9, null, 183.4],
                    "close":  [185.6, null, 184.3],
                    "volume": [82488700, null, null]
                }]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn chart_response_skips_empty_sessions() {
        let bars = parse_chart_response("AAPL", BODY).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 185.6);
        assert_eq!(bars[1].open, 184.2);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn partially_missing_prices_are_rejected() {
        let body = BODY.replace("[185.6, null, 184.3]", "[null, null, 184.3]");
        let err = parse_chart_response("AAPL", &body).unwrap_err();
        assert!(matches!(err, Error::InvalidBars(core_types::Error::MissingField { field: "close", .. })));
    }

    #[test]
    fn provider_errors_are_surfaced() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart_response("NOPE", body).unwrap_err();
        assert!(matches!(err, Error::ApiError { ref code, .. } if code == "Not Found"));
    }

    #[test]
    fn csv_with_capitalized_headers_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Date,Open,High,Low,Close,Volume").unwrap();
        writeln!(file, "2024-01-02,10,11,9,10.5,1000").unwrap();
        writeln!(file, "2024-01-03,10.5,12,10,11.5,").unwrap();

        let bars = load_csv(file.path()).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 11.5);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn csv_missing_close_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,open,high,low,close,volume").unwrap();
        writeln!(file, "2024-01-02T00:00:00Z,10,11,9,,1000").unwrap();

        assert!(matches!(load_csv(file.path()), Err(Error::InvalidBars(_))));
    }
}
