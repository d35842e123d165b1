// In crates/api-client/src/types.rs

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Periods accepted by the chart endpoint.
pub const VALID_PERIODS: &[&str] = &["1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max"];

/// Bar intervals accepted by the chart endpoint.
pub const VALID_INTERVALS: &[&str] = &[
    "1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h", "1d", "5d", "1wk", "1mo", "3mo",
];

/// The time span to download: either a named lookback period or an explicit date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataRange {
    Period(String),
    Dates { start: NaiveDate, end: NaiveDate },
}

impl DataRange {
    /// Builds a range from loosely specified arguments.
    ///
    /// Exactly one of `period` or the `start`/`end` pair must be provided.
    pub fn from_parts(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        period: Option<&str>,
    ) -> Result<Self> {
        match (period, start, end) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(Error::InvalidRequest(
                "Cannot specify both period and start/end dates. Use either period OR date range.".into(),
            )),
            (Some(period), None, None) => {
                if !VALID_PERIODS.contains(&period) {
                    return Err(Error::InvalidRequest(format!(
                        "Unknown period '{}'. Valid periods: {}",
                        period,
                        VALID_PERIODS.join(", ")
                    )));
                }
                Ok(DataRange::Period(period.to_string()))
            }
            (None, Some(start), Some(end)) => {
                if start >= end {
                    return Err(Error::InvalidRequest(format!(
                        "Start date {start} must be before end date {end}"
                    )));
                }
                Ok(DataRange::Dates { start, end })
            }
            (None, _, _) => Err(Error::InvalidRequest(
                "Must provide either period OR both start_date and end_date.".into(),
            )),
        }
    }
}

pub fn validate_interval(interval: &str) -> Result<()> {
    if VALID_INTERVALS.contains(&interval) {
        Ok(())
    } else {
        Err(Error::InvalidRequest(format!(
            "Unknown interval '{}'. Valid intervals: {}",
            interval,
            VALID_INTERVALS.join(", ")
        )))
    }
}

/// Connection settings for the chat-completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_tokens() -> u32 {
    1500
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
        }
    }
}

// --- Chart endpoint wire types ---

#[derive(Debug, Deserialize)]
pub(crate) struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartBody {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartResult {
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<ChartQuote>,
}

/// Column-oriented quote arrays; any entry may be `null`.
#[derive(Debug, Deserialize, Default)]
pub(crate) struct ChartQuote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

// --- Chat-completion wire types ---

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatReply,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatReply {
    pub content: Option<String>,
}
