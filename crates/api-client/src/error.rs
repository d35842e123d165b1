// In crates/api-client/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the API client: {0}")]
    ClientBuildError(String),
    #[error("Invalid data request: {0}")]
    InvalidRequest(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("API error: code {code}, msg: {msg}")]
    ApiError { code: String, msg: String },
    #[error("Provider returned no data for {0}")]
    NoData(String),
    #[error("Invalid bar data: {0}")]
    InvalidBars(#[from] core_types::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unparseable timestamp '{0}'")]
    BadTimestamp(String),
}

pub type Result<T> = std::result::Result<T, Error>;
