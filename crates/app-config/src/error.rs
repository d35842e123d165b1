// In crates/app-config/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Unknown strategy '{name}'. Available strategies: {available}")]
    UnknownStrategy { name: String, available: String },

    #[error("Parameters for strategy '{0}' must be a table")]
    InvalidStrategyTable(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

pub type Result<T> = std::result::Result<T, Error>;
