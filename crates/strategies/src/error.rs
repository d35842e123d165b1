// In crates/strategies/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid strategy settings: {0}")]
    InvalidSettings(String),

    #[error("Indicator construction failed: {0}")]
    Indicator(String),

    #[error(transparent)]
    Risk(#[from] risk::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
