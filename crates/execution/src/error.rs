// In crates/execution/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Execution failed: {reason}")]
    ExecutionFailed { reason: String },

    #[error("Order size too small: {size} of equity buys less than one unit at {price}")]
    OrderTooSmall { size: f64, price: f64 },

    #[error("Amount cannot be represented as a decimal: {0}")]
    InvalidAmount(f64),

    #[error(transparent)]
    InvalidOrder(#[from] core_types::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
