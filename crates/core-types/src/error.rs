// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Bar at {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("Bar at {index} has a non-finite '{field}' value")]
    NonFiniteField { index: usize, field: &'static str },

    #[error("Bars are not in chronological order at index {index}")]
    OutOfOrder { index: usize },

    #[error("Invalid order size {0}: must be a fraction of equity in (0, 1]")]
    InvalidSize(f64),
}

pub type Result<T> = std::result::Result<T, Error>;
