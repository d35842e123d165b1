// In crates/core-types/src/lib.rs

pub mod assessment;
pub mod error;
pub mod strategy;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use assessment::{Action, MarketTrend, RecallCriterion, TradeAssessment};
pub use error::{Error, Result};
pub use strategy::StrategyConfig;
pub use types::{Bar, ExitReason, Position, Side, Signal};
