// In crates/strategies/src/lib.rs

use async_trait::async_trait;
use core_types::{Bar, Position, Signal};

pub mod error;
pub mod factory;
pub mod fvg;
pub mod indicators;
pub mod llm;
pub mod rsi_threshold;
pub mod sma_cross;
pub mod sma_macd;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use factory::{STRATEGY_NAMES, create_strategy};
pub use fvg::FairValueGap;
pub use llm::{LlmSignalStrategy, StrategyState};
pub use rsi_threshold::RsiThreshold;
pub use sma_cross::SmaCross;
pub use sma_macd::SmaMacd;

/// The universal interface for a trading strategy.
///
/// A strategy is responsible for analyzing market data and producing a trading `Signal`.
/// It is a stateful entity, meaning it can keep track of previous data points,
/// indicator values, or its own internal state across multiple calls.
#[async_trait]
pub trait Strategy: Send {
    /// The name of the strategy.
    fn name(&self) -> &'static str;

    /// Produces the instruction for the last bar in `bars`.
    ///
    /// # Arguments
    ///
    /// * `bars`: Every bar up to and including the current one, oldest first.
    /// * `position`: The currently open position, if any.
    async fn assess(&mut self, bars: &[Bar], position: Option<&Position>) -> Signal;
}

/// Keeps track of how many bars an incremental strategy has already consumed.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BarCursor {
    consumed: usize,
}

impl BarCursor {
    /// Returns the bars not seen yet, and whether the series restarted (a shorter history
    /// than before means a new run, so indicator state must be rebuilt).
    pub(crate) fn advance<'a>(&mut self, bars: &'a [Bar]) -> (&'a [Bar], bool) {
        let restarted = bars.len() < self.consumed;
        if restarted {
            self.consumed = 0;
        }
        let unseen = &bars[self.consumed..];
        self.consumed = bars.len();
        (unseen, restarted)
    }
}
