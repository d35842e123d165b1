// In crates/risk/src/types.rs

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub use core_types::ExitReason;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TradeFilterSettings {
    /// Signals below this confidence (0-10) never open a position.
    #[serde(default = "default_min_confidence")]
    pub min_confidence_threshold: f64,
    /// Minimum number of bars between two executed trades.
    #[serde(default = "default_min_bars")]
    pub min_bars_between_trades: usize,
    /// Hard cap on the fraction of equity committed to one position.
    #[serde(default = "default_max_position_size")]
    pub max_position_size: f64,
}

fn default_min_confidence() -> f64 {
    8.0
}

fn default_min_bars() -> usize {
    10
}

fn default_max_position_size() -> f64 {
    0.25
}

impl Default for TradeFilterSettings {
    fn default() -> Self {
        Self {
            min_confidence_threshold: default_min_confidence(),
            min_bars_between_trades: default_min_bars(),
            max_position_size: default_max_position_size(),
        }
    }
}

impl TradeFilterSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_position_size > 0.0 && self.max_position_size <= 1.0) {
            return Err(Error::InvalidParameters(format!(
                "max_position_size must be in (0, 1], got {}",
                self.max_position_size
            )));
        }
        if !(0.0..=10.0).contains(&self.min_confidence_threshold) {
            return Err(Error::InvalidParameters(format!(
                "min_confidence_threshold must be in [0, 10], got {}",
                self.min_confidence_threshold
            )));
        }
        Ok(())
    }
}

/// Per-run execution bookkeeping for a signal-driven strategy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeLedger {
    /// Set once the current signal has been handled, including when it was filtered out.
    pub signal_executed: bool,
    /// Bar index of the last executed trade, `None` before the first one.
    pub last_trade_bar: Option<usize>,
}

impl TradeLedger {
    /// Clears the executed flag so a freshly received signal can be acted on.
    pub fn arm(&mut self) {
        self.signal_executed = false;
    }

    /// Bars elapsed since the last trade; `None` when nothing has traded yet.
    pub fn bars_since_last_trade(&self, bar_index: usize) -> Option<usize> {
        self.last_trade_bar.map(|last| bar_index.saturating_sub(last))
    }
}
