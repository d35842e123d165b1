// In crates/risk/src/lib.rs

use core_types::{Position, Signal, TradeAssessment};

pub mod confidence_gate;
pub mod error;
pub mod types;

// Re-export public types
pub use confidence_gate::ConfidenceGate;
pub use error::{Error, Result};
pub use types::{ExitReason, TradeFilterSettings, TradeLedger};

/// What the risk layer wants done on the current bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// The open position breached its stop-loss or take-profit and must be closed.
    ProtectiveExit(ExitReason),
    /// Hand this signal to the executor.
    Submit(Signal),
    /// Nothing to do this bar.
    NoAction,
}

/// The universal interface for a risk management module.
///
/// A `RiskManager` sits between a signal source and the executor. It decides whether an
/// assessment is acted on, and how, given the open position and the trade history kept
/// in the caller's `TradeLedger`.
pub trait RiskManager: Sync {
    /// The name of the risk management strategy.
    fn name(&self) -> &'static str;

    /// Evaluates the current assessment on one bar.
    ///
    /// # Arguments
    ///
    /// * `assessment`: The assessment currently in force.
    /// * `new_signal`: `true` when the assessment's action changed on this bar.
    /// * `bar_index`: Index of the current bar.
    /// * `price`: The current close.
    /// * `open_position`: The open position, if one exists.
    /// * `ledger`: Execution bookkeeping owned by the strategy; updated in place.
    ///
    /// # Returns
    ///
    /// * `Ok(Decision)`: What to do on this bar.
    /// * `Err(Error::Vetoed)`: The signal was considered and rejected. The ledger still
    ///   records it as handled.
    fn evaluate(
        &self,
        assessment: &TradeAssessment,
        new_signal: bool,
        bar_index: usize,
        price: f64,
        open_position: Option<&Position>,
        ledger: &mut TradeLedger,
    ) -> Result<Decision>;
}
