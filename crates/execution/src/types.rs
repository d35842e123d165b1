// In crates/execution/src/types.rs

use chrono::{DateTime, Utc};
use core_types::{ExitReason, Position, Side};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationSettings {
    /// Fee charged on every fill as a fraction of traded notional (0.002 = 0.2%).
    pub commission: f64,

    /// The simulated slippage percentage for market orders (e.g., 0.0005 for 0.05%).
    pub slippage_percent: f64,

    /// Round entry quantities down to whole units.
    pub whole_units: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self { commission: 0.002, slippage_percent: 0.0, whole_units: true }
    }
}

/// Represents the state of the simulated trading account.
///
/// Cash only moves by realized P&L and fees; an open position contributes its
/// unrealized P&L to equity.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub initial_cash: Decimal,
    pub cash: Decimal,
    pub position: Option<Position>,
    /// Fee paid to open the current position.
    pub entry_fee: Decimal,
}

impl Portfolio {
    /// Creates a new portfolio with an initial cash balance.
    pub fn new(initial_cash: Decimal) -> Self {
        Self { initial_cash, cash: initial_cash, position: None, entry_fee: Decimal::ZERO }
    }

    /// Cash plus the open position marked at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        let cash = self.cash.to_f64().unwrap_or(0.0);
        cash + self.position.as_ref().map_or(0.0, |p| p.unrealized_pnl(price))
    }
}

/// A market order for the simulated account.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderRequest {
    /// Open a position sized as a fraction of current equity; `None` uses all of it.
    Open {
        side: Side,
        size: Option<f64>,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    },
    /// Close the open position. `price` overrides the bar close (stop and target fills).
    Close { reason: ExitReason, price: Option<f64> },
}

/// Bar context for a fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillContext {
    pub bar_index: usize,
    pub timestamp: DateTime<Utc>,
    /// The bar close, used when the order carries no explicit price.
    pub price: f64,
}

/// A single simulated fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Direction of the fill: `Long` buys, `Short` sells.
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub fee: Decimal,
    pub bar_index: usize,
    pub timestamp: DateTime<Utc>,
}

/// A position that was just closed, with its realized result.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedPosition {
    pub position: Position,
    pub exit: Execution,
    pub reason: ExitReason,
    /// Fee paid when the position was opened.
    pub entry_fee: Decimal,
    /// Price P&L minus entry and exit fees.
    pub net_pnl: Decimal,
}
