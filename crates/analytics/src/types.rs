// In crates/analytics/src/types.rs

use chrono::{DateTime, Utc};
use core_types::{ExitReason, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A comprehensive record of a single closed trade, from entry to exit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub side: Side,
    pub entry_bar: usize,
    pub exit_bar: usize,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    /// Net of entry and exit fees.
    pub pnl: Decimal,
    pub fees: Decimal,
    pub exit_reason: ExitReason,
}

impl Trade {
    /// Price return of the trade in percent, before fees.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        (self.exit_price / self.entry_price - 1.0) * self.side.sign() * 100.0
    }
}

/// A struct to hold a point in the portfolio's equity curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
}

/// Summary statistics of a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PerformanceReport {
    pub initial_equity: Decimal,
    pub final_equity: Decimal,
    pub net_pnl_absolute: Decimal,
    pub net_pnl_percentage: f64,
    /// Return of holding the instrument from the first to the last close.
    pub buy_and_hold_percentage: f64,
    pub max_drawdown_absolute: Decimal,
    pub max_drawdown_percentage: f64,
    /// Per-bar (not annualized) Sharpe ratio of equity returns.
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_trades: u32,
    pub avg_trade_duration_secs: f64,
    pub expectancy: Decimal,
    /// Share of bars with an open position, in percent.
    pub exposure_percentage: f64,
    pub drawdown_duration_secs: i64,
}

impl PerformanceReport {
    /// Creates a new, empty report with default zero values.
    pub fn new() -> Self {
        Self::default()
    }
}
