// In crates/backtester/src/logger.rs

use analytics::types::{EquityPoint, Trade};
use chrono::{DateTime, Utc};
use execution::ClosedPosition;
use rust_decimal::Decimal;

/// A logger responsible for recording trades and equity changes during a backtest.
#[derive(Debug, Default)]
pub struct TradeLogger {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl TradeLogger {
    /// Creates a new, empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a point in the equity curve.
    pub fn record_equity(&mut self, timestamp: DateTime<Utc>, value: Decimal) {
        self.equity_curve.push(EquityPoint { timestamp, value });
    }

    /// Overwrites the most recent equity mark (used after the final liquidation).
    pub fn amend_last_equity(&mut self, value: Decimal) {
        if let Some(last) = self.equity_curve.last_mut() {
            last.value = value;
        }
    }

    /// Records a completed trade from the executor's closing report.
    pub fn record_trade(&mut self, closed: &ClosedPosition) {
        let position = &closed.position;
        let trade = Trade {
            side: position.side,
            entry_bar: position.entry_bar,
            exit_bar: closed.exit.bar_index,
            entry_time: position.entry_time,
            exit_time: closed.exit.timestamp,
            entry_price: position.entry_price,
            exit_price: closed.exit.price,
            quantity: position.quantity,
            pnl: closed.net_pnl,
            fees: closed.entry_fee + closed.exit.fee,
            exit_reason: closed.reason,
        };
        tracing::info!(
            side = ?trade.side,
            entry = trade.entry_price,
            exit = trade.exit_price,
            return_pct = trade.return_pct(),
            pnl = %trade.pnl,
            reason = %trade.exit_reason,
            "Trade closed."
        );
        self.trades.push(trade);
    }
}
