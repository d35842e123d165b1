// In crates/execution/src/simulated.rs

use crate::types::{ClosedPosition, Execution, FillContext, OrderRequest, Portfolio, SimulationSettings};
use crate::{Error, Executor, Result};
use async_trait::async_trait;
use core_types::{ExitReason, Position, Side};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fills market orders against bar prices for backtests.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    settings: SimulationSettings,
}

fn decimal(value: f64) -> Result<Decimal> {
    Decimal::from_f64(value).ok_or(Error::InvalidAmount(value))
}

impl SimulatedExecutor {
    pub fn new(settings: SimulationSettings) -> Self {
        Self { settings }
    }

    /// Applies slippage against the trader: buys fill higher, sells lower.
    fn slipped(&self, price: f64, buying: bool) -> f64 {
        if buying {
            price * (1.0 + self.settings.slippage_percent)
        } else {
            price * (1.0 - self.settings.slippage_percent)
        }
    }

    /// Processes an entry order (opening a new long or short position).
    fn process_entry(
        &self,
        side: Side,
        size: Option<f64>,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
        context: FillContext,
        portfolio: &mut Portfolio,
    ) -> Result<(Execution, Option<ClosedPosition>)> {
        if portfolio.position.is_some() {
            return Err(Error::ExecutionFailed { reason: "a position is already open".to_string() });
        }
        if let Some(s) = size {
            if !(s > 0.0 && s <= 1.0) {
                return Err(core_types::Error::InvalidSize(s).into());
            }
        }

        // --- 1. Size the order from current equity ---
        let price = self.slipped(context.price, side == Side::Long);
        let equity = portfolio.equity(context.price);
        if equity <= 0.0 {
            return Err(Error::ExecutionFailed { reason: format!("no equity left ({equity:.2})") });
        }
        let fraction = size.unwrap_or(1.0);
        let mut quantity = equity * fraction / (price * (1.0 + self.settings.commission));
        if self.settings.whole_units {
            quantity = quantity.floor();
        }
        if quantity <= 0.0 {
            return Err(Error::OrderTooSmall { size: fraction, price });
        }

        // --- 2. Pay the commission ---
        let fee = decimal(quantity * price)? * decimal(self.settings.commission)?;
        portfolio.cash -= fee;
        portfolio.entry_fee = fee;

        // --- 3. Open the position ---
        portfolio.position = Some(Position {
            side,
            quantity,
            entry_price: price,
            entry_bar: context.bar_index,
            entry_time: context.timestamp,
            stop_loss,
            take_profit,
        });

        let execution = Execution {
            side,
            price,
            quantity,
            fee,
            bar_index: context.bar_index,
            timestamp: context.timestamp,
        };
        tracing::debug!(?execution, "Entry filled.");
        Ok((execution, None))
    }

    /// Processes a closing order.
    fn process_close(
        &self,
        reason: ExitReason,
        price: Option<f64>,
        context: FillContext,
        portfolio: &mut Portfolio,
    ) -> Result<(Execution, Option<ClosedPosition>)> {
        // --- 1. Find the Position to Close ---
        let position = portfolio.position.take().ok_or_else(|| Error::ExecutionFailed {
            reason: "no open position to close".to_string(),
        })?;

        // --- 2. Fill price; closing a long sells, closing a short buys ---
        let fill_price = self.slipped(price.unwrap_or(context.price), position.is_short());

        // --- 3. Calculate P&L and Costs ---
        let gross = decimal((fill_price - position.entry_price) * position.quantity * position.side.sign())?;
        let fee = decimal(position.quantity * fill_price)? * decimal(self.settings.commission)?;
        let entry_fee = std::mem::replace(&mut portfolio.entry_fee, dec!(0));

        // --- 4. Update Portfolio State ---
        portfolio.cash += gross - fee;

        let exit = Execution {
            side: position.side.opposite(),
            price: fill_price,
            quantity: position.quantity,
            fee,
            bar_index: context.bar_index,
            timestamp: context.timestamp,
        };
        tracing::debug!(?exit, %reason, "Position closed.");
        let closed = ClosedPosition { net_pnl: gross - fee - entry_fee, entry_fee, reason, exit: exit.clone(), position };
        Ok((exit, Some(closed)))
    }
}

#[async_trait]
impl Executor for SimulatedExecutor {
    fn name(&self) -> &'static str {
        "SimulatedExecutor"
    }

    /// The public method that fulfills the `Executor` trait contract.
    /// It acts as a router to the appropriate internal simulation logic.
    async fn execute(
        &mut self,
        order_request: &OrderRequest,
        context: FillContext,
        portfolio: &mut Portfolio,
    ) -> Result<(Execution, Option<ClosedPosition>)> {
        match *order_request {
            OrderRequest::Open { side, size, stop_loss, take_profit } => {
                self.process_entry(side, size, stop_loss, take_profit, context, portfolio)
            }
            OrderRequest::Close { reason, price } => self.process_close(reason, price, context, portfolio),
        }
    }
}
