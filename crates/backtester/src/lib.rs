// In crates/backtester/src/lib.rs

pub mod logger;

use analytics::engine::AnalyticsEngine;
use analytics::types::{EquityPoint, PerformanceReport, Trade};
use anyhow::Context;
use core_types::{Bar, ExitReason, Position, Side, Signal};
use execution::{Executor, FillContext, OrderRequest, Portfolio};
use logger::TradeLogger;
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use strategies::Strategy;

/// Everything a finished run produces.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub report: PerformanceReport,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

/// The main engine for running historical backtests.
///
/// Bars are processed in order. On every bar the open position's stop-loss and take-profit
/// are checked against the bar's range first, then the strategy is asked for a signal over
/// all bars up to and including the current one, and the signal is filled at the close.
/// Orders are exclusive: a new entry closes any open position first.
pub struct Backtester {
    /// The symbol under test, for logging.
    pub symbol: String,
    /// A single strategy instance to test.
    pub strategy: Box<dyn Strategy>,
    /// The execution simulator.
    pub executor: Box<dyn Executor>,
    initial_cash: Decimal,
    logger: TradeLogger,
    portfolio: Portfolio,
}

impl Backtester {
    pub fn new(
        symbol: impl Into<String>,
        strategy: Box<dyn Strategy>,
        executor: Box<dyn Executor>,
        initial_cash: f64,
    ) -> anyhow::Result<Self> {
        let initial_cash = Decimal::from_f64(initial_cash)
            .filter(|c| c.is_sign_positive() && !c.is_zero())
            .with_context(|| format!("Initial cash must be a positive amount, got {initial_cash}"))?;
        Ok(Self {
            symbol: symbol.into(),
            strategy,
            executor,
            initial_cash,
            logger: TradeLogger::new(),
            portfolio: Portfolio::new(initial_cash),
        })
    }

    /// Runs the strategy over `bars` and returns the report, trade list and equity curve.
    ///
    /// The backtester can be reused: every call starts from fresh cash.
    pub async fn run(&mut self, bars: &[Bar]) -> anyhow::Result<BacktestResult> {
        Bar::validate_series(bars).context("Refusing to backtest an invalid bar series")?;
        self.portfolio = Portfolio::new(self.initial_cash);
        self.logger = TradeLogger::new();

        tracing::info!(
            symbol = %self.symbol,
            strategy = self.strategy.name(),
            executor = self.executor.name(),
            bars = bars.len(),
            cash = %self.initial_cash,
            "Starting backtest."
        );

        for (i, bar) in bars.iter().enumerate() {
            let context = FillContext { bar_index: i, timestamp: bar.timestamp, price: bar.close };

            // --- 1. Stop-loss / take-profit inside the bar's range ---
            if let Some((reason, price)) = self.portfolio.position.as_ref().and_then(|p| protective_fill(p, bar)) {
                tracing::info!(bar = i, %reason, price, "Protective exit triggered.");
                self.submit(OrderRequest::Close { reason, price: Some(price) }, context).await;
            }

            // --- 2. Ask the strategy ---
            let signal = self.strategy.assess(&bars[..=i], self.portfolio.position.as_ref()).await;

            // --- 3. Turn the signal into orders ---
            match signal {
                Signal::Hold => {}
                Signal::Close => {
                    if self.portfolio.position.is_some() {
                        self.submit(OrderRequest::Close { reason: ExitReason::Signal, price: None }, context).await;
                    }
                }
                Signal::GoLong { stop_loss, take_profit, .. } | Signal::GoShort { stop_loss, take_profit, .. } => {
                    match signal.checked_size() {
                        Ok(size) => {
                            if self.portfolio.position.is_some() {
                                self.submit(OrderRequest::Close { reason: ExitReason::Signal, price: None }, context)
                                    .await;
                            }
                            let side = if matches!(signal, Signal::GoLong { .. }) { Side::Long } else { Side::Short };
                            self.submit(OrderRequest::Open { side, size, stop_loss, take_profit }, context).await;
                        }
                        Err(e) => tracing::warn!(bar = i, error = %e, "Strategy produced an invalid order."),
                    }
                }
            }

            // --- 4. Mark to market ---
            let equity = Decimal::from_f64(self.portfolio.equity(bar.close)).unwrap_or(self.portfolio.cash);
            self.logger.record_equity(bar.timestamp, equity);
        }

        // --- Liquidate whatever is still open ---
        if let Some(last) = bars.last().filter(|_| self.portfolio.position.is_some()) {
            let context = FillContext { bar_index: bars.len() - 1, timestamp: last.timestamp, price: last.close };
            self.submit(OrderRequest::Close { reason: ExitReason::EndOfData, price: None }, context).await;
            self.logger.amend_last_equity(self.portfolio.cash);
        }

        let report = AnalyticsEngine::new().calculate(
            self.initial_cash,
            &self.logger.trades,
            &self.logger.equity_curve,
            bars,
        );
        tracing::info!(
            symbol = %self.symbol,
            trades = report.total_trades,
            final_equity = %report.final_equity,
            return_pct = report.net_pnl_percentage,
            "Backtest finished."
        );

        Ok(BacktestResult {
            report,
            trades: self.logger.trades.clone(),
            equity_curve: self.logger.equity_curve.clone(),
        })
    }

    /// Sends one order to the executor and logs the outcome. Failed orders are skipped.
    async fn submit(&mut self, order: OrderRequest, context: FillContext) {
        match self.executor.execute(&order, context, &mut self.portfolio).await {
            Ok((_, Some(closed))) => self.logger.record_trade(&closed),
            Ok((execution, None)) => {
                tracing::info!(bar = context.bar_index, side = ?execution.side, price = execution.price, quantity = execution.quantity, "Position opened.");
            }
            Err(e) => tracing::warn!(bar = context.bar_index, ?order, error = %e, "Order execution failed."),
        }
    }
}

/// Checks an open position's exits against a bar's range.
///
/// Returns the reason and fill price. A bar that opens beyond the level fills at the open.
/// When both levels are inside one bar the stop is assumed to have been hit first.
fn protective_fill(position: &Position, bar: &Bar) -> Option<(ExitReason, f64)> {
    match position.side {
        Side::Long => {
            if let Some(sl) = position.stop_loss.filter(|sl| bar.low <= *sl) {
                Some((ExitReason::StopLoss, sl.min(bar.open)))
            } else {
                position
                    .take_profit
                    .filter(|tp| bar.high >= *tp)
                    .map(|tp| (ExitReason::TakeProfit, tp.max(bar.open)))
            }
        }
        Side::Short => {
            if let Some(sl) = position.stop_loss.filter(|sl| bar.high >= *sl) {
                Some((ExitReason::StopLoss, sl.max(bar.open)))
            } else {
                position
                    .take_profit
                    .filter(|tp| bar.low <= *tp)
                    .map(|tp| (ExitReason::TakeProfit, tp.min(bar.open)))
            }
        }
    }
}

/// Helper function to print the performance report in a readable format.
pub fn print_report(symbol: &str, strategy: &str, report: &PerformanceReport) {
    println!("\n--- Backtest Performance Report: {} / {} ---", strategy, symbol);
    println!("-----------------------------------");
    println!("Initial Equity:        ${:.2}", report.initial_equity);
    println!("Final Equity:          ${:.2}", report.final_equity);
    println!("Return:                {:.2}%", report.net_pnl_percentage);
    println!("Buy & Hold Return:     {:.2}%", report.buy_and_hold_percentage);
    println!("Exposure Time:         {:.2}%", report.exposure_percentage);
    println!("-----------------------------------");
    println!("Max Drawdown:          ${:.2} ({:.2}%)", report.max_drawdown_absolute, report.max_drawdown_percentage);
    println!("Max Drawdown Duration: {}s", report.drawdown_duration_secs);
    println!("Sharpe Ratio:          {:.3}", report.sharpe_ratio);
    println!("Sortino Ratio:         {:.3}", report.sortino_ratio);
    println!("-----------------------------------");
    println!("Total Trades:          {}", report.total_trades);
    println!("Win Rate:              {:.2}%", report.win_rate);
    println!("Profit Factor:         {:.2}", report.profit_factor);
    println!("Avg. Trade Duration:   {:.1}s", report.avg_trade_duration_secs);
    println!("Expectancy:            ${:.2}", report.expectancy);
    println!("-----------------------------------");
}
