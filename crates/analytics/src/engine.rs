// In crates/analytics/src/engine.rs

use crate::types::{EquityPoint, PerformanceReport, Trade};
use core_types::Bar;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

/// The engine responsible for calculating performance metrics from trade data.
#[derive(Debug, Default)]
pub struct AnalyticsEngine;

fn equity_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter(|w| w[0].value > dec!(0))
        .map(|w| (w[1].value / w[0].value - dec!(1)).to_f64().unwrap_or(0.0))
        .collect()
}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculates a full performance report.
    ///
    /// # Arguments
    ///
    /// * `initial_capital`: Cash at the start of the run.
    /// * `trades`: Closed trades in exit order.
    /// * `equity_curve`: One mark per bar.
    /// * `bars`: The bars the run iterated over.
    pub fn calculate(
        &self,
        initial_capital: Decimal,
        trades: &[Trade],
        equity_curve: &[EquityPoint],
        bars: &[Bar],
    ) -> PerformanceReport {
        let mut report = PerformanceReport::new();
        report.initial_equity = initial_capital;

        // 1. Net P&L (Absolute & Percentage)
        report.final_equity = equity_curve
            .last()
            .map(|p| p.value)
            .unwrap_or_else(|| initial_capital + trades.iter().map(|t| t.pnl).sum::<Decimal>());
        report.net_pnl_absolute = report.final_equity - initial_capital;
        if initial_capital > dec!(0) {
            report.net_pnl_percentage =
                (report.net_pnl_absolute / initial_capital).to_f64().unwrap_or(0.0) * 100.0;
        }

        // 2. Buy & hold benchmark
        if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
            if first.close != 0.0 {
                report.buy_and_hold_percentage = (last.close / first.close - 1.0) * 100.0;
            }
        }

        // 3. Max Drawdown (Absolute, Percentage & Duration)
        let mut peak_equity = initial_capital;
        let mut peak_time = equity_curve.first().map(|p| p.timestamp);
        let mut max_drawdown = dec!(0);
        let mut max_drawdown_pct = 0.0_f64;
        let mut longest = chrono::Duration::zero();
        for point in equity_curve {
            if point.value >= peak_equity {
                peak_equity = point.value;
                peak_time = Some(point.timestamp);
                continue;
            }
            let drawdown = peak_equity - point.value;
            max_drawdown = max_drawdown.max(drawdown);
            if peak_equity > dec!(0) {
                max_drawdown_pct = max_drawdown_pct.max((drawdown / peak_equity).to_f64().unwrap_or(0.0) * 100.0);
            }
            if let Some(start) = peak_time {
                longest = longest.max(point.timestamp - start);
            }
        }
        report.max_drawdown_absolute = max_drawdown;
        report.max_drawdown_percentage = max_drawdown_pct;
        report.drawdown_duration_secs = longest.num_seconds();

        // 4. Sharpe & Sortino (per bar)
        let returns = equity_returns(equity_curve);
        if !returns.is_empty() {
            let n = returns.len() as f64;
            let mean_return = returns.iter().sum::<f64>() / n;
            let std_dev = (returns.iter().map(|r| (r - mean_return).powi(2)).sum::<f64>() / n).sqrt();
            report.sharpe_ratio = if std_dev > 0.0 { mean_return / std_dev } else { 0.0 };

            // Downside deviation over all periods, counting gains as zero.
            let downside = (returns.iter().map(|r| r.min(0.0).powi(2)).sum::<f64>() / n).sqrt();
            report.sortino_ratio = if downside > 0.0 { mean_return / downside } else { 0.0 };
        }

        // 5. Exposure
        if !bars.is_empty() {
            let mut held = vec![false; bars.len()];
            for trade in trades {
                let end = trade.exit_bar.min(bars.len());
                for flag in held.iter_mut().take(end).skip(trade.entry_bar) {
                    *flag = true;
                }
            }
            let held_bars = held.iter().filter(|h| **h).count();
            report.exposure_percentage = held_bars as f64 / bars.len() as f64 * 100.0;
        }

        if trades.is_empty() {
            return report;
        }

        // 6. Trade statistics
        report.total_trades = trades.len() as u32;
        let gross_profit: Decimal = trades.iter().filter(|t| t.pnl > dec!(0)).map(|t| t.pnl).sum();
        let gross_loss: Decimal = trades.iter().filter(|t| t.pnl < dec!(0)).map(|t| t.pnl).sum::<Decimal>().abs();
        let wins = trades.iter().filter(|t| t.pnl > dec!(0)).count();
        report.win_rate = wins as f64 / trades.len() as f64 * 100.0;
        report.profit_factor = if gross_loss > dec!(0) {
            (gross_profit / gross_loss).to_f64().unwrap_or(0.0)
        } else if gross_profit > dec!(0) {
            f64::INFINITY // Pure profit
        } else {
            0.0
        };

        let total_duration_secs: i64 = trades.iter().map(|t| (t.exit_time - t.entry_time).num_seconds()).sum();
        report.avg_trade_duration_secs = total_duration_secs as f64 / trades.len() as f64;
        report.expectancy = trades.iter().map(|t| t.pnl).sum::<Decimal>() / Decimal::from(trades.len());

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use core_types::{ExitReason, Side};

    fn ts(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day)
    }

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar { timestamp: ts(i as i64), open: *c, high: *c, low: *c, close: *c, volume: 1.0 })
            .collect()
    }

    fn curve(values: &[Decimal]) -> Vec<EquityPoint> {
        values.iter().enumerate().map(|(i, v)| EquityPoint { timestamp: ts(i as i64), value: *v }).collect()
    }

    fn trade(entry_bar: usize, exit_bar: usize, pnl: Decimal) -> Trade {
        Trade {
            side: Side::Long,
            entry_bar,
            exit_bar,
            entry_time: ts(entry_bar as i64),
            exit_time: ts(exit_bar as i64),
            entry_price: 100.0,
            exit_price: 110.0,
            quantity: 1.0,
            pnl,
            fees: dec!(0),
            exit_reason: ExitReason::Signal,
        }
    }

    #[test]
    fn empty_run_reports_flat_equity_and_benchmark() {
        let report = AnalyticsEngine::new().calculate(
            dec!(1000),
            &[],
            &curve(&[dec!(1000), dec!(1000)]),
            &bars(&[50.0, 75.0]),
        );
        assert_eq!(report.final_equity, dec!(1000));
        assert_eq!(report.total_trades, 0);
        assert!((report.buy_and_hold_percentage - 50.0).abs() < 1e-9);
        assert_eq!(report.exposure_percentage, 0.0);
    }

    #[test]
    fn drawdown_is_measured_from_running_peak() {
        let equity = curve(&[dec!(1000), dec!(1200), dec!(900), dec!(1100), dec!(1300)]);
        let report = AnalyticsEngine::new().calculate(dec!(1000), &[], &equity, &bars(&[1.0; 5]));

        assert_eq!(report.max_drawdown_absolute, dec!(300));
        assert!((report.max_drawdown_percentage - 25.0).abs() < 1e-9);
        assert_eq!(report.drawdown_duration_secs, Duration::days(2).num_seconds());
        assert!((report.net_pnl_percentage - 30.0).abs() < 1e-9);
    }

    #[test]
    fn trade_statistics() {
        let trades = [trade(0, 2, dec!(100)), trade(2, 3, dec!(-50)), trade(4, 6, dec!(150))];
        let equity = curve(&[dec!(1000); 8]);
        let report = AnalyticsEngine::new().calculate(dec!(1000), &trades, &equity, &bars(&[1.0; 8]));

        assert_eq!(report.total_trades, 3);
        assert!((report.win_rate - 200.0 / 3.0).abs() < 1e-9);
        assert!((report.profit_factor - 5.0).abs() < 1e-9);
        assert_eq!(report.expectancy, dec!(200) / dec!(3));
        // Bars 0, 1, 2, 4 and 5 are held.
        assert!((report.exposure_percentage - 62.5).abs() < 1e-9);
    }

    #[test]
    fn long_trade_return_is_price_based() {
        let t = trade(0, 1, dec!(10));
        assert!((t.return_pct() - 10.0).abs() < 1e-9);
    }
}
