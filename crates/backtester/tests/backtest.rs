// In crates/backtester/tests/backtest.rs

use std::sync::{Arc, Mutex};

use api_client::ScriptedCompletionClient;
use async_trait::async_trait;
use backtester::Backtester;
use chrono::{Duration, TimeZone, Utc};
use core_types::{Bar, ExitReason, Position, Side, Signal};
use execution::{SimulatedExecutor, SimulationSettings};
use strategies::types::{FvgSettings, LlmSignalSettings, SmaCrossSettings};
use strategies::{FairValueGap, LlmSignalStrategy, SmaCross, Strategy};

fn bar(i: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
    let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    Bar { timestamp: start + Duration::days(i as i64), open, high, low, close, volume: 1_000.0 }
}

fn closes(values: &[f64]) -> Vec<Bar> {
    values.iter().enumerate().map(|(i, c)| bar(i, *c, c + 0.5, c - 0.5, *c)).collect()
}

fn executor() -> Box<SimulatedExecutor> {
    Box::new(SimulatedExecutor::new(SimulationSettings::default()))
}

#[tokio::test]
async fn sma_cross_reverses_and_liquidates_at_end() {
    let strategy = SmaCross::new(SmaCrossSettings { n1: 2, n2: 3 }).unwrap();
    let mut bt = Backtester::new("TEST", Box::new(strategy), executor(), 100_000.0).unwrap();
    let bars = closes(&[3.0, 2.0, 1.0, 4.0, 5.0, 2.0, 1.0]);

    let result = bt.run(&bars).await.unwrap();

    assert_eq!(result.trades.len(), 2);
    assert_eq!(result.trades[0].side, Side::Long);
    assert_eq!(result.trades[0].exit_reason, ExitReason::Signal);
    assert_eq!((result.trades[0].entry_bar, result.trades[0].exit_bar), (3, 5));
    assert_eq!(result.trades[1].side, Side::Short);
    assert_eq!(result.trades[1].exit_reason, ExitReason::EndOfData);
    assert_eq!(result.equity_curve.len(), bars.len());
    assert_eq!(result.report.total_trades, 2);
    assert_eq!(result.report.final_equity, result.equity_curve.last().unwrap().value);
}

#[tokio::test]
async fn fvg_stop_loss_fills_at_stop_price() {
    let strategy = FairValueGap::new(FvgSettings::default()).unwrap();
    let mut bt = Backtester::new("TEST", Box::new(strategy), executor(), 100_000.0).unwrap();
    let bars = vec![
        bar(0, 99.0, 100.0, 98.0, 99.5),
        bar(1, 103.0, 106.0, 102.0, 105.0),
        bar(2, 104.0, 104.5, 100.5, 101.0),
        bar(3, 100.5, 101.0, 99.0, 100.0),
    ];

    let result = bt.run(&bars).await.unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::StopLoss);
    assert!((trade.exit_price - 99.99).abs() < 1e-9);
    assert_eq!(trade.entry_bar, 2);
    assert!(trade.pnl.is_sign_negative());
}

#[tokio::test]
async fn model_strategy_trades_scripted_assessment() {
    let client = Arc::new(ScriptedCompletionClient::new([r#"```json
        {"signal": "buy", "confidence": 9.0, "position_size": 0.2, "market_trend": "bullish",
         "justification": "steady uptrend",
         "next_call_criteria": {"type": "time_based", "bars": 50, "description": "let it run"}}
        ```"#]));
    let strategy = LlmSignalStrategy::new(LlmSignalSettings::default(), Some(client.clone())).unwrap();
    let mut bt = Backtester::new("TEST", Box::new(strategy), executor(), 100_000.0).unwrap();
    let bars = closes(&(0..11).map(|i| 100.0 + i as f64).collect::<Vec<_>>());

    let result = bt.run(&bars).await.unwrap();

    assert_eq!(client.calls(), 1);
    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].quantity, 199.0);
    assert_eq!(result.trades[0].exit_reason, ExitReason::EndOfData);
    assert!(result.report.net_pnl_percentage > 0.0);
}

/// Records the history length it is shown on every bar.
struct Probe {
    seen: Arc<Mutex<Vec<usize>>>,
}

#[async_trait]
impl Strategy for Probe {
    fn name(&self) -> &'static str {
        "Probe"
    }

    async fn assess(&mut self, bars: &[Bar], _position: Option<&Position>) -> Signal {
        self.seen.lock().unwrap().push(bars.len());
        Signal::Hold
    }
}

#[tokio::test]
async fn strategies_never_see_future_bars() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut bt = Backtester::new("TEST", Box::new(Probe { seen: seen.clone() }), executor(), 10_000.0).unwrap();
    let bars = closes(&[1.0, 2.0, 3.0, 4.0]);

    let result = bt.run(&bars).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4]);
    assert!(result.trades.is_empty());
    assert_eq!(result.report.final_equity, result.report.initial_equity);
}

#[tokio::test]
async fn unordered_bars_are_rejected() {
    let strategy = SmaCross::new(SmaCrossSettings::default()).unwrap();
    let mut bt = Backtester::new("TEST", Box::new(strategy), executor(), 10_000.0).unwrap();
    let mut bars = closes(&[1.0, 2.0, 3.0]);
    bars.swap(0, 2);

    assert!(bt.run(&bars).await.is_err());
    assert!(Backtester::new("TEST", Box::new(Probe { seen: Default::default() }), executor(), 0.0).is_err());
}
