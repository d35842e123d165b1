// In crates/risk/src/confidence_gate.rs

use crate::types::{ExitReason, TradeFilterSettings, TradeLedger};
use crate::{Decision, Error, Result, RiskManager};
use core_types::{Action, MarketTrend, Position, Side, Signal, TradeAssessment};

/// A risk manager for discretionary (model-driven) signals.
///
/// This manager implements three rules:
/// 1. A breached stop-loss or take-profit on the open position forces a close first.
/// 2. Entries need high confidence, enough spacing since the last trade, and a trend
///    assessment that does not contradict the direction.
/// 3. A hold, or anything below the confidence threshold, flattens the book.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceGate {
    settings: TradeFilterSettings,
}

impl ConfidenceGate {
    pub fn new(settings: TradeFilterSettings) -> Self {
        Self { settings }
    }

    /// The size actually sent to the executor.
    pub fn capped_size(&self, requested: f64) -> f64 {
        requested.min(self.settings.max_position_size)
    }

    fn spacing_ok(&self, ledger: &TradeLedger, bar_index: usize) -> bool {
        ledger
            .bars_since_last_trade(bar_index)
            .is_none_or(|bars| bars >= self.settings.min_bars_between_trades)
    }

    fn entry(
        &self,
        side: Side,
        assessment: &TradeAssessment,
        bar_index: usize,
        ledger: &mut TradeLedger,
    ) -> Result<Decision> {
        ledger.signal_executed = true;

        let contradicting = match side {
            Side::Long => MarketTrend::Bearish,
            Side::Short => MarketTrend::Bullish,
        };
        let spacing_ok = self.spacing_ok(ledger, bar_index);
        let trend_ok = assessment.market_trend != contradicting;

        if !spacing_ok || !trend_ok {
            let since = ledger
                .bars_since_last_trade(bar_index)
                .map_or_else(|| "none".to_string(), |b| b.to_string());
            return Err(Error::Vetoed {
                reason: format!(
                    "{} filtered: bars since last trade {} (need {}), market trend {}",
                    assessment.action, since, self.settings.min_bars_between_trades, assessment.market_trend
                ),
            });
        }

        let size = self.capped_size(assessment.position_size);
        if size <= 0.0 {
            return Err(Error::Vetoed {
                reason: format!("{} filtered: non-positive position size {}", assessment.action, size),
            });
        }

        ledger.last_trade_bar = Some(bar_index);
        let signal = match side {
            Side::Long => Signal::buy(Some(size)),
            Side::Short => Signal::sell(Some(size)),
        };
        Ok(Decision::Submit(signal))
    }
}

/// Checks the stored stop-loss / take-profit levels against the current price.
pub fn breached_exit(
    position: &Position,
    price: f64,
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
) -> Option<ExitReason> {
    match position.side {
        Side::Long => {
            if stop_loss.is_some_and(|sl| price <= sl) {
                Some(ExitReason::StopLoss)
            } else if take_profit.is_some_and(|tp| price >= tp) {
                Some(ExitReason::TakeProfit)
            } else {
                None
            }
        }
        Side::Short => {
            if stop_loss.is_some_and(|sl| price >= sl) {
                Some(ExitReason::StopLoss)
            } else if take_profit.is_some_and(|tp| price <= tp) {
                Some(ExitReason::TakeProfit)
            } else {
                None
            }
        }
    }
}

impl RiskManager for ConfidenceGate {
    fn name(&self) -> &'static str {
        "ConfidenceGate"
    }

    fn evaluate(
        &self,
        assessment: &TradeAssessment,
        new_signal: bool,
        bar_index: usize,
        price: f64,
        open_position: Option<&Position>,
        ledger: &mut TradeLedger,
    ) -> Result<Decision> {
        // --- Protective exits take priority over everything else ---
        if let Some(position) = open_position {
            if let Some(reason) =
                breached_exit(position, price, assessment.stop_loss, assessment.take_profit)
            {
                tracing::info!(%reason, price, "Protective exit triggered.");
                ledger.signal_executed = true;
                return Ok(Decision::ProtectiveExit(reason));
            }
        }

        // A signal is acted on at most once.
        if ledger.signal_executed || !new_signal {
            return Ok(Decision::NoAction);
        }

        let threshold = self.settings.min_confidence_threshold;
        let is_long = open_position.is_some_and(Position::is_long);
        let is_short = open_position.is_some_and(Position::is_short);

        match assessment.action {
            Action::Buy if !is_long && assessment.confidence >= threshold => {
                self.entry(Side::Long, assessment, bar_index, ledger)
            }
            Action::Sell if !is_short && assessment.confidence >= threshold => {
                self.entry(Side::Short, assessment, bar_index, ledger)
            }
            action if action == Action::Hold || assessment.confidence < threshold => {
                ledger.signal_executed = true;
                if open_position.is_some() {
                    ledger.last_trade_bar = Some(bar_index);
                    return Ok(Decision::Submit(Signal::Close));
                }
                if assessment.confidence < threshold {
                    tracing::info!(
                        confidence = assessment.confidence,
                        threshold,
                        "No trade: confidence below threshold."
                    );
                }
                Ok(Decision::NoAction)
            }
            // Already positioned in the signalled direction.
            _ => Ok(Decision::NoAction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::RecallCriterion;

    fn assessment(action: Action, confidence: f64, trend: MarketTrend, size: f64) -> TradeAssessment {
        TradeAssessment {
            action,
            confidence,
            position_size: size,
            take_profit: None,
            stop_loss: None,
            market_trend: trend,
            justification: String::new(),
            recall: RecallCriterion::Immediate,
            recall_note: String::new(),
        }
    }

    fn position(side: Side) -> Position {
        Position {
            side,
            quantity: 1.0,
            entry_price: 100.0,
            entry_bar: 0,
            entry_time: Utc::now(),
            stop_loss: None,
            take_profit: None,
        }
    }

    #[test]
    fn confident_bullish_buy_is_capped_at_max_size() {
        let gate = ConfidenceGate::default();
        let mut ledger = TradeLedger::default();
        let a = assessment(Action::Buy, 9.0, MarketTrend::Bullish, 0.30);

        let decision = gate.evaluate(&a, true, 5, 100.0, None, &mut ledger).unwrap();

        assert_eq!(decision, Decision::Submit(Signal::buy(Some(0.25))));
        assert!(ledger.signal_executed);
        assert_eq!(ledger.last_trade_bar, Some(5));
    }

    #[test]
    fn buy_needs_minimum_spacing_since_last_trade() {
        let gate = ConfidenceGate::default();
        let a = assessment(Action::Buy, 9.0, MarketTrend::Bullish, 0.2);

        let mut ledger = TradeLedger { signal_executed: false, last_trade_bar: Some(10) };
        let result = gate.evaluate(&a, true, 19, 100.0, None, &mut ledger);
        assert!(matches!(result, Err(Error::Vetoed { .. })));
        assert!(ledger.signal_executed, "a filtered signal still counts as handled");

        let mut ledger = TradeLedger { signal_executed: false, last_trade_bar: Some(10) };
        let decision = gate.evaluate(&a, true, 20, 100.0, None, &mut ledger).unwrap();
        assert!(matches!(decision, Decision::Submit(Signal::GoLong { .. })));
    }

    #[test]
    fn no_buying_into_a_bearish_assessment() {
        let gate = ConfidenceGate::default();
        let mut ledger = TradeLedger::default();
        let a = assessment(Action::Buy, 9.5, MarketTrend::Bearish, 0.2);
        assert!(gate.evaluate(&a, true, 50, 100.0, None, &mut ledger).is_err());

        let mut ledger = TradeLedger::default();
        let a = assessment(Action::Sell, 9.5, MarketTrend::Bullish, 0.2);
        assert!(gate.evaluate(&a, true, 50, 100.0, None, &mut ledger).is_err());

        let mut ledger = TradeLedger::default();
        let a = assessment(Action::Sell, 9.5, MarketTrend::Sideways, 0.2);
        let decision = gate.evaluate(&a, true, 50, 100.0, None, &mut ledger).unwrap();
        assert_eq!(decision, Decision::Submit(Signal::sell(Some(0.2))));
    }

    #[test]
    fn low_confidence_closes_open_position_and_opens_nothing() {
        let gate = ConfidenceGate::default();
        let open = position(Side::Long);
        let a = assessment(Action::Sell, 6.0, MarketTrend::Bearish, 0.2);

        let mut ledger = TradeLedger::default();
        let decision = gate.evaluate(&a, true, 30, 100.0, Some(&open), &mut ledger).unwrap();
        assert_eq!(decision, Decision::Submit(Signal::Close));
        assert_eq!(ledger.last_trade_bar, Some(30));

        let mut ledger = TradeLedger::default();
        let decision = gate.evaluate(&a, true, 30, 100.0, None, &mut ledger).unwrap();
        assert_eq!(decision, Decision::NoAction);
        assert!(ledger.signal_executed);
        assert_eq!(ledger.last_trade_bar, None);
    }

    #[test]
    fn unchanged_signal_is_not_resubmitted() {
        let gate = ConfidenceGate::default();
        let mut ledger = TradeLedger::default();
        let a = assessment(Action::Buy, 9.0, MarketTrend::Bullish, 0.2);

        let first = gate.evaluate(&a, true, 0, 100.0, None, &mut ledger).unwrap();
        assert!(matches!(first, Decision::Submit(_)));

        // Same signal on the following bars, whether or not the source was re-queried.
        for bar in 1..30 {
            let next = gate.evaluate(&a, false, bar, 100.0, None, &mut ledger).unwrap();
            assert_eq!(next, Decision::NoAction);
        }
    }

    #[test]
    fn stop_loss_breach_wins_over_fresh_signal() {
        let gate = ConfidenceGate::default();
        let open = position(Side::Long);
        let mut a = assessment(Action::Buy, 2.0, MarketTrend::Sideways, 0.2);
        a.stop_loss = Some(95.0);
        let mut ledger = TradeLedger::default();

        let decision = gate.evaluate(&a, true, 3, 94.0, Some(&open), &mut ledger).unwrap();

        assert_eq!(decision, Decision::ProtectiveExit(ExitReason::StopLoss));
        assert!(ledger.signal_executed);
        assert_eq!(ledger.last_trade_bar, None);
    }

    #[test]
    fn short_take_profit_triggers_below_target() {
        let open = position(Side::Short);
        assert_eq!(breached_exit(&open, 89.0, Some(110.0), Some(90.0)), Some(ExitReason::TakeProfit));
        assert_eq!(breached_exit(&open, 111.0, Some(110.0), Some(90.0)), Some(ExitReason::StopLoss));
        assert_eq!(breached_exit(&open, 100.0, Some(110.0), Some(90.0)), None);
    }

    #[test]
    fn buy_while_long_is_left_alone() {
        let gate = ConfidenceGate::default();
        let open = position(Side::Long);
        let a = assessment(Action::Buy, 9.0, MarketTrend::Bullish, 0.2);
        let mut ledger = TradeLedger::default();

        let decision = gate.evaluate(&a, true, 40, 100.0, Some(&open), &mut ledger).unwrap();

        assert_eq!(decision, Decision::NoAction);
        assert!(!ledger.signal_executed);
    }
}
