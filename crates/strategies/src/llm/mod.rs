// In crates/strategies/src/llm/mod.rs

//! A strategy that asks a language model for a trade assessment.
//!
//! Model calls are expensive, so the strategy only re-queries when the recall criterion
//! attached to the previous assessment is due. Between calls the stored assessment stays
//! in force and the `ConfidenceGate` decides whether anything is executed.

pub mod parse;
pub mod prompt;
pub mod recall;
pub mod state;

pub use recall::{RecallReference, is_due};
pub use state::StrategyState;

use crate::types::LlmSignalSettings;
use crate::{Result, Strategy};
use api_client::CompletionClient;
use async_trait::async_trait;
use core_types::{Bar, Position, Signal, TradeAssessment};
use risk::{ConfidenceGate, Decision, RiskManager};
use std::sync::Arc;

pub struct LlmSignalStrategy {
    settings: LlmSignalSettings,
    client: Option<Arc<dyn CompletionClient>>,
    gate: ConfidenceGate,
    state: StrategyState,
}

impl std::fmt::Debug for LlmSignalStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSignalStrategy")
            .field("settings", &self.settings)
            .field("provider", &self.client.as_ref().map(|c| c.provider().to_string()))
            .field("state", &self.state)
            .finish()
    }
}

impl LlmSignalStrategy {
    /// Creates the strategy. Without a client every acquisition yields the safe hold.
    pub fn new(settings: LlmSignalSettings, client: Option<Arc<dyn CompletionClient>>) -> Result<Self> {
        settings.validate()?;
        if client.is_none() {
            tracing::warn!("No completion client configured; the model strategy will only hold.");
        }
        Ok(Self {
            gate: ConfidenceGate::new(settings.filter.clone()),
            settings,
            client,
            state: StrategyState::default(),
        })
    }

    pub fn state(&self) -> &StrategyState {
        &self.state
    }

    /// Queries the model over `window`. Never fails: every error becomes the safe hold.
    pub async fn acquire(&self, window: &[Bar]) -> TradeAssessment {
        let Some(client) = &self.client else {
            return TradeAssessment::fallback_hold("completion client not configured");
        };
        let Some(user_prompt) = prompt::build_prompt(window) else {
            return TradeAssessment::fallback_hold("no market data");
        };

        match client.complete(prompt::SYSTEM_PROMPT, &user_prompt).await {
            Ok(reply) => parse::parse_reply(&reply, self.settings.filter.max_position_size),
            Err(e) => {
                tracing::warn!(provider = client.provider(), error = %e, "Completion request failed.");
                TradeAssessment {
                    recall_note: "API error: monitor market".into(),
                    ..TradeAssessment::fallback_hold(format!("API error: {e}"))
                }
            }
        }
    }
}

#[async_trait]
impl Strategy for LlmSignalStrategy {
    fn name(&self) -> &'static str {
        "LlmSignal"
    }

    async fn assess(&mut self, bars: &[Bar], position: Option<&Position>) -> Signal {
        let Some(current) = bars.last() else {
            return Signal::Hold;
        };
        let bar_index = bars.len() - 1;

        // A shorter history than the last reference means a new run.
        if self.state.reference.is_some_and(|r| r.bar > bar_index) {
            self.state = StrategyState::default();
        }

        let mut new_signal = false;
        if is_due(self.state.recall.as_ref(), self.state.reference.as_ref(), bar_index, current.volume) {
            let start = bars.len().saturating_sub(self.settings.lookback_periods);
            let assessment = self.acquire(&bars[start..]).await;
            let reference = RecallReference { price: current.close, volume: current.volume, bar: bar_index };
            new_signal = self.state.adopt(assessment, reference);

            let a = &self.state.assessment;
            tracing::info!(
                bar = bar_index,
                price = current.close,
                signal = %a.action,
                confidence = a.confidence,
                size = a.position_size,
                trend = %a.market_trend,
                take_profit = ?a.take_profit,
                stop_loss = ?a.stop_loss,
                next_call = %a.recall,
                note = %a.recall_note,
                justification = %a.justification,
                "Model assessment received."
            );
        }

        let decision = self.gate.evaluate(
            &self.state.assessment,
            new_signal,
            bar_index,
            current.close,
            position,
            &mut self.state.ledger,
        );

        match decision {
            Ok(Decision::ProtectiveExit(reason)) => {
                self.state.reassess_now(format!("Reassess after {reason}"));
                Signal::Close
            }
            Ok(Decision::Submit(signal)) => {
                tracing::info!(bar = bar_index, price = current.close, ?signal, "Executing model signal.");
                signal
            }
            Ok(Decision::NoAction) => Signal::Hold,
            Err(e) => {
                tracing::info!(bar = bar_index, reason = %e, "Model signal filtered out.");
                Signal::Hold
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bar, bars_from_closes};
    use api_client::ScriptedCompletionClient;
    use chrono::Utc;
    use core_types::{Action, RecallCriterion, Side};

    const BUY_WAIT_5: &str = r#"{"signal": "buy", "confidence": 9.0, "position_size": 0.30,
        "market_trend": "bullish", "justification": "trend",
        "next_call_criteria": {"type": "time_based", "bars": 5, "description": "wait"}}"#;

    fn strategy(client: Arc<ScriptedCompletionClient>) -> LlmSignalStrategy {
        LlmSignalStrategy::new(LlmSignalSettings::default(), Some(client)).unwrap()
    }

    fn long_position() -> Position {
        Position {
            side: Side::Long,
            quantity: 1.0,
            entry_price: 100.0,
            entry_bar: 0,
            entry_time: Utc::now(),
            stop_loss: None,
            take_profit: None,
        }
    }

    #[tokio::test]
    async fn confident_buy_is_sized_by_the_filter_and_executed_once() {
        let client = Arc::new(ScriptedCompletionClient::new([BUY_WAIT_5]));
        let mut s = strategy(client.clone());
        let bars = bars_from_closes(&[100.0; 12]);

        let first = s.assess(&bars[..1], None).await;
        assert_eq!(first, Signal::buy(Some(0.25)));

        let position = long_position();
        for i in 1..12 {
            assert_eq!(s.assess(&bars[..=i], Some(&position)).await, Signal::Hold, "bar {i}");
        }
        // Queried on bars 0, 5 and 10.
        assert_eq!(client.calls(), 3);
        assert_eq!(s.state().ledger.last_trade_bar, Some(0));
    }

    #[tokio::test]
    async fn time_based_recall_skips_intermediate_bars() {
        let client = Arc::new(ScriptedCompletionClient::new([
            r#"{"signal": "hold", "market_trend": "sideways"}"#,
        ]));
        let mut s = strategy(client.clone());
        let bars = bars_from_closes(&[100.0; 25]);

        for i in 0..25 {
            s.assess(&bars[..=i], None).await;
        }
        // Sideways default waits ten bars: calls on 0, 10 and 20.
        assert_eq!(client.calls(), 3);
        assert_eq!(s.state().recall, Some(RecallCriterion::TimeBased { bars: 10 }));
    }

    #[tokio::test]
    async fn api_failure_degrades_to_hold_and_requeries() {
        let client = Arc::new(ScriptedCompletionClient::new(Vec::<String>::new()));
        client.push_failure("service unavailable");
        let mut s = strategy(client.clone());
        let bars = bars_from_closes(&[100.0, 101.0]);

        assert_eq!(s.assess(&bars[..1], None).await, Signal::Hold);
        assert_eq!(s.state().assessment.action, Action::Hold);
        assert_eq!(s.state().assessment.confidence, 0.0);
        assert!(s.state().assessment.justification.starts_with("API error"));

        // Immediate recall after a failure.
        s.assess(&bars, None).await;
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn missing_client_always_holds() {
        let mut s = LlmSignalStrategy::new(LlmSignalSettings::default(), None).unwrap();
        let bars = bars_from_closes(&[100.0, 101.0, 102.0]);
        for i in 0..3 {
            assert_eq!(s.assess(&bars[..=i], None).await, Signal::Hold);
        }
        assert_eq!(s.state().assessment.justification, "completion client not configured");
    }

    #[tokio::test]
    async fn stop_loss_breach_closes_and_forces_reassessment() {
        let client = Arc::new(ScriptedCompletionClient::new([
            r#"{"signal": "buy", "confidence": 9.0, "position_size": 0.2, "stop_loss": 95,
                "market_trend": "bullish",
                "next_call_criteria": {"type": "time_based", "bars": 50}}"#,
        ]));
        let mut s = strategy(client.clone());
        let bars = vec![
            bar(0, 100.0, 101.0, 99.0, 100.0, 1_000.0),
            bar(1, 100.0, 100.0, 93.0, 94.0, 1_000.0),
            bar(2, 94.0, 95.0, 93.0, 94.5, 1_000.0),
        ];

        assert!(matches!(s.assess(&bars[..1], None).await, Signal::GoLong { .. }));
        let position = long_position();
        assert_eq!(s.assess(&bars[..2], Some(&position)).await, Signal::Close);
        assert_eq!(s.state().recall, Some(RecallCriterion::Immediate));
        assert_eq!(s.state().assessment.recall_note, "Reassess after stop loss");

        // Same action comes back: nothing new is executed.
        assert_eq!(s.assess(&bars, None).await, Signal::Hold);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn lookback_limits_the_prompt_window() {
        let client = Arc::new(ScriptedCompletionClient::new([r#"{"signal": "hold"}"#]));
        let settings = LlmSignalSettings { lookback_periods: 3, ..Default::default() };
        let mut s = LlmSignalStrategy::new(settings, Some(client.clone())).unwrap();
        let bars = bars_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        s.assess(&bars, None).await;

        let prompt = &client.prompts()[0];
        assert!(prompt.contains("last 3 bars"));
        assert!(!prompt.contains("\"close\": 2.0"));
    }

    #[tokio::test]
    async fn low_confidence_flattens_open_position() {
        let client = Arc::new(ScriptedCompletionClient::new([
            r#"{"signal": "sell", "confidence": 6.0, "market_trend": "bearish"}"#,
        ]));
        let mut s = strategy(client);
        let bars = bars_from_closes(&[100.0]);
        let position = long_position();

        assert_eq!(s.assess(&bars, Some(&position)).await, Signal::Close);
    }
}
