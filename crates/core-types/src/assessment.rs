// In crates/core-types/src/assessment.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position fraction carried by a fallback assessment.
pub const FALLBACK_POSITION_SIZE: f64 = 0.1;

/// The categorical trading decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Action {
    /// Case-insensitive parse of `buy` / `sell` / `hold`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Some(Action::Buy),
            "sell" => Some(Action::Sell),
            "hold" => Some(Action::Hold),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

/// A trend assessment attached to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketTrend {
    Bullish,
    Bearish,
    #[default]
    Sideways,
}

impl MarketTrend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullish" => Some(MarketTrend::Bullish),
            "bearish" => Some(MarketTrend::Bearish),
            "sideways" => Some(MarketTrend::Sideways),
            _ => None,
        }
    }

    pub fn is_trending(self) -> bool {
        !matches!(self, MarketTrend::Sideways)
    }
}

impl fmt::Display for MarketTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketTrend::Bullish => "BULLISH",
            MarketTrend::Bearish => "BEARISH",
            MarketTrend::Sideways => "SIDEWAYS",
        };
        f.write_str(s)
    }
}

/// When the next expensive signal evaluation should happen.
///
/// Exactly one criterion is active at a time; a new assessment replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecallCriterion {
    /// Re-evaluate on every bar.
    #[default]
    Immediate,
    /// Wait `bars` bars from the reference bar.
    TimeBased { bars: u32 },
    /// Wait until volume has moved `percent` % from the reference volume.
    VolumeChange { percent: f64 },
}

impl fmt::Display for RecallCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecallCriterion::Immediate => f.write_str("immediate"),
            RecallCriterion::TimeBased { bars } => write!(f, "after {bars} bars"),
            RecallCriterion::VolumeChange { percent } => write!(f, "on {percent:.1}% volume change"),
        }
    }
}

/// A full trading assessment as produced by a signal source.
///
/// Superseded by the next assessment; nothing in it is merged across evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAssessment {
    pub action: Action,
    /// 0-10 scale.
    pub confidence: f64,
    /// Fraction of equity, 0-1.
    pub position_size: f64,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
    pub market_trend: MarketTrend,
    pub justification: String,
    pub recall: RecallCriterion,
    /// Free-text description that came with the recall criterion.
    pub recall_note: String,
}

impl TradeAssessment {
    /// The safe fallback used whenever a signal source fails: hold, zero confidence,
    /// and re-evaluate on the next bar.
    pub fn fallback_hold(justification: impl Into<String>) -> Self {
        Self {
            action: Action::Hold,
            confidence: 0.0,
            position_size: FALLBACK_POSITION_SIZE,
            take_profit: None,
            stop_loss: None,
            market_trend: MarketTrend::Sideways,
            justification: justification.into(),
            recall: RecallCriterion::Immediate,
            recall_note: "monitor market".to_string(),
        }
    }
}

impl Default for TradeAssessment {
    fn default() -> Self {
        Self::fallback_hold(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parse_ignores_case_and_whitespace() {
        assert_eq!(Action::parse(" BUY "), Some(Action::Buy));
        assert_eq!(Action::parse("Sell"), Some(Action::Sell));
        assert_eq!(Action::parse("long"), None);
    }

    #[test]
    fn fallback_hold_is_zero_confidence_immediate() {
        let a = TradeAssessment::fallback_hold("boom");
        assert_eq!(a.action, Action::Hold);
        assert_eq!(a.confidence, 0.0);
        assert_eq!(a.position_size, 0.1);
        assert_eq!(a.recall, RecallCriterion::Immediate);
    }

    #[test]
    fn criterion_serializes_with_type_tag() {
        let json = serde_json::to_string(&RecallCriterion::TimeBased { bars: 10 }).unwrap();
        assert_eq!(json, r#"{"type":"time_based","bars":10}"#);
    }
}
