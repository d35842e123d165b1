// In crates/strategies/src/llm/parse.rs

use core_types::{Action, MarketTrend, RecallCriterion, TradeAssessment};
use serde_json::{Map, Value};

const DEFAULT_CONFIDENCE: f64 = 5.0;
const DEFAULT_POSITION_SIZE: f64 = 0.1;
const SIDEWAYS_WAIT_BARS: u32 = 10;
const DEFAULT_TIME_BASED_BARS: u32 = 1;
const DEFAULT_VOLUME_PERCENT: f64 = 50.0;

/// Removes a surrounding Markdown code fence (```` ```json ```` or bare ```` ``` ````).
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").or_else(|| rest.strip_prefix("JSON")).unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Turns a model reply into an assessment.
///
/// Missing fields take their documented defaults; a reply that is not a JSON object yields
/// the safe hold. `position_size` is clamped to `[0, max_position_size]`.
pub fn parse_reply(reply: &str, max_position_size: f64) -> TradeAssessment {
    let body = strip_code_fence(reply);
    let object = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!(kind = json_kind(&other), "Model reply is not a JSON object.");
            return parse_failure();
        }
        Err(e) => {
            let preview: String = body.chars().take(200).collect();
            tracing::warn!(error = %e, %preview, "Failed to parse model reply.");
            return parse_failure();
        }
    };

    let action = match object.get("signal").and_then(Value::as_str) {
        None => Action::Hold,
        Some(raw) => Action::parse(raw).unwrap_or_else(|| {
            tracing::warn!(signal = raw, "Unknown signal in model reply; treating as hold.");
            Action::Hold
        }),
    };
    let market_trend = match object.get("market_trend").and_then(Value::as_str) {
        None => MarketTrend::default(),
        Some(raw) => MarketTrend::parse(raw).unwrap_or_else(|| {
            tracing::warn!(market_trend = raw, "Unknown market trend in model reply; treating as sideways.");
            MarketTrend::Sideways
        }),
    };

    let confidence = number(&object, "confidence").unwrap_or(DEFAULT_CONFIDENCE);
    let position_size = number(&object, "position_size")
        .unwrap_or(DEFAULT_POSITION_SIZE)
        .clamp(0.0, max_position_size);
    let (recall, recall_note) = criterion(object.get("next_call_criteria"), market_trend);

    TradeAssessment {
        action,
        confidence,
        position_size,
        take_profit: price(&object, "take_profit"),
        stop_loss: price(&object, "stop_loss"),
        market_trend,
        justification: object
            .get("justification")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        recall,
        recall_note,
    }
}

fn parse_failure() -> TradeAssessment {
    TradeAssessment {
        recall_note: "Parsing error: monitor market".into(),
        ..TradeAssessment::fallback_hold("Failed to parse model response")
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reads a finite number, accepting numeric strings.
fn number(object: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match object.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

/// Price levels must be positive; zero and null both mean "not set".
fn price(object: &Map<String, Value>, key: &str) -> Option<f64> {
    number(object, key).filter(|p| *p > 0.0)
}

fn trend_default(trend: MarketTrend) -> RecallCriterion {
    if trend.is_trending() {
        RecallCriterion::Immediate
    } else {
        RecallCriterion::TimeBased { bars: SIDEWAYS_WAIT_BARS }
    }
}

fn default_note(trend: MarketTrend) -> String {
    if trend.is_trending() {
        "Default: monitor trending market".into()
    } else {
        "Default: wait in sideways market".into()
    }
}

/// Maps every accepted shape of `next_call_criteria` onto a criterion and its description.
///
/// Unknown criterion types fail open to `Immediate`.
fn criterion(raw: Option<&Value>, trend: MarketTrend) -> (RecallCriterion, String) {
    let spec = match raw {
        Some(Value::Object(spec)) => spec,
        Some(Value::String(note)) => return (trend_default(trend), note.clone()),
        _ => return (trend_default(trend), default_note(trend)),
    };

    let note = spec
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let kind = spec.get("type").and_then(Value::as_str).map(|t| t.trim().to_ascii_lowercase());

    let criterion = match kind.as_deref() {
        Some("immediate") => RecallCriterion::Immediate,
        Some("time_based") => RecallCriterion::TimeBased {
            bars: number(spec, "bars")
                .map(|b| b.round().clamp(0.0, u32::MAX as f64) as u32)
                .unwrap_or(DEFAULT_TIME_BASED_BARS),
        },
        Some("volume_change") => RecallCriterion::VolumeChange {
            percent: number(spec, "percent_increase").unwrap_or(DEFAULT_VOLUME_PERCENT),
        },
        other => {
            tracing::warn!(criterion = ?other, "Unknown recall criterion; re-evaluating next bar.");
            RecallCriterion::Immediate
        }
    };
    (criterion, note)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: f64 = 0.25;

    #[test]
    fn complete_reply_maps_field_for_field() {
        let reply = r#"{
            "signal": "buy",
            "confidence": 9.0,
            "position_size": 0.20,
            "take_profit": 48000,
            "stop_loss": 43000,
            "justification": "Breakout above resistance.",
            "market_trend": "bullish",
            "next_call_criteria": {"type": "time_based", "bars": 5, "description": "Check back later"}
        }"#;

        let a = parse_reply(reply, MAX);

        assert_eq!(
            a,
            TradeAssessment {
                action: Action::Buy,
                confidence: 9.0,
                position_size: 0.20,
                take_profit: Some(48000.0),
                stop_loss: Some(43000.0),
                market_trend: MarketTrend::Bullish,
                justification: "Breakout above resistance.".into(),
                recall: RecallCriterion::TimeBased { bars: 5 },
                recall_note: "Check back later".into(),
            }
        );
    }

    #[test]
    fn malformed_json_is_safe_hold() {
        let a = parse_reply("I think you should buy!", MAX);
        assert_eq!(a.action, Action::Hold);
        assert_eq!(a.confidence, 0.0);
        assert_eq!(a.position_size, 0.1);
        assert_eq!(a.recall, RecallCriterion::Immediate);

        assert_eq!(parse_reply("[1, 2, 3]", MAX).action, Action::Hold);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let a = parse_reply("{}", MAX);
        assert_eq!(a.action, Action::Hold);
        assert_eq!(a.confidence, 5.0);
        assert_eq!(a.position_size, 0.1);
        assert_eq!(a.market_trend, MarketTrend::Sideways);
        assert_eq!(a.recall, RecallCriterion::TimeBased { bars: 10 });
        assert_eq!(a.take_profit, None);
    }

    #[test]
    fn trending_market_defaults_to_immediate_recall() {
        let a = parse_reply(r#"{"signal": "SELL", "market_trend": "Bearish"}"#, MAX);
        assert_eq!(a.action, Action::Sell);
        assert_eq!(a.market_trend, MarketTrend::Bearish);
        assert_eq!(a.recall, RecallCriterion::Immediate);
    }

    #[test]
    fn unknown_trend_is_read_as_sideways() {
        let a = parse_reply(r#"{"signal": "buy", "market_trend": "neutral"}"#, MAX);
        assert_eq!(a.market_trend, MarketTrend::Sideways);
        assert_eq!(a.recall, RecallCriterion::TimeBased { bars: 10 });
    }

    #[test]
    fn position_size_is_capped() {
        let a = parse_reply(r#"{"signal": "buy", "position_size": 0.9}"#, MAX);
        assert_eq!(a.position_size, MAX);
    }

    #[test]
    fn fenced_reply_is_unwrapped() {
        let reply = "```json\n{\"signal\": \"buy\", \"confidence\": 8.5}\n```";
        let a = parse_reply(reply, MAX);
        assert_eq!(a.action, Action::Buy);
        assert_eq!(a.confidence, 8.5);

        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }

    #[test]
    fn string_criterion_keeps_text_and_takes_trend_default() {
        let a = parse_reply(r#"{"market_trend": "sideways", "next_call_criteria": "wait for breakout"}"#, MAX);
        assert_eq!(a.recall, RecallCriterion::TimeBased { bars: 10 });
        assert_eq!(a.recall_note, "wait for breakout");

        let a = parse_reply(r#"{"market_trend": "bullish", "next_call_criteria": "stay close"}"#, MAX);
        assert_eq!(a.recall, RecallCriterion::Immediate);
    }

    #[test]
    fn object_criterion_fills_missing_parameters() {
        let a = parse_reply(r#"{"next_call_criteria": {"type": "time_based"}}"#, MAX);
        assert_eq!(a.recall, RecallCriterion::TimeBased { bars: 1 });

        let a = parse_reply(r#"{"next_call_criteria": {"type": "volume_change"}}"#, MAX);
        assert_eq!(a.recall, RecallCriterion::VolumeChange { percent: 50.0 });

        let a = parse_reply(
            r#"{"next_call_criteria": {"type": "volume_change", "percent_increase": 25}}"#,
            MAX,
        );
        assert_eq!(a.recall, RecallCriterion::VolumeChange { percent: 25.0 });
    }

    #[test]
    fn unknown_criterion_type_fails_open() {
        let a = parse_reply(r#"{"next_call_criteria": {"type": "price_breakout", "level": 10}}"#, MAX);
        assert_eq!(a.recall, RecallCriterion::Immediate);

        let a = parse_reply(r#"{"next_call_criteria": 42}"#, MAX);
        assert_eq!(a.recall, RecallCriterion::TimeBased { bars: 10 });
    }

    #[test]
    fn zero_price_levels_are_unset() {
        let a = parse_reply(r#"{"stop_loss": 0, "take_profit": null}"#, MAX);
        assert_eq!(a.stop_loss, None);
        assert_eq!(a.take_profit, None);
    }
}
