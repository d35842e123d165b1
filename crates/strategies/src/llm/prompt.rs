// In crates/strategies/src/llm/prompt.rs

use core_types::Bar;
use serde::Serialize;

pub const SYSTEM_PROMPT: &str = "You are a conservative professional trader. Analyze trends carefully \
from OHLCV data. Quality over quantity. Only recommend trades with very high confidence.";

/// Number of one-bar returns, counted from the start of the window, used for volatility.
const VOLATILITY_RETURNS: usize = 10;

#[derive(Debug, Serialize)]
struct PromptBar {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Headline statistics quoted at the top of the prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketSummary {
    pub price: f64,
    /// Percent change over the last bar.
    pub change_1: f64,
    /// Percent change over the last seven bars.
    pub change_7: f64,
    /// Root mean square of the window's first one-bar returns, in percent.
    pub volatility: f64,
}

impl MarketSummary {
    pub fn from_window(window: &[Bar]) -> Option<Self> {
        let closes: Vec<f64> = window.iter().map(|b| b.close).collect();
        let price = *closes.last()?;
        let change_since = |bars_back: usize| {
            closes
                .len()
                .checked_sub(bars_back + 1)
                .map(|i| closes[i])
                .filter(|base| *base != 0.0)
                .map_or(0.0, |base| (price - base) / base * 100.0)
        };

        let volatility = if closes.len() > VOLATILITY_RETURNS {
            let leading = &closes[..=VOLATILITY_RETURNS];
            let sum_sq: f64 = leading
                .windows(2)
                .filter(|w| w[0] != 0.0)
                .map(|w| ((w[1] - w[0]) / w[0]).powi(2))
                .sum();
            (sum_sq / VOLATILITY_RETURNS as f64).sqrt() * 100.0
        } else {
            0.0
        };

        Some(Self { price, change_1: change_since(1), change_7: change_since(7), volatility })
    }
}

/// Builds the user message for one acquisition. Returns `None` for an empty window.
pub fn build_prompt(window: &[Bar]) -> Option<String> {
    let summary = MarketSummary::from_window(window)?;
    let rows: Vec<PromptBar> = window
        .iter()
        .map(|b| PromptBar {
            timestamp: b.timestamp.to_rfc3339(),
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume: b.volume,
        })
        .collect();
    let ohlcv = serde_json::to_string_pretty(&rows).ok()?;

    Some(format!(
        r#"You are a PROFESSIONAL market analyst focused on QUALITY over QUANTITY trades.

MARKET CONTEXT:
- Current Price: {price:.2}
- 1-Bar Change: {change_1:+.2}%
- 7-Bar Change: {change_7:+.2}%
- Volatility: {volatility:.2}%

COMPLETE OHLCV DATA (last {count} bars for trend analysis):
{ohlcv}

TRADING RULES:
1. ANALYZE THE TREND YOURSELF from the OHLCV data provided
2. QUALITY OVER QUANTITY - Only trade with very high confidence (8+ out of 10)
3. FOLLOW MAJOR TRENDS - Don't fight strong momentum
4. BE PATIENT - Wait for clear setups
5. RISK MANAGEMENT - Conservative position sizing
6. HOLD WINNERS - Let profitable trades run

ONLY TRADE IF:
- Confidence is 8.0 or higher
- You can clearly identify trend direction from the data
- Good risk/reward ratio (at least 2:1)
- Strong momentum confirmation

RESPOND WITH EXACTLY THIS JSON FORMAT:
{{
    "signal": "buy",
    "confidence": 9.0,
    "position_size": 0.20,
    "take_profit": 48000,
    "stop_loss": 43000,
    "justification": "Clear bullish trend visible in OHLCV data with momentum confirmation.",
    "market_trend": "bullish",
    "next_call_criteria": {{
        "type": "immediate",
        "description": "Monitor closely during trend"
    }}
}}

CONFIDENCE SCORING (BE STRICT):
- 9-10: Extremely strong signal with multiple confirmations
- 8-9: Strong signal with clear trend and momentum
- 7-8: Good signal but some uncertainty
- Below 7: DO NOT TRADE - use "hold" signal

POSITION SIZING (CONSERVATIVE):
- Very high confidence (9+): 0.20-0.25
- High confidence (8-9): 0.15-0.20
- Medium confidence (7-8): 0.10-0.15
- Low confidence (<7): 0.05 or "hold"

NEXT CALL CRITERIA - CHOOSE BASED ON YOUR TREND ANALYSIS:
- TRENDING MARKETS (clear bullish/bearish): {{"type": "immediate", "description": "Monitor closely during trend"}}
- SIDEWAYS/CHOPPY MARKETS: {{"type": "time_based", "bars": 10, "description": "Wait for breakout"}}
- VOLUME-DRIVEN SETUPS: {{"type": "volume_change", "percent_increase": 50, "description": "Wait for volume surge"}}

MARKET_TREND: Include your trend assessment as "bullish", "bearish", or "sideways".

It is better to miss opportunities than to lose money on bad trades."#,
        price = summary.price,
        change_1 = summary.change_1,
        change_7 = summary.change_7,
        volatility = summary.volatility,
        count = window.len(),
    ))
}
