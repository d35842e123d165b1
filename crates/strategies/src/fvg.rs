// In crates/strategies/src/fvg.rs

use crate::types::FvgSettings;
use crate::{Result, Strategy};
use async_trait::async_trait;
use core_types::{Bar, Position, Signal};

/// Retracement into a fair-value gap.
///
/// A bullish gap exists when the low of the previous bar sits above the high of the bar
/// before it by more than `gap_threshold` (relative). When the current close retraces
/// strictly into that gap the strategy buys with a percentage stop and target; bearish
/// gaps are the mirror image. Open positions are closed as soon as the close moves
/// against them.
#[derive(Debug, Clone)]
pub struct FairValueGap {
    settings: FvgSettings,
}

impl FairValueGap {
    pub fn new(settings: FvgSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    fn entry(&self, first: &Bar, middle: &Bar, close: f64) -> Option<Signal> {
        let FvgSettings { gap_threshold, stop_loss_pct, take_profit_pct } = self.settings;

        if middle.low - first.high > first.high * gap_threshold {
            // Bullish gap between first.high and middle.low.
            (first.high < close && close < middle.low).then(|| Signal::GoLong {
                size: None,
                stop_loss: Some(close * (1.0 - stop_loss_pct)),
                take_profit: Some(close * (1.0 + take_profit_pct)),
            })
        } else if first.low - middle.high > first.low * gap_threshold {
            (middle.high < close && close < first.low).then(|| Signal::GoShort {
                size: None,
                stop_loss: Some(close * (1.0 + stop_loss_pct)),
                take_profit: Some(close * (1.0 - take_profit_pct)),
            })
        } else {
            None
        }
    }
}

#[async_trait]
impl Strategy for FairValueGap {
    fn name(&self) -> &'static str {
        "FairValueGap"
    }

    async fn assess(&mut self, bars: &[Bar], position: Option<&Position>) -> Signal {
        let [.., first, middle, current] = bars else {
            return Signal::Hold;
        };

        if let Some(signal) = self.entry(first, middle, current.close) {
            tracing::debug!(close = current.close, ?signal, "Close retraced into fair-value gap.");
            return signal;
        }

        match position {
            Some(p) if p.is_long() && current.close < middle.close => Signal::Close,
            Some(p) if p.is_short() && current.close > middle.close => Signal::Close,
            _ => Signal::Hold,
        }
    }
}
