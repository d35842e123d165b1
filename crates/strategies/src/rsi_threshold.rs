// In crates/strategies/src/rsi_threshold.rs

use crate::indicators::WilderRsi;
use crate::types::RsiThresholdSettings;
use crate::{BarCursor, Result, Strategy};
use async_trait::async_trait;
use core_types::{Bar, Position, Signal};

/// Mean reversion on RSI threshold crossings.
///
/// Buys when RSI drops into the oversold zone and sells when it rises into the overbought
/// zone. Only the crossing bar trades; staying inside a zone does not.
#[derive(Debug, Clone)]
pub struct RsiThreshold {
    settings: RsiThresholdSettings,
    rsi: WilderRsi,
    prev_rsi: Option<f64>,
    cursor: BarCursor,
}

impl RsiThreshold {
    pub fn new(settings: RsiThresholdSettings) -> Result<Self> {
        settings.validate()?;
        let rsi = WilderRsi::new(settings.rsi_period)?;
        Ok(Self { settings, rsi, prev_rsi: None, cursor: BarCursor::default() })
    }

    fn reset(&mut self) -> Result<()> {
        self.rsi = WilderRsi::new(self.settings.rsi_period)?;
        self.prev_rsi = None;
        Ok(())
    }
}

#[async_trait]
impl Strategy for RsiThreshold {
    fn name(&self) -> &'static str {
        "RsiThreshold"
    }

    async fn assess(&mut self, bars: &[Bar], _position: Option<&Position>) -> Signal {
        let (unseen, restarted) = self.cursor.advance(bars);
        if restarted && self.reset().is_err() {
            return Signal::Hold;
        }

        let mut crossing = None;
        for bar in unseen {
            let current = self.rsi.next(bar.close);
            crossing = self.prev_rsi.zip(current);
            self.prev_rsi = current;
        }

        let Some((prev, current)) = crossing else {
            return Signal::Hold;
        };
        let RsiThresholdSettings { rsi_oversold, rsi_overbought, .. } = self.settings;

        if prev > rsi_oversold && current <= rsi_oversold {
            tracing::debug!(rsi = current, threshold = rsi_oversold, "RSI entered oversold zone.");
            Signal::buy(None)
        } else if prev < rsi_overbought && current >= rsi_overbought {
            tracing::debug!(rsi = current, threshold = rsi_overbought, "RSI entered overbought zone.");
            Signal::sell(None)
        } else {
            Signal::Hold
        }
    }
}
