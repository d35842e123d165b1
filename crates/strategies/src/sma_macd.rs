// In crates/strategies/src/sma_macd.rs

use crate::indicators::{Cross, CrossTracker, WarmMacd, WarmSma};
use crate::types::SmaMacdSettings;
use crate::{BarCursor, Result, Strategy};
use async_trait::async_trait;
use core_types::{Bar, Position, Signal};

#[derive(Debug, Clone)]
struct Indicators {
    sma: WarmSma,
    macd: WarmMacd,
    price_vs_sma: CrossTracker,
    macd_vs_signal: CrossTracker,
}

impl Indicators {
    fn update(&mut self, close: f64) -> (Option<Cross>, Option<Cross>) {
        let sma = self.sma.next(close);
        let macd = self.macd.next(close);
        (
            self.price_vs_sma.update(Some(close), sma),
            self.macd_vs_signal.update(macd.map(|m| m.macd), macd.map(|m| m.signal)),
        )
    }
}

/// Price/SMA crossover confirmed by a MACD/signal crossover.
///
/// Entries need both crosses on the same bar and in the same direction. A price/SMA cross
/// against the open position closes it even without MACD confirmation.
#[derive(Debug, Clone)]
pub struct SmaMacd {
    settings: SmaMacdSettings,
    initial: Indicators,
    indicators: Indicators,
    cursor: BarCursor,
}

impl SmaMacd {
    pub fn new(settings: SmaMacdSettings) -> Result<Self> {
        settings.validate()?;
        let initial = Indicators {
            sma: WarmSma::new(settings.sma_period)?,
            macd: WarmMacd::new(settings.macd_fast, settings.macd_slow, settings.macd_signal)?,
            price_vs_sma: CrossTracker::default(),
            macd_vs_signal: CrossTracker::default(),
        };
        Ok(Self { settings, indicators: initial.clone(), initial, cursor: BarCursor::default() })
    }
}

#[async_trait]
impl Strategy for SmaMacd {
    fn name(&self) -> &'static str {
        "SmaMacdConfluence"
    }

    async fn assess(&mut self, bars: &[Bar], position: Option<&Position>) -> Signal {
        let (unseen, restarted) = self.cursor.advance(bars);
        if restarted {
            self.indicators = self.initial.clone();
        }

        let (mut sma_cross, mut macd_cross) = (None, None);
        for bar in unseen {
            (sma_cross, macd_cross) = self.indicators.update(bar.close);
        }

        let size = Some(self.settings.entry_size);
        match (sma_cross, macd_cross) {
            (Some(Cross::Above), Some(Cross::Above)) => Signal::buy(size),
            (Some(Cross::Below), Some(Cross::Below)) => Signal::sell(size),
            (Some(Cross::Above), _) if position.is_some_and(Position::is_short) => {
                tracing::debug!("Price crossed above SMA; closing short.");
                Signal::Close
            }
            (Some(Cross::Below), _) if position.is_some_and(Position::is_long) => {
                tracing::debug!("Price crossed below SMA; closing long.");
                Signal::Close
            }
            _ => Signal::Hold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bars_from_closes;
    use chrono::Utc;
    use core_types::Side;

    fn position(side: Side) -> Position {
        Position {
            side,
            quantity: 1.0,
            entry_price: 10.0,
            entry_bar: 0,
            entry_time: Utc::now(),
            stop_loss: None,
            take_profit: None,
        }
    }

    #[tokio::test]
    async fn enters_only_when_both_crosses_agree() {
        // MACD(1,2,2) tracks price minus a short EMA, so both lines turn with the price.
        let settings = SmaMacdSettings { sma_period: 2, macd_fast: 1, macd_slow: 2, macd_signal: 2, entry_size: 0.3 };
        let mut s = SmaMacd::new(settings).unwrap();
        let bars = bars_from_closes(&[10.0, 10.0, 10.0, 9.0, 12.0]);

        let mut out = Vec::new();
        for i in 0..bars.len() {
            out.push(s.assess(&bars[..=i], None).await);
        }

        assert_eq!(out[..3], [Signal::Hold; 3]);
        assert_eq!(out[3], Signal::sell(Some(0.3)));
        assert_eq!(out[4], Signal::buy(Some(0.3)));
    }

    #[tokio::test]
    async fn sma_cross_against_position_closes_it() {
        // The MACD is still warming up here, so only the price/SMA cross can fire.
        let settings = SmaMacdSettings { sma_period: 2, macd_fast: 2, macd_slow: 5, macd_signal: 3, entry_size: 0.3 };
        let bars = bars_from_closes(&[10.0, 10.0, 12.0, 9.0]);
        let short = position(Side::Short);
        let long = position(Side::Long);

        let mut s = SmaMacd::new(settings.clone()).unwrap();
        assert_eq!(s.assess(&bars[..2], None).await, Signal::Hold);
        assert_eq!(s.assess(&bars[..3], Some(&short)).await, Signal::Close);
        assert_eq!(s.assess(&bars[..4], Some(&long)).await, Signal::Close);

        let mut s = SmaMacd::new(settings).unwrap();
        assert_eq!(s.assess(&bars[..2], None).await, Signal::Hold);
        assert_eq!(s.assess(&bars[..3], Some(&long)).await, Signal::Hold);
        assert_eq!(s.assess(&bars[..4], None).await, Signal::Hold);
    }
}
