// In crates/strategies/src/sma_cross.rs

use crate::indicators::{Cross, CrossTracker, WarmSma};
use crate::types::SmaCrossSettings;
use crate::{BarCursor, Result, Strategy};
use async_trait::async_trait;
use core_types::{Bar, Position, Signal};

#[derive(Debug, Clone)]
struct Lines {
    fast: WarmSma,
    slow: WarmSma,
    cross: CrossTracker,
}

impl Lines {
    fn update(&mut self, close: f64) -> Option<Cross> {
        let fast = self.fast.next(close);
        let slow = self.slow.next(close);
        self.cross.update(fast, slow)
    }
}

/// Classic dual simple-moving-average crossover.
///
/// Goes long with all equity when the fast SMA crosses above the slow one and short on
/// the opposite cross. Every entry replaces the previous position.
#[derive(Debug, Clone)]
pub struct SmaCross {
    settings: SmaCrossSettings,
    initial: Lines,
    lines: Lines,
    cursor: BarCursor,
}

impl SmaCross {
    pub fn new(settings: SmaCrossSettings) -> Result<Self> {
        settings.validate()?;
        let initial = Lines {
            fast: WarmSma::new(settings.n1)?,
            slow: WarmSma::new(settings.n2)?,
            cross: CrossTracker::default(),
        };
        Ok(Self { settings, lines: initial.clone(), initial, cursor: BarCursor::default() })
    }
}

#[async_trait]
impl Strategy for SmaCross {
    fn name(&self) -> &'static str {
        "SmaCross"
    }

    async fn assess(&mut self, bars: &[Bar], _position: Option<&Position>) -> Signal {
        let (unseen, restarted) = self.cursor.advance(bars);
        if restarted {
            self.lines = self.initial.clone();
        }

        let mut cross = None;
        for bar in unseen {
            cross = self.lines.update(bar.close);
        }

        match cross {
            Some(Cross::Above) => {
                tracing::debug!(n1 = self.settings.n1, n2 = self.settings.n2, "Fast SMA crossed above slow.");
                Signal::buy(None)
            }
            Some(Cross::Below) => {
                tracing::debug!(n1 = self.settings.n1, n2 = self.settings.n2, "Slow SMA crossed above fast.");
                Signal::sell(None)
            }
            None => Signal::Hold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bars_from_closes;

    async fn signals(strategy: &mut SmaCross, closes: &[f64]) -> Vec<Signal> {
        let bars = bars_from_closes(closes);
        let mut out = Vec::new();
        for i in 0..bars.len() {
            out.push(strategy.assess(&bars[..=i], None).await);
        }
        out
    }

    #[tokio::test]
    async fn buys_on_golden_cross_and_sells_on_death_cross() {
        let mut s = SmaCross::new(SmaCrossSettings { n1: 2, n2: 3 }).unwrap();
        // (SMA2, SMA3) from bar 2: (1.5,2) (2.5,2.33) (4.5,3.33) (3.5,3.67) (1.5,2.67)
        let closes = [3.0, 2.0, 1.0, 4.0, 5.0, 2.0, 1.0];
        let out = signals(&mut s, &closes).await;

        assert_eq!(out[..3], [Signal::Hold; 3]);
        assert_eq!(out[3], Signal::buy(None));
        assert_eq!(out[4], Signal::Hold);
        assert_eq!(out[5], Signal::sell(None));
        assert_eq!(out[6], Signal::Hold);
    }

    #[tokio::test]
    async fn flat_series_never_crosses() {
        let mut s = SmaCross::new(SmaCrossSettings::default()).unwrap();
        let out = signals(&mut s, &[100.0; 60]).await;
        assert!(out.iter().all(|sig| *sig == Signal::Hold));
    }

    #[tokio::test]
    async fn replaying_from_the_start_resets_state() {
        let mut s = SmaCross::new(SmaCrossSettings { n1: 2, n2: 3 }).unwrap();
        let closes = [3.0, 2.0, 1.0, 4.0, 5.0];
        let first = signals(&mut s, &closes).await;
        let second = signals(&mut s, &closes).await;
        assert_eq!(first, second);
    }

    #[test]
    fn fast_period_must_be_below_slow() {
        assert!(SmaCross::new(SmaCrossSettings { n1: 20, n2: 10 }).is_err());
    }
}
