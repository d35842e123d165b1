// In crates/strategies/src/indicators.rs

//! Incremental indicator wrappers shared by the strategies.
//!
//! The `ta` indicators emit a value from the very first sample. The wrappers here report
//! `None` until a full window has been seen, so warm-up values can never produce a cross.

use crate::{Error, Result};
use ta::Next;
use ta::indicators::{MovingAverageConvergenceDivergence as Macd, SimpleMovingAverage as Sma};

/// Direction of a crossover event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cross {
    /// The first series moved above the second.
    Above,
    /// The first series moved below the second.
    Below,
}

/// Detects a crossover between two series from their previous and current values.
///
/// `Above` requires `prev.0 <= prev.1` and `curr.0 > curr.1`; `Below` is the mirror.
/// Equality on the current bar is never a cross.
pub fn crossover(prev: (f64, f64), curr: (f64, f64)) -> Option<Cross> {
    if prev.0 <= prev.1 && curr.0 > curr.1 {
        Some(Cross::Above)
    } else if prev.0 >= prev.1 && curr.0 < curr.1 {
        Some(Cross::Below)
    } else {
        None
    }
}

/// Tracks a pair of series and reports crossovers as values arrive.
#[derive(Debug, Clone, Default)]
pub struct CrossTracker {
    prev: Option<(f64, f64)>,
}

impl CrossTracker {
    /// Feeds the current pair. A `None` on either side clears the previous pair.
    pub fn update(&mut self, a: Option<f64>, b: Option<f64>) -> Option<Cross> {
        let (Some(a), Some(b)) = (a, b) else {
            self.prev = None;
            return None;
        };
        let cross = self.prev.and_then(|prev| crossover(prev, (a, b)));
        self.prev = Some((a, b));
        cross
    }
}

/// Simple moving average that stays silent during warm-up.
#[derive(Debug, Clone)]
pub struct WarmSma {
    inner: Sma,
    period: usize,
    seen: usize,
}

impl WarmSma {
    pub fn new(period: usize) -> Result<Self> {
        let inner = Sma::new(period).map_err(|e| Error::Indicator(format!("SMA({period}): {e:?}")))?;
        Ok(Self { inner, period, seen: 0 })
    }

    pub fn next(&mut self, value: f64) -> Option<f64> {
        let v = self.inner.next(value);
        self.seen += 1;
        (self.seen >= self.period).then_some(v)
    }
}

/// MACD line and its signal line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
}

/// MACD that reports values only once both the slow EMA and the signal EMA have warmed up.
#[derive(Debug, Clone)]
pub struct WarmMacd {
    inner: Macd,
    warmup: usize,
    seen: usize,
}

impl WarmMacd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self> {
        let inner = Macd::new(fast, slow, signal)
            .map_err(|e| Error::Indicator(format!("MACD({fast},{slow},{signal}): {e:?}")))?;
        Ok(Self { inner, warmup: slow + signal - 1, seen: 0 })
    }

    pub fn next(&mut self, value: f64) -> Option<MacdPoint> {
        let out = self.inner.next(value);
        self.seen += 1;
        (self.seen >= self.warmup).then_some(MacdPoint { macd: out.macd, signal: out.signal })
    }
}

/// Relative Strength Index with Wilder's smoothing.
///
/// The first average gain/loss is the plain mean of the first `period` close-to-close
/// changes; after that `avg = (avg * (period - 1) + x) / period`. A zero average loss
/// saturates the index at 100.
#[derive(Debug, Clone)]
pub struct WilderRsi {
    period: usize,
    prev_close: Option<f64>,
    deltas: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl WilderRsi {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(Error::Indicator("RSI period must be positive".into()));
        }
        Ok(Self { period, prev_close: None, deltas: 0, avg_gain: 0.0, avg_loss: 0.0 })
    }

    pub fn next(&mut self, close: f64) -> Option<f64> {
        let prev = self.prev_close.replace(close)?;
        let delta = close - prev;
        let (gain, loss) = (delta.max(0.0), (-delta).max(0.0));
        let n = self.period as f64;

        self.deltas += 1;
        if self.deltas <= self.period {
            // Seed phase: accumulate, then average once the window is full.
            self.avg_gain += gain;
            self.avg_loss += loss;
            if self.deltas < self.period {
                return None;
            }
            self.avg_gain /= n;
            self.avg_loss /= n;
        } else {
            self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
            self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
        }

        if self.avg_loss == 0.0 {
            return Some(100.0);
        }
        let rs = self.avg_gain / self.avg_loss;
        Some(100.0 - 100.0 / (1.0 + rs))
    }
}

/// Batch Wilder RSI over a close series; `None` during warm-up.
pub fn wilder_rsi(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    let mut rsi = WilderRsi::new(period)?;
    Ok(closes.iter().map(|c| rsi.next(*c)).collect())
}
