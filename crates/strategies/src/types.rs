// In crates/strategies/src/types.rs

use crate::{Error, Result};
use risk::TradeFilterSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SmaCrossSettings {
    /// Fast moving-average period.
    pub n1: usize,
    /// Slow moving-average period.
    pub n2: usize,
}

impl Default for SmaCrossSettings {
    fn default() -> Self {
        Self { n1: 10, n2: 20 }
    }
}

impl SmaCrossSettings {
    pub fn validate(&self) -> Result<()> {
        if self.n1 == 0 || self.n2 == 0 {
            return Err(Error::InvalidSettings("SMA periods must be positive".into()));
        }
        if self.n1 >= self.n2 {
            return Err(Error::InvalidSettings(format!(
                "fast period n1 ({}) must be below slow period n2 ({})",
                self.n1, self.n2
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)] // Clone is needed for the optimizer
#[serde(default)]
pub struct SmaMacdSettings {
    pub sma_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Fraction of equity per entry.
    pub entry_size: f64,
}

impl Default for SmaMacdSettings {
    fn default() -> Self {
        Self { sma_period: 10, macd_fast: 12, macd_slow: 26, macd_signal: 9, entry_size: 0.3 }
    }
}

impl SmaMacdSettings {
    pub fn validate(&self) -> Result<()> {
        if self.macd_fast >= self.macd_slow {
            return Err(Error::InvalidSettings("macd_fast must be below macd_slow".into()));
        }
        if !(self.entry_size > 0.0 && self.entry_size <= 1.0) {
            return Err(Error::InvalidSettings(format!(
                "entry_size must be in (0, 1], got {}",
                self.entry_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RsiThresholdSettings {
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
}

impl Default for RsiThresholdSettings {
    fn default() -> Self {
        Self { rsi_period: 14, rsi_overbought: 70.0, rsi_oversold: 30.0 }
    }
}

impl RsiThresholdSettings {
    pub fn validate(&self) -> Result<()> {
        if self.rsi_period == 0 {
            return Err(Error::InvalidSettings("rsi_period must be positive".into()));
        }
        if !(0.0 <= self.rsi_oversold && self.rsi_oversold < self.rsi_overbought && self.rsi_overbought <= 100.0) {
            return Err(Error::InvalidSettings(format!(
                "expected 0 <= oversold ({}) < overbought ({}) <= 100",
                self.rsi_oversold, self.rsi_overbought
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FvgSettings {
    /// Minimum gap as a fraction of the reference price.
    pub gap_threshold: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl Default for FvgSettings {
    fn default() -> Self {
        Self { gap_threshold: 0.002, stop_loss_pct: 0.01, take_profit_pct: 0.02 }
    }
}

impl FvgSettings {
    pub fn validate(&self) -> Result<()> {
        if self.gap_threshold < 0.0 || self.stop_loss_pct <= 0.0 || self.take_profit_pct <= 0.0 {
            return Err(Error::InvalidSettings(
                "gap_threshold must be >= 0 and stop/target percentages > 0".into(),
            ));
        }
        if self.stop_loss_pct >= 1.0 {
            return Err(Error::InvalidSettings("stop_loss_pct must be below 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LlmSignalSettings {
    /// Number of most recent bars sent with each request.
    pub lookback_periods: usize,
    #[serde(flatten)]
    pub filter: TradeFilterSettings,
}

impl Default for LlmSignalSettings {
    fn default() -> Self {
        Self { lookback_periods: 100, filter: TradeFilterSettings::default() }
    }
}

impl LlmSignalSettings {
    pub fn validate(&self) -> Result<()> {
        if self.lookback_periods == 0 {
            return Err(Error::InvalidSettings("lookback_periods must be positive".into()));
        }
        self.filter.validate()?;
        Ok(())
    }
}
