// In crates/core-types/src/types.rs

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One OHLCV sample for a fixed time interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Builds a bar from provider fields that may be absent.
    ///
    /// Open, high, low and close are required. A missing volume is recorded as `0.0`,
    /// matching providers that do not report volume for some instruments.
    pub fn from_optional(
        index: usize,
        timestamp: DateTime<Utc>,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: Option<f64>,
        volume: Option<f64>,
    ) -> Result<Self> {
        let require = |value: Option<f64>, field: &'static str| -> Result<f64> {
            let v = value.ok_or(Error::MissingField { index, field })?;
            if !v.is_finite() {
                return Err(Error::NonFiniteField { index, field });
            }
            Ok(v)
        };

        Ok(Self {
            timestamp,
            open: require(open, "open")?,
            high: require(high, "high")?,
            low: require(low, "low")?,
            close: require(close, "close")?,
            volume: volume.filter(|v| v.is_finite()).unwrap_or(0.0),
        })
    }

    /// Checks that a series is usable by a strategy: finite prices, strictly increasing time.
    pub fn validate_series(bars: &[Bar]) -> Result<()> {
        for (index, bar) in bars.iter().enumerate() {
            for (field, value) in [
                ("open", bar.open),
                ("high", bar.high),
                ("low", bar.low),
                ("close", bar.close),
            ] {
                if !value.is_finite() {
                    return Err(Error::NonFiniteField { index, field });
                }
            }
            if index > 0 && bars[index - 1].timestamp >= bar.timestamp {
                return Err(Error::OutOfOrder { index });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    /// `1.0` for long, `-1.0` for short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

/// An open position as tracked by the execution layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub quantity: f64,
    pub entry_price: f64,
    /// Index of the bar on which the position was opened.
    pub entry_bar: usize,
    pub entry_time: DateTime<Utc>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == Side::Short
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.quantity * self.side.sign()
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// The strategy asked for it (explicit close or a reversing entry).
    Signal,
    StopLoss,
    TakeProfit,
    /// Still open after the last bar.
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => f.write_str("signal"),
            ExitReason::StopLoss => f.write_str("stop loss"),
            ExitReason::TakeProfit => f.write_str("take profit"),
            ExitReason::EndOfData => f.write_str("end of data"),
        }
    }
}

/// The instruction a strategy hands to the execution layer for the current bar.
///
/// `size` is a fraction of current equity in `(0, 1]`; `None` commits all available equity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Signal {
    GoLong {
        size: Option<f64>,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    },
    GoShort {
        size: Option<f64>,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    },
    Close,
    #[default]
    Hold,
}

impl Signal {
    /// A market buy with no attached exits.
    pub fn buy(size: Option<f64>) -> Self {
        Signal::GoLong { size, stop_loss: None, take_profit: None }
    }

    /// A market sell with no attached exits.
    pub fn sell(size: Option<f64>) -> Self {
        Signal::GoShort { size, stop_loss: None, take_profit: None }
    }

    /// The side of the position this signal opens, if it is an entry.
    pub fn entry_side(&self) -> Option<Side> {
        match self {
            Signal::GoLong { .. } => Some(Side::Long),
            Signal::GoShort { .. } => Some(Side::Short),
            Signal::Close | Signal::Hold => None,
        }
    }

    /// Returns the requested size after checking it lies in `(0, 1]`.
    pub fn checked_size(&self) -> Result<Option<f64>> {
        let size = match self {
            Signal::GoLong { size, .. } | Signal::GoShort { size, .. } => *size,
            Signal::Close | Signal::Hold => None,
        };
        match size {
            Some(s) if !(s > 0.0 && s <= 1.0) => Err(Error::InvalidSize(s)),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn bar(day: u32, close: f64) -> Bar {
        Bar { timestamp: ts(day), open: close, high: close, low: close, close, volume: 1.0 }
    }

    #[test]
    fn missing_close_is_rejected() {
        let err = Bar::from_optional(3, ts(1), Some(1.0), Some(2.0), Some(0.5), None, Some(10.0))
            .unwrap_err();
        assert_eq!(err, Error::MissingField { index: 3, field: "close" });
    }

    #[test]
    fn missing_volume_defaults_to_zero() {
        let bar = Bar::from_optional(0, ts(1), Some(1.0), Some(2.0), Some(0.5), Some(1.5), None)
            .unwrap();
        assert_eq!(bar.volume, 0.0);
    }

    #[test]
    fn series_must_be_chronological() {
        let bars = vec![bar(2, 1.0), bar(1, 1.0)];
        assert_eq!(Bar::validate_series(&bars), Err(Error::OutOfOrder { index: 1 }));
        assert!(Bar::validate_series(&[bar(1, 1.0), bar(2, 1.0)]).is_ok());
    }

    #[test]
    fn size_outside_unit_interval_is_invalid() {
        assert!(Signal::buy(Some(0.0)).checked_size().is_err());
        assert!(Signal::sell(Some(1.5)).checked_size().is_err());
        assert_eq!(Signal::buy(Some(0.25)).checked_size(), Ok(Some(0.25)));
        assert_eq!(Signal::buy(None).checked_size(), Ok(None));
    }

    #[test]
    fn short_pnl_gains_when_price_falls() {
        let pos = Position {
            side: Side::Short,
            quantity: 2.0,
            entry_price: 100.0,
            entry_bar: 0,
            entry_time: ts(1),
            stop_loss: None,
            take_profit: None,
        };
        assert_eq!(pos.unrealized_pnl(90.0), 20.0);
    }
}
