// In crates/app-config/src/types.rs

use std::collections::BTreeMap;

use api_client::LlmSettings;
use core_types::{Bar, StrategyConfig};
use execution::SimulationSettings;
use serde::Deserialize;
use strategies::STRATEGY_NAMES;

use crate::{Error, Result};

/// Starting balance for instruments quoted below 1000.
pub const DEFAULT_CASH: f64 = 100_000.0;
/// Starting balance when the average close is above 1000, so whole-unit sizing can still buy.
pub const HIGH_PRICE_CASH: f64 = 1_000_000.0;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Settings {
    /// The application's general settings.
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub backtest: BacktestSettings,
    /// Connection settings for the completion endpoint.
    #[serde(default)]
    pub llm: LlmSettings,
    /// Parameter tables keyed by strategy name, e.g. `[strategies.sma_cross]`.
    #[serde(default)]
    pub strategies: BTreeMap<String, toml::Value>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
    /// Worker threads for the optimizer; 0 lets rayon decide.
    pub optimizer_cores: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self { environment: "development".into(), log_level: "info".into(), optimizer_cores: 0 }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BacktestSettings {
    /// Fixed starting balance. When unset it is derived from the price level.
    pub cash: Option<f64>,
    pub commission: f64,
    pub slippage_percent: f64,
    pub whole_units: bool,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        let sim = SimulationSettings::default();
        Self {
            cash: None,
            commission: sim.commission,
            slippage_percent: sim.slippage_percent,
            whole_units: sim.whole_units,
        }
    }
}

impl BacktestSettings {
    pub fn validate(&self) -> Result<()> {
        if let Some(cash) = self.cash {
            if !cash.is_finite() || cash <= 0.0 {
                return Err(Error::InvalidSetting(format!("backtest.cash must be positive, got {cash}")));
            }
        }
        if !(0.0..1.0).contains(&self.commission) {
            return Err(Error::InvalidSetting(format!(
                "backtest.commission must be in [0, 1), got {}",
                self.commission
            )));
        }
        if !(0.0..1.0).contains(&self.slippage_percent) {
            return Err(Error::InvalidSetting(format!(
                "backtest.slippage_percent must be in [0, 1), got {}",
                self.slippage_percent
            )));
        }
        Ok(())
    }

    pub fn simulation(&self) -> SimulationSettings {
        SimulationSettings {
            commission: self.commission,
            slippage_percent: self.slippage_percent,
            whole_units: self.whole_units,
        }
    }

    /// The configured cash, or a default sized to the price level of `bars`.
    pub fn initial_cash_for(&self, bars: &[Bar]) -> f64 {
        if let Some(cash) = self.cash {
            return cash;
        }
        if bars.is_empty() {
            return DEFAULT_CASH;
        }
        let avg_close = bars.iter().map(|b| b.close).sum::<f64>() / bars.len() as f64;
        if avg_close > 1000.0 { HIGH_PRICE_CASH } else { DEFAULT_CASH }
    }
}

impl Settings {
    /// Resolves the configuration of a named strategy.
    ///
    /// A strategy without a table in the settings runs with its defaults.
    pub fn strategy_config(&self, name: &str) -> Result<StrategyConfig> {
        if !STRATEGY_NAMES.contains(&name) {
            return Err(Error::UnknownStrategy {
                name: name.to_string(),
                available: STRATEGY_NAMES.join(", "),
            });
        }
        let params = match self.strategies.get(name) {
            Some(value @ toml::Value::Table(_)) => value.clone(),
            Some(_) => return Err(Error::InvalidStrategyTable(name.to_string())),
            None => toml::Value::Table(toml::map::Map::new()),
        };
        Ok(StrategyConfig { name: name.to_string(), params })
    }
}
