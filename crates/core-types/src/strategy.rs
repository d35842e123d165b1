// In crates/core-types/src/strategy.rs

use serde::Deserialize;
use toml::Value;

/// A named strategy plus its raw parameter table, as written in TOML.
#[derive(Deserialize, Debug, Clone)]
pub struct StrategyConfig {
    pub name: String,
    /// The `[strategies.<name>]` table; empty when the strategy runs on defaults.
    #[serde(default = "empty_params")]
    pub params: Value,
}

fn empty_params() -> Value {
    Value::Table(toml::map::Map::new())
}
