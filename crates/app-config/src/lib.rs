// In crates/app-config/src/lib.rs

use config::{Config, Environment, File};
use std::path::Path;

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{AppSettings, BacktestSettings, Settings};

/// Loads the application settings from the `config/` directory.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
pub fn load_settings() -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());
    load_settings_from(Path::new("config"), &environment)
}

/// Same as [`load_settings`] with an explicit directory and environment name.
///
/// Both files are optional; every setting has a default.
pub fn load_settings_from(dir: &Path, environment: &str) -> Result<Settings> {
    let base = dir.join("base");
    let overlay = dir.join(environment);

    let settings = Config::builder()
        .set_default("app.environment", environment)?
        .add_source(File::with_name(&base.to_string_lossy()).required(false))
        .add_source(File::with_name(&overlay.to_string_lossy()).required(false))
        // e.g. `APP__BACKTEST__CASH=50000`. The prefix is `APP`, separator is `__`.
        .add_source(Environment::with_prefix("APP").separator("__").try_parsing(true))
        .build()?;

    // Deserialize the configuration into our `Settings` struct.
    let settings: Settings = settings.try_deserialize()?;
    settings.validate()?;

    Ok(settings)
}

impl Settings {
    /// Rejects out-of-range backtest values and tables for unknown strategies.
    pub fn validate(&self) -> Result<()> {
        self.backtest.validate()?;
        for name in self.strategies.keys() {
            self.strategy_config(name)?;
        }
        Ok(())
    }
}
