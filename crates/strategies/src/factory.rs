// In crates/strategies/src/factory.rs

use crate::types::{FvgSettings, LlmSignalSettings, RsiThresholdSettings, SmaCrossSettings, SmaMacdSettings};
use crate::{FairValueGap, LlmSignalStrategy, RsiThreshold, SmaCross, SmaMacd, Strategy};
use anyhow::{Context, Result};
use api_client::CompletionClient;
use core_types::StrategyConfig;
use std::sync::Arc;

/// Names accepted by [`create_strategy`].
pub const STRATEGY_NAMES: &[&str] = &["sma_cross", "sma_macd", "rsi", "fvg", "llm"];

/// Builds a strategy from its configuration table.
///
/// Missing parameters fall back to each strategy's defaults. `client` is only used by the
/// `llm` strategy.
pub fn create_strategy(
    config: &StrategyConfig,
    client: Option<Arc<dyn CompletionClient>>,
) -> Result<Box<dyn Strategy>> {
    let params = config.params.clone();
    let context = || format!("Invalid parameters for strategy '{}'", config.name);

    let strategy: Box<dyn Strategy> = match config.name.as_str() {
        "sma_cross" => {
            let settings: SmaCrossSettings = params.try_into().with_context(context)?;
            Box::new(SmaCross::new(settings)?)
        }
        "sma_macd" => {
            let settings: SmaMacdSettings = params.try_into().with_context(context)?;
            Box::new(SmaMacd::new(settings)?)
        }
        "rsi" => {
            let settings: RsiThresholdSettings = params.try_into().with_context(context)?;
            Box::new(RsiThreshold::new(settings)?)
        }
        "fvg" => {
            let settings: FvgSettings = params.try_into().with_context(context)?;
            Box::new(FairValueGap::new(settings)?)
        }
        "llm" => {
            let settings: LlmSignalSettings = params.try_into().with_context(context)?;
            Box::new(LlmSignalStrategy::new(settings, client)?)
        }
        unknown => anyhow::bail!(
            "Attempted to create unknown strategy: {} (expected one of {})",
            unknown,
            STRATEGY_NAMES.join(", ")
        ),
    };

    tracing::debug!(strategy = strategy.name(), "Strategy created.");
    Ok(strategy)
}
