// In app/src/optimizer.rs

use anyhow::{Context, Result};
use analytics::types::PerformanceReport;
use backtester::Backtester;
use core_types::{Bar, StrategyConfig};
use execution::{SimulatedExecutor, SimulationSettings};
use itertools::iproduct;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use toml::Value;

/// Strategies with a built-in parameter grid.
pub const OPTIMIZABLE: &[&str] = &["sma_cross", "rsi"];

/// One finished backtest of a parameter set.
#[derive(Debug, Clone)]
pub struct OptimizationRun {
    pub parameters: Value,
    pub report: PerformanceReport,
}

/// Everything a single grid point needs, shared read-only across workers.
pub struct OptimizationJob<'a> {
    pub symbol: &'a str,
    pub strategy: &'a str,
    pub bars: &'a [Bar],
    pub simulation: SimulationSettings,
    pub initial_cash: f64,
}

fn table<const N: usize>(entries: [(&str, i64); N]) -> Value {
    Value::Table(entries.into_iter().map(|(k, v)| (k.to_string(), Value::Integer(v))).collect())
}

/// Expands the parameter grid of an optimizable strategy.
///
/// * `sma_cross`: `n1` in 5..30 step 5, `n2` in 10..70 step 5 (end exclusive), keeping `n1 < n2`.
/// * `rsi`: `rsi_period` in 10..30 step 2, overbought in {65, 70, 75, 80}, oversold in
///   {20, 25, 30, 35}.
pub fn parameter_grid(strategy: &str) -> Result<Vec<Value>> {
    let grid = match strategy {
        "sma_cross" => iproduct!((5..30).step_by(5), (10..70).step_by(5))
            .filter(|(n1, n2)| n1 < n2)
            .map(|(n1, n2)| table([("n1", n1), ("n2", n2)]))
            .collect(),
        "rsi" => iproduct!((10..30).step_by(2), [65, 70, 75, 80], [20, 25, 30, 35])
            .map(|(period, overbought, oversold)| {
                table([
                    ("rsi_period", period),
                    ("rsi_overbought", overbought),
                    ("rsi_oversold", oversold),
                ])
            })
            .collect(),
        other => anyhow::bail!(
            "Strategy '{}' has no parameter grid. Optimizable strategies: {}",
            other,
            OPTIMIZABLE.join(", ")
        ),
    };
    Ok(grid)
}

fn run_single_backtest(job: &OptimizationJob<'_>, parameters: &Value) -> Result<OptimizationRun> {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    rt.block_on(async {
        let config = StrategyConfig { name: job.strategy.to_string(), params: parameters.clone() };
        let strategy = strategies::create_strategy(&config, None)?;
        let executor = Box::new(SimulatedExecutor::new(job.simulation.clone()));
        let mut backtester = Backtester::new(job.symbol, strategy, executor, job.initial_cash)?;
        let result = backtester.run(job.bars).await?;
        Ok(OptimizationRun { parameters: parameters.clone(), report: result.report })
    })
}

/// Runs every parameter set in parallel. Failed runs are logged and skipped.
///
/// `cores` of 0 uses rayon's default thread count.
pub fn run_optimization(job: &OptimizationJob<'_>, param_sets: &[Value], cores: usize) -> Result<Vec<OptimizationRun>> {
    tracing::info!(cores, runs = param_sets.len(), "Configuring Rayon thread pool.");
    let pool = ThreadPoolBuilder::new()
        .num_threads(cores)
        .build()
        .context("Failed to build Rayon thread pool")?;

    let runs = pool.install(|| {
        param_sets
            .par_iter()
            .filter_map(|parameters| match run_single_backtest(job, parameters) {
                Ok(run) => Some(run),
                Err(e) => {
                    tracing::error!(error = %e, %parameters, "A single backtest run failed.");
                    None
                }
            })
            .collect::<Vec<_>>()
    });
    Ok(runs)
}
