// In app/src/main.rs

use anyhow::{Context, Result};
use api_client::{CompletionClient, DataRange, MarketDataClient, OpenAiClient};
use app_config::Settings;
use backtester::{Backtester, print_report};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use core_types::Bar;
use execution::SimulatedExecutor;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

mod analyzer;
mod optimizer;

use crate::analyzer::{print_optimization_report, rank_by_final_equity};
use crate::optimizer::{OptimizationJob, parameter_grid, run_optimization};

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Backtests rule-based and model-driven trading signals.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a historical backtest of a strategy.
    Backtest {
        /// Strategy to run: sma_cross, sma_macd, rsi, fvg or llm.
        #[arg(long)]
        strategy: String,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Grid-searches the parameters of a strategy and ranks them by final equity.
    Optimize {
        /// Strategy to optimize: sma_cross or rsi.
        #[arg(long, default_value = "sma_cross")]
        strategy: String,

        /// How many of the best parameter sets to print.
        #[arg(long, default_value_t = 5)]
        top: usize,

        #[command(flatten)]
        data: DataArgs,
    },
}

/// Where the bars come from.
#[derive(Args, Debug)]
struct DataArgs {
    /// Ticker symbol(s) to load (e.g., "AAPL", "BTC-USD").
    #[arg(short, long, required = true, num_args = 1..)]
    symbol: Vec<String>,

    /// Lookback period (e.g., "1y", "6mo"). Mutually exclusive with --start/--end.
    #[arg(long)]
    period: Option<String>,

    /// Start date in YYYY-MM-DD format.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date in YYYY-MM-DD format.
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Bar interval (e.g., "1d", "1h").
    #[arg(short, long, default_value = "1d")]
    interval: String,

    /// Read bars from a CSV file instead of downloading them. Requires a single symbol.
    #[arg(long)]
    csv: Option<PathBuf>,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();

    let settings = app_config::load_settings().context("Failed to load settings")?;
    init_tracing(&settings.app.log_level);

    tracing::info!(environment = %settings.app.environment, "Starting signal-lab");

    match cli.command {
        Commands::Backtest { strategy, data } => {
            handle_backtest(&settings, &strategy, &data).await?;
        }
        Commands::Optimize { strategy, top, data } => {
            handle_optimize(&settings, &strategy, top, &data).await?;
        }
    }

    tracing::info!("signal-lab has finished successfully.");

    Ok(())
}

fn init_tracing(log_level: &str) {
    let level = log_level.parse::<Level>().unwrap_or(Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        Targets::new()
            .with_target("hyper", Level::WARN)
            .with_target("reqwest", Level::WARN)
            .with_default(level),
    );
    tracing_subscriber::registry().with(fmt_layer).init();
}

/// Loads bars for every requested symbol, from CSV or the chart endpoint.
async fn load_data(data: &DataArgs) -> Result<BTreeMap<String, Vec<Bar>>> {
    if let Some(path) = &data.csv {
        let [symbol] = data.symbol.as_slice() else {
            anyhow::bail!("--csv loads a single symbol, got {}", data.symbol.len());
        };
        let bars = api_client::load_csv(path)
            .with_context(|| format!("Failed to load bars from {}", path.display()))?;
        return Ok(BTreeMap::from([(symbol.clone(), bars)]));
    }

    let range = DataRange::from_parts(data.start, data.end, data.period.as_deref())?;
    let client = MarketDataClient::new()?;
    let loaded = client
        .load_many(&data.symbol, &range, &data.interval)
        .await
        .context("Failed to download market data")?;
    Ok(loaded)
}

/// Handles the logic for the `backtest` subcommand.
async fn handle_backtest(settings: &Settings, strategy_name: &str, data: &DataArgs) -> Result<()> {
    // --- 1. Configuration ---
    let config = settings.strategy_config(strategy_name)?;
    let client: Option<Arc<dyn CompletionClient>> = if strategy_name == "llm" {
        OpenAiClient::from_env(settings.llm.clone())?.map(|c| Arc::new(c) as Arc<dyn CompletionClient>)
    } else {
        None
    };

    // --- 2. Load Data ---
    let data_sets = load_data(data).await?;

    // --- 3. Run one backtest per symbol ---
    for (symbol, bars) in &data_sets {
        let strategy = strategies::create_strategy(&config, client.clone())?;
        let executor = Box::new(SimulatedExecutor::new(settings.backtest.simulation()));
        let cash = settings.backtest.initial_cash_for(bars);

        let mut backtester = Backtester::new(symbol.as_str(), strategy, executor, cash)?;
        let result = backtester
            .run(bars)
            .await
            .with_context(|| format!("Backtest of {symbol} failed"))?;

        print_report(symbol, backtester.strategy.name(), &result.report);
    }

    Ok(())
}

/// Handles the logic for the `optimize` subcommand.
async fn handle_optimize(settings: &Settings, strategy_name: &str, top: usize, data: &DataArgs) -> Result<()> {
    let start_time = Instant::now();
    tracing::info!(strategy = strategy_name, "Starting optimization job...");

    let param_sets = parameter_grid(strategy_name)?;
    let data_sets = load_data(data).await?;

    for (symbol, bars) in data_sets {
        let simulation = settings.backtest.simulation();
        let initial_cash = settings.backtest.initial_cash_for(&bars);
        let cores = settings.app.optimizer_cores;
        let strategy = strategy_name.to_string();
        let params = param_sets.clone();
        let job_symbol = symbol.clone();

        tracing::info!(symbol = %symbol, runs = params.len(), "Optimizing.");

        // Move the heavy, parallel work to a blocking thread.
        let runs = task::spawn_blocking(move || {
            let job = OptimizationJob {
                symbol: &job_symbol,
                strategy: &strategy,
                bars: &bars,
                simulation,
                initial_cash,
            };
            run_optimization(&job, &params, cores)
        })
        .await??;

        let ranked = rank_by_final_equity(runs);
        print_optimization_report(&symbol, strategy_name, &ranked, top);
    }

    tracing::info!(duration = ?start_time.elapsed(), "Optimization job finished.");
    Ok(())
}
