// In app/src/analyzer.rs

use crate::optimizer::OptimizationRun;
use num_traits::ToPrimitive;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RankedReport {
    /// Final equity of the run; higher is better.
    pub score: f64,
    pub parameters: toml::Value,
    pub report: analytics::types::PerformanceReport,
}

/// Ranks optimization runs by final equity, best first.
pub fn rank_by_final_equity(runs: Vec<OptimizationRun>) -> Vec<RankedReport> {
    let total_runs = runs.len();

    let mut ranked: Vec<RankedReport> = runs
        .into_iter()
        .map(|run| RankedReport {
            score: run.report.final_equity.to_f64().unwrap_or(f64::MIN),
            parameters: run.parameters,
            report: run.report,
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    tracing::info!(total_runs, best = ranked.first().map(|r| r.score), "Finished ranking runs.");
    ranked
}

/// Prints the best `top` parameter sets.
pub fn print_optimization_report(symbol: &str, strategy: &str, results: &[RankedReport], top: usize) {
    println!("\n--- Optimization Complete: {} / {} ---", strategy, symbol);
    println!("---------------------------------");
    println!("Top {} Parameter Sets by Final Equity:", top.min(results.len()));
    println!("---------------------------------");

    for (i, ranked) in results.iter().take(top).enumerate() {
        let report = &ranked.report;
        println!("\n[Rank {} | Final Equity: ${:.2}]", i + 1, ranked.score);
        println!("  - Parameters: {}", serde_json::to_string(&ranked.parameters).unwrap_or_default());
        println!(
            "  - Return: {:.2}% | Max Drawdown: {:.2}% | Sharpe: {:.2} | Win Rate: {:.2}% | Trades: {}",
            report.net_pnl_percentage,
            report.max_drawdown_percentage,
            report.sharpe_ratio,
            report.win_rate,
            report.total_trades
        );
    }
    println!("\n---------------------------------");

    if let Some(best) = results.first() {
        println!("Recommendation: The parameter set with the highest final equity is:");
        println!("  {}", serde_json::to_string_pretty(&best.parameters).unwrap_or_default());
    } else {
        println!("Recommendation: No parameter set completed successfully.");
    }
}
