//! Barwalk CLI: run a configured backtest or analyze a saved trade list.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config file and save artifacts
//! - `analyze`: compute the analysis report for a `trades.json` file

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use barwalk_core::ExitReason;
use barwalk_runner::export::{read_trades_json, save_artifacts};
use barwalk_runner::{
    analyze, monte_carlo, run_from_config, summarize_monte_carlo, BacktestResult,
    MonteCarloSummary, RunConfig,
};

#[derive(Parser)]
#[command(name = "barwalk", about = "Barwalk CLI: bar-by-bar strategy backtester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML run config.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for result artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Analyze a saved trade list and print the report as JSON.
    Analyze {
        /// Path to a trades.json file.
        #[arg(long)]
        trades: PathBuf,

        /// Starting capital for the equity simulation.
        #[arg(long, default_value_t = 10_000.0)]
        capital: f64,

        /// Also resample the trades this many times and print the spread.
        #[arg(long)]
        monte_carlo: Option<usize>,

        /// Trades per Monte Carlo sample. Defaults to the trade count.
        #[arg(long)]
        sample_size: Option<usize>,

        /// Seed for Monte Carlo resampling.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output_dir } => run_backtest_cmd(config, output_dir),
        Commands::Analyze {
            trades,
            capital,
            monte_carlo,
            sample_size,
            seed,
        } => run_analyze_cmd(trades, capital, monte_carlo, sample_size, seed),
    }
}

fn run_backtest_cmd(config_path: PathBuf, output_dir: PathBuf) -> Result<()> {
    let config = RunConfig::from_file(&config_path)?;
    let result = run_from_config(&config)
        .with_context(|| format!("backtest failed for {}", config_path.display()))?;

    print_summary(&result);

    let run_dir = save_artifacts(&result, &output_dir)?;
    info!(run_id = %result.run_id, dir = %run_dir.display(), "artifacts saved");
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn run_analyze_cmd(
    trades_path: PathBuf,
    capital: f64,
    iterations: Option<usize>,
    sample_size: Option<usize>,
    seed: u64,
) -> Result<()> {
    let trades = read_trades_json(&trades_path)?;
    info!(trades = trades.len(), path = %trades_path.display(), "trades loaded");
    let report = analyze(capital, &trades)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    let Some(iterations) = iterations else {
        return Ok(());
    };
    if iterations == 0 {
        bail!("--monte-carlo must be at least 1");
    }
    let samples = monte_carlo(
        &trades,
        iterations,
        sample_size.unwrap_or(trades.len()),
        seed,
    );
    match summarize_monte_carlo(capital, &samples)? {
        Some(summary) => print_monte_carlo(&summary),
        None => eprintln!("No trades to resample."),
    }

    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let report = &result.report;
    println!();
    println!("=== Backtest Result ===");
    println!("Strategy:       {}", result.strategy);
    println!("Run ID:         {}", result.run_id);
    println!("Bars:           {}", result.bar_count);
    println!("Trades:         {}", report.total_trades);
    println!();
    println!("--- Performance ---");
    println!(
        "Final Capital:  {:.2} (from {:.2})",
        report.final_capital, report.starting_capital
    );
    println!("Profit:         {:.2}%", report.profit_pct);
    println!(
        "Max Drawdown:   {:.2} ({:.2}%)",
        report.max_drawdown, report.max_drawdown_pct
    );
    println!("Win Rate:       {:.1}%", report.percent_profitable);
    println!("Profit Factor:  {}", format_opt(report.profit_factor, 2));
    println!("Expectancy:     {}", format_opt(report.expectancy, 3));
    println!("SQN:            {}", format_opt(report.system_quality, 3));

    let mut by_reason: BTreeMap<String, usize> = BTreeMap::new();
    for trade in &result.trades {
        *by_reason.entry(exit_label(trade.exit_reason)).or_default() += 1;
    }
    if !by_reason.is_empty() {
        println!();
        println!("--- Exits ---");
        for (reason, count) in &by_reason {
            println!("{reason:<15} {count}");
        }
    }
    println!();
}

fn print_monte_carlo(summary: &MonteCarloSummary) {
    println!();
    println!("=== Monte Carlo ({} samples) ===", summary.iterations);
    println!(
        "{:<14} {:>9} {:>9} {:>9} {:>9} {:>9}",
        "", "p5", "p25", "median", "p75", "p95"
    );
    for (label, spread) in [
        ("Profit %", &summary.profit_pct),
        ("Max DD %", &summary.max_drawdown_pct),
    ] {
        println!(
            "{:<14} {:>9.2} {:>9.2} {:>9.2} {:>9.2} {:>9.2}",
            label, spread.p5, spread.p25, spread.median, spread.p75, spread.p95
        );
    }
    println!(
        "P(loss):       {:.1}%",
        summary.probability_of_loss * 100.0
    );
}

fn exit_label(reason: ExitReason) -> String {
    format!("{reason}:")
}

fn format_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "n/a".into(),
    }
}
