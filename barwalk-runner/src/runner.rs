//! Backtest runner: wires config, data, presets, engine, and analysis.
//!
//! Two entry points:
//! - `run_from_config()`: loads bars as the config describes, then runs. Used by the CLI.
//! - `run_preset_on_bars()`: takes pre-loaded bars. No I/O.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use barwalk_core::domain::{Bar, Trade};
use barwalk_core::engine::{backtest, BacktestError, BacktestOptions, TracingObserver};
use barwalk_core::strategy::Strategy;

use crate::analysis::{analyze, AnalysisError, AnalysisReport};
use crate::config::{ConfigError, RunConfig, RunId, StrategyConfig};
use crate::data_loader::{load_bars, LoadError};
use crate::equity::{compute_drawdown, compute_equity_curve};
use crate::presets::{build_preset, PresetStrategy};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("backtest failed: {0}")]
    Backtest(#[from] BacktestError),
    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
}

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy: String,
    pub trades: Vec<Trade>,
    pub report: AnalysisReport,
    pub equity_curve: Vec<f64>,
    pub drawdown: Vec<f64>,
    /// Bars in the input series.
    pub bar_count: usize,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run the backtest described by `config`.
pub fn run_from_config(config: &RunConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let bars = load_bars(&config.data)?;
    info!(run_id = %run_id, strategy = config.strategy.name(), bars = bars.len(), "run starting");

    let mut result = run_preset_on_bars(
        &config.strategy,
        &bars,
        config.starting_capital,
        config.options,
    )?;
    result.run_id = run_id;
    Ok(result)
}

/// Run a preset over pre-loaded bars. `run_id` is left empty.
pub fn run_preset_on_bars(
    strategy: &StrategyConfig,
    bars: &[Bar],
    starting_capital: f64,
    options: BacktestOptions,
) -> Result<BacktestResult, RunError> {
    strategy.validate()?;
    let trades = match build_preset(strategy) {
        PresetStrategy::MaCrossover(s) => run_strategy(&s, bars, options)?,
        PresetStrategy::ChannelBreakout(s) => run_strategy(&s, bars, options)?,
    };

    let report = analyze(starting_capital, &trades)?;
    info!(
        trades = report.total_trades,
        profit_pct = report.profit_pct,
        max_drawdown_pct = report.max_drawdown_pct,
        "run finished"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: RunId::new(),
        strategy: strategy.name().to_string(),
        equity_curve: compute_equity_curve(starting_capital, &trades),
        drawdown: compute_drawdown(starting_capital, &trades),
        bar_count: bars.len(),
        trades,
        report,
    })
}

fn run_strategy<P>(
    strategy: &Strategy<Bar, P>,
    bars: &[Bar],
    options: BacktestOptions,
) -> Result<Vec<Trade>, BacktestError> {
    backtest(strategy, bars, options, &mut TracingObserver)
}
