//! Barwalk Runner: run orchestration and trade analysis.
//!
//! This crate builds on `barwalk-core` to provide:
//! - TOML run configuration with content-addressed run ids
//! - Bar loading from CSV or a seeded synthetic walk
//! - Preset strategies (MA crossover, channel breakout)
//! - Trade analysis, equity and drawdown curves, Monte Carlo resampling
//! - JSON and CSV export

pub mod analysis;
pub mod config;
pub mod data_loader;
pub mod equity;
pub mod export;
pub mod monte_carlo;
pub mod presets;
pub mod runner;

pub use analysis::{analyze, AnalysisError, AnalysisReport};
pub use config::{ConfigError, DataConfig, RunConfig, RunId, StrategyConfig};
pub use data_loader::{generate_synthetic_bars, load_bars, load_csv_bars, LoadError};
pub use equity::{compute_drawdown, compute_equity_curve};
pub use monte_carlo::{monte_carlo, summarize_monte_carlo, MonteCarloSummary, PercentileSpread};
pub use presets::{build_preset, PresetStrategy};
pub use runner::{run_from_config, run_preset_on_bars, BacktestResult, RunError};
