//! Run configuration loaded from TOML.
//!
//! ```toml
//! starting_capital = 10000.0
//!
//! [data]
//! synthetic = { bars = 500, seed = 7, start_price = 100.0 }
//!
//! [strategy]
//! type = "MA_CROSSOVER"
//! fast_period = 10
//! slow_period = 30
//! stop_atr_multiple = 2.0
//!
//! [options]
//! record_stop_price = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use barwalk_core::engine::BacktestOptions;

/// Content-addressable identifier for a run (BLAKE3 hex of the config JSON).
pub type RunId = String;

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Full configuration for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_starting_capital")]
    pub starting_capital: f64,
    pub data: DataConfig,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub options: BacktestOptions,
}

/// Where the bars come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataConfig {
    /// CSV file with a `time,open,high,low,close,volume` header.
    Csv(PathBuf),
    /// Seeded random walk.
    Synthetic {
        bars: usize,
        #[serde(default)]
        seed: u64,
        #[serde(default = "default_start_price")]
        start_price: f64,
    },
}

/// Built-in strategy presets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyConfig {
    /// Fast SMA crossing above slow SMA, ATR trailing stop.
    MaCrossover {
        fast_period: usize,
        slow_period: usize,
        stop_atr_multiple: f64,
        #[serde(default = "default_atr_period")]
        atr_period: usize,
    },
    /// Breakout above the prior channel high, exit below the prior channel low.
    ChannelBreakout {
        entry_period: usize,
        exit_period: usize,
        stop_atr_multiple: f64,
        #[serde(default = "default_atr_period")]
        atr_period: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_atr_multiple: Option<f64>,
    },
}

fn default_starting_capital() -> f64 {
    10_000.0
}

fn default_start_price() -> f64 {
    100.0
}

fn default_atr_period() -> usize {
    14
}

impl RunConfig {
    /// Read and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        // Relative CSV paths are resolved against the config file's directory.
        if let DataConfig::Csv(csv) = &mut config.data {
            if csv.is_relative() {
                if let Some(dir) = path.parent() {
                    *csv = dir.join(&*csv);
                }
            }
        }
        Ok(config)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.starting_capital.is_finite() || self.starting_capital <= 0.0 {
            return invalid(format!(
                "starting_capital must be > 0, got {}",
                self.starting_capital
            ));
        }

        if let DataConfig::Synthetic {
            bars, start_price, ..
        } = &self.data
        {
            if *bars == 0 {
                return invalid("synthetic bars must be >= 1".into());
            }
            if !start_price.is_finite() || *start_price <= 0.0 {
                return invalid(format!("synthetic start_price must be > 0, got {start_price}"));
            }
        }

        self.strategy.validate()
    }

    /// Deterministic id for this configuration. Identical configs share an id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

impl StrategyConfig {
    /// Preset name as written in the `type` field.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::MaCrossover { .. } => "MA_CROSSOVER",
            StrategyConfig::ChannelBreakout { .. } => "CHANNEL_BREAKOUT",
        }
    }

    /// Check periods and ATR multiples before any indicator is computed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            StrategyConfig::MaCrossover {
                fast_period,
                slow_period,
                stop_atr_multiple,
                atr_period,
            } => {
                require_period("fast_period", *fast_period)?;
                require_period("slow_period", *slow_period)?;
                require_period("atr_period", *atr_period)?;
                if fast_period >= slow_period {
                    return invalid(format!(
                        "fast_period ({fast_period}) must be < slow_period ({slow_period})"
                    ));
                }
                require_multiple("stop_atr_multiple", *stop_atr_multiple)?;
            }
            StrategyConfig::ChannelBreakout {
                entry_period,
                exit_period,
                stop_atr_multiple,
                atr_period,
                target_atr_multiple,
            } => {
                require_period("entry_period", *entry_period)?;
                require_period("exit_period", *exit_period)?;
                require_period("atr_period", *atr_period)?;
                require_multiple("stop_atr_multiple", *stop_atr_multiple)?;
                if let Some(target) = target_atr_multiple {
                    require_multiple("target_atr_multiple", *target)?;
                }
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(reason))
}

fn require_period(name: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return invalid(format!("{name} must be >= 1"));
    }
    Ok(())
}

fn require_multiple(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return invalid(format!("{name} must be > 0, got {value}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MA_TOML: &str = r#"
        starting_capital = 25000.0

        [data]
        synthetic = { bars = 300, seed = 9 }

        [strategy]
        type = "MA_CROSSOVER"
        fast_period = 10
        slow_period = 30
        stop_atr_multiple = 2.5

        [options]
        record_stop_price = true
    "#;

    #[test]
    fn parses_ma_crossover() {
        let config = RunConfig::from_toml(MA_TOML).unwrap();
        assert_eq!(config.starting_capital, 25_000.0);
        assert_eq!(
            config.data,
            DataConfig::Synthetic {
                bars: 300,
                seed: 9,
                start_price: 100.0
            }
        );
        assert_eq!(
            config.strategy,
            StrategyConfig::MaCrossover {
                fast_period: 10,
                slow_period: 30,
                stop_atr_multiple: 2.5,
                atr_period: 14,
            }
        );
        assert!(config.options.record_stop_price);
        assert!(!config.options.record_risk);
    }

    #[test]
    fn parses_channel_breakout_with_csv() {
        let config = RunConfig::from_toml(
            r#"
            [data]
            csv = "data/spy.csv"

            [strategy]
            type = "CHANNEL_BREAKOUT"
            entry_period = 20
            exit_period = 10
            stop_atr_multiple = 2.0
            target_atr_multiple = 6.0
            "#,
        )
        .unwrap();
        assert_eq!(config.starting_capital, 10_000.0);
        assert_eq!(config.data, DataConfig::Csv(PathBuf::from("data/spy.csv")));
        assert_eq!(config.strategy.name(), "CHANNEL_BREAKOUT");
        assert_eq!(config.options, BacktestOptions::default());
    }

    #[test]
    fn rejects_unknown_strategy_type() {
        let err = RunConfig::from_toml(
            r#"
            [data]
            csv = "x.csv"
            [strategy]
            type = "BUY_AND_HOLD"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_inverted_ma_periods() {
        let text = MA_TOML.replace("fast_period = 10", "fast_period = 40");
        let err = RunConfig::from_toml(&text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_non_positive_capital() {
        let text = MA_TOML.replace("starting_capital = 25000.0", "starting_capital = 0.0");
        assert!(matches!(
            RunConfig::from_toml(&text).unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn rejects_zero_stop_multiple() {
        let text = MA_TOML.replace("stop_atr_multiple = 2.5", "stop_atr_multiple = 0.0");
        assert!(RunConfig::from_toml(&text).is_err());
    }

    #[test]
    fn run_id_deterministic_and_sensitive() {
        let a = RunConfig::from_toml(MA_TOML).unwrap();
        let b = RunConfig::from_toml(MA_TOML).unwrap();
        assert_eq!(a.run_id().unwrap(), b.run_id().unwrap());
        assert_eq!(a.run_id().unwrap().len(), 64);

        let mut c = a.clone();
        c.starting_capital = 30_000.0;
        assert_ne!(a.run_id().unwrap(), c.run_id().unwrap());
    }

    #[test]
    fn json_round_trip() {
        let config = RunConfig::from_toml(MA_TOML).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = RunConfig::from_file(Path::new("/nonexistent/run.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
