//! Errors that abort a backtest run.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::strategy::StrategyError;

/// Every failure is fatal: the run stops and no partial trade list is returned.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("bar series is empty")]
    EmptySeries,
    #[error("not enough bars: {bars} < lookback period {lookback_period}")]
    InsufficientBars { bars: usize, lookback_period: usize },
    #[error("malformed bar at index {index}: {reason}")]
    MalformedBar { index: usize, reason: String },
    #[error("invalid strategy: {0}")]
    InvalidStrategy(String),
    #[error("{hook} signalled more than once at {time}")]
    DuplicateSignal {
        hook: &'static str,
        time: NaiveDateTime,
    },
    #[error("{hook} returned invalid distance {distance} at {time}")]
    InvalidDistance {
        hook: &'static str,
        distance: f64,
        time: NaiveDateTime,
    },
    #[error("invalid conditional entry price {price} at {time}")]
    InvalidEntryPrice { price: f64, time: NaiveDateTime },
    /// Error raised by a strategy hook, passed through untouched.
    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

impl BacktestError {
    /// The original strategy error, if this failure came from a hook.
    pub fn strategy_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            BacktestError::Strategy(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
