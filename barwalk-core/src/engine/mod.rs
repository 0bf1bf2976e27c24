//! Backtesting engine: bar-by-bar position state machine and its driver.
//!
//! One run walks the bar series once:
//!
//! 1. Validate the series and run the strategy's `prep_indicators` hook
//! 2. Push each bar into the lookback window (no-op until the window is full)
//! 3. Step the position state machine
//! 4. Force-close any open position at the last bar's close
//! 5. Notify the observer and return the trades

pub mod backtest;
pub mod error;
pub mod finalize;
pub mod lookback;
pub mod observer;
pub mod state;
pub mod state_machine;

pub use backtest::{backtest, backtest_silent, validate_series};
pub use error::BacktestError;
pub use finalize::finalize_position;
pub use lookback::LookbackWindow;
pub use observer::{
    BacktestObserver, EnterEvent, ExitEvent, NoOpObserver, PositionEvent, RecordingObserver,
    TracingObserver,
};
pub use state::{BacktestOptions, PositionStatus};
pub use state_machine::PositionStateMachine;
