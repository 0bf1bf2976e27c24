//! Barwalk Core: single-position, bar-by-bar backtesting.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (bars, positions, trades)
//! - The strategy contract (entry rule plus optional exit, stop, target hooks)
//! - The position state machine and the backtest driver
//! - Observers for entry/exit notifications
//! - Reference indicators used by strategy indicator-prep hooks

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod strategy;

pub use domain::{Bar, ExitReason, Position, PriceBar, TimestampedValue, Trade, TradeDirection};
pub use engine::{backtest, backtest_silent, BacktestError, BacktestObserver, BacktestOptions};
pub use strategy::{Strategy, StrategyError, StrategyResult};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: results and strategies can cross thread boundaries.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<engine::BacktestOptions>();
        require_sync::<engine::BacktestOptions>();
        require_send::<engine::BacktestError>();
        require_sync::<engine::BacktestError>();
        require_send::<engine::RecordingObserver>();
        require_sync::<engine::RecordingObserver>();

        require_send::<strategy::Strategy<domain::Bar>>();
        require_sync::<strategy::Strategy<domain::Bar>>();
        require_send::<strategy::Strategy<domain::Bar, (usize, f64)>>();
        require_sync::<strategy::Strategy<domain::Bar, (usize, f64)>>();
    }

    /// Architecture contract: the entry rule cannot see an open position.
    ///
    /// `EntryArgs` carries only the bar, the lookback window, and the
    /// parameters. If a position field is ever added, this destructuring stops
    /// compiling.
    #[test]
    fn entry_args_have_no_position() {
        fn _destructure(args: strategy::EntryArgs<'_, domain::Bar, ()>) {
            let strategy::EntryArgs {
                bar: _,
                lookback: _,
                parameters: _,
            } = args;
        }
    }
}
