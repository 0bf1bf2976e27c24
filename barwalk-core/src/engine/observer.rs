//! Observer channel: notifications fired as the state machine transitions.
//!
//! Observers are side effects only. Delivery is isolated with
//! `catch_unwind`: a panicking observer is logged and the run carries on with
//! its state untouched.

use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::domain::{ExitReason, Position, PriceBar, Trade, TradeDirection};

/// Fired when a position is opened.
#[derive(Debug)]
pub struct EnterEvent<'a, B> {
    pub direction: TradeDirection,
    pub entry_price: f64,
    pub bar: &'a B,
    pub position: &'a Position,
}

/// Fired when a position is closed.
#[derive(Debug)]
pub struct ExitEvent<'a, B> {
    pub exit_price: f64,
    pub bar: &'a B,
    pub position: &'a Position,
    pub reason: ExitReason,
}

/// Listener for backtest notifications. All methods default to no-ops.
pub trait BacktestObserver<B> {
    fn on_enter(&mut self, _event: &EnterEvent<'_, B>) {}

    fn on_exit(&mut self, _event: &ExitEvent<'_, B>) {}

    fn on_complete(&mut self, _trades: &[Trade]) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpObserver;

impl<B> BacktestObserver<B> for NoOpObserver {}

/// Observer that logs transitions through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl<B: PriceBar> BacktestObserver<B> for TracingObserver {
    fn on_enter(&mut self, event: &EnterEvent<'_, B>) {
        debug!(
            time = %event.bar.time(),
            direction = ?event.direction,
            price = event.entry_price,
            stop = ?event.position.cur_stop_price,
            target = ?event.position.profit_target,
            "position entered"
        );
    }

    fn on_exit(&mut self, event: &ExitEvent<'_, B>) {
        debug!(
            time = %event.bar.time(),
            price = event.exit_price,
            reason = %event.reason,
            bars_held = event.position.holding_period,
            "position exited"
        );
    }

    fn on_complete(&mut self, trades: &[Trade]) {
        info!(trades = trades.len(), "backtest complete");
    }
}

/// Owned copy of a notification, as captured by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Entered {
        time: NaiveDateTime,
        direction: TradeDirection,
        price: f64,
        position: Position,
    },
    Exited {
        time: NaiveDateTime,
        price: f64,
        reason: ExitReason,
        position: Position,
    },
}

/// Observer that keeps every notification it receives.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub events: Vec<PositionEvent>,
    /// Trade count delivered by the completion notification.
    pub completed: Option<usize>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: PriceBar> BacktestObserver<B> for RecordingObserver {
    fn on_enter(&mut self, event: &EnterEvent<'_, B>) {
        self.events.push(PositionEvent::Entered {
            time: event.bar.time(),
            direction: event.direction,
            price: event.entry_price,
            position: event.position.clone(),
        });
    }

    fn on_exit(&mut self, event: &ExitEvent<'_, B>) {
        self.events.push(PositionEvent::Exited {
            time: event.bar.time(),
            price: event.exit_price,
            reason: event.reason,
            position: event.position.clone(),
        });
    }

    fn on_complete(&mut self, trades: &[Trade]) {
        self.completed = Some(trades.len());
    }
}

/// Deliver one notification, containing any panic raised by the observer.
pub(crate) fn notify<B, F>(observer: &mut dyn BacktestObserver<B>, deliver: F)
where
    F: FnOnce(&mut dyn BacktestObserver<B>),
{
    if catch_unwind(AssertUnwindSafe(|| deliver(observer))).is_err() {
        warn!("observer panicked; notification dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::NaiveDate;

    #[derive(Default)]
    struct PanickingObserver {
        calls: usize,
    }

    impl BacktestObserver<Bar> for PanickingObserver {
        fn on_complete(&mut self, _trades: &[Trade]) {
            self.calls += 1;
            panic!("observer failure");
        }
    }

    #[test]
    fn panicking_observer_is_contained() {
        let mut observer = PanickingObserver::default();
        notify::<Bar, _>(&mut observer, |o| o.on_complete(&[]));
        notify::<Bar, _>(&mut observer, |o| o.on_complete(&[]));
        assert_eq!(observer.calls, 2);
    }

    #[test]
    fn recording_observer_captures_entry() {
        let time = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bar = Bar::new(time, 10.0, 11.0, 9.0, 10.5, 100.0);
        let position = Position::open(TradeDirection::Long, time, 10.0);
        let mut observer = RecordingObserver::new();
        BacktestObserver::<Bar>::on_enter(
            &mut observer,
            &EnterEvent {
                direction: TradeDirection::Long,
                entry_price: 10.0,
                bar: &bar,
                position: &position,
            },
        );
        assert_eq!(observer.events.len(), 1);
        assert!(matches!(
            observer.events[0],
            PositionEvent::Entered { price, .. } if price == 10.0
        ));
    }
}
