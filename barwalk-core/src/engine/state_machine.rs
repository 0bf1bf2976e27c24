//! Position state machine: walks one bar at a time through
//! `None → Enter → Position → (Exit →) None`.
//!
//! Per-bar order while in a position (first match wins):
//! 1. Extend the favorable extreme from the bar's high (long) / low (short)
//! 2. Stop-loss breached intrabar → close at the stop
//! 3. Re-evaluate the trailing stop (tighten only)
//! 4. Profit target breached intrabar → close at the target
//! 5. Mark to close, count the bar
//! 6. Exit rule → close at this bar's close

use chrono::NaiveDateTime;
use tracing::trace;

use crate::domain::{ExitReason, Position, PriceBar, TimestampedValue, Trade, TradeDirection};
use crate::strategy::{
    DistanceFn, EntryArgs, EntryRequest, EntrySignal, ExitRequest, ExitSignal, PositionArgs,
    Strategy,
};

use super::error::BacktestError;
use super::finalize::finalize_position;
use super::observer::{notify, BacktestObserver, EnterEvent, ExitEvent};
use super::state::{BacktestOptions, PositionStatus};

/// Machine state. The open position lives inside the variants that own one,
/// so "exactly one position while in Position/Exit" holds by construction.
#[derive(Debug, Clone, PartialEq)]
enum State {
    None,
    Enter(EntryRequest),
    Position(Position),
    Exit(Position),
}

/// Drives a strategy through a bar sequence, collecting completed trades.
pub struct PositionStateMachine<'s, B, P> {
    strategy: &'s Strategy<B, P>,
    options: BacktestOptions,
    state: State,
    trades: Vec<Trade>,
}

impl<'s, B: PriceBar, P> PositionStateMachine<'s, B, P> {
    pub fn new(strategy: &'s Strategy<B, P>, options: BacktestOptions) -> Self {
        Self {
            strategy,
            options,
            state: State::None,
            trades: Vec::new(),
        }
    }

    pub fn status(&self) -> PositionStatus {
        match self.state {
            State::None => PositionStatus::None,
            State::Enter(_) => PositionStatus::Enter,
            State::Position(_) => PositionStatus::Position,
            State::Exit(_) => PositionStatus::Exit,
        }
    }

    /// The open position, if any.
    pub fn position(&self) -> Option<&Position> {
        match &self.state {
            State::Position(position) | State::Exit(position) => Some(position),
            State::None | State::Enter(_) => None,
        }
    }

    /// Trades completed so far, in exit order.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Process one bar. `lookback` is the full window with `bar` as its last element.
    pub fn step(
        &mut self,
        bar: &B,
        lookback: &[B],
        observer: &mut dyn BacktestObserver<B>,
    ) -> Result<(), BacktestError> {
        let state = std::mem::replace(&mut self.state, State::None);
        self.state = match state {
            State::None => self.step_none(bar, lookback)?,
            State::Enter(request) => self.step_enter(request, bar, lookback, observer)?,
            State::Position(position) => self.step_position(position, bar, lookback, observer)?,
            State::Exit(position) => {
                self.close(position, bar, bar.open(), ExitReason::ExitRule, observer);
                State::None
            }
        };
        Ok(())
    }

    /// Close any open position at `last_bar`'s close and hand back the trades.
    pub fn finish(
        mut self,
        last_bar: &B,
        observer: &mut dyn BacktestObserver<B>,
    ) -> Vec<Trade> {
        match std::mem::replace(&mut self.state, State::None) {
            State::Position(position) | State::Exit(position) => {
                self.close(position, last_bar, last_bar.close(), ExitReason::Finalize, observer);
            }
            State::Enter(request) => {
                trace!(direction = ?request.direction, "pending entry dropped at end of series");
            }
            State::None => {}
        }
        self.trades
    }

    fn step_none(&self, bar: &B, lookback: &[B]) -> Result<State, BacktestError> {
        let args = EntryArgs {
            bar,
            lookback,
            parameters: &self.strategy.parameters,
        };
        let mut signal = EntrySignal::new();
        (self.strategy.entry_rule)(&mut signal, &args)?;

        if signal.calls() > 1 {
            return Err(BacktestError::DuplicateSignal {
                hook: "entry_rule",
                time: bar.time(),
            });
        }

        match signal.into_request() {
            Some(request) => {
                if let Some(price) = request.entry_price {
                    if !price.is_finite() || price <= 0.0 {
                        return Err(BacktestError::InvalidEntryPrice {
                            price,
                            time: bar.time(),
                        });
                    }
                }
                trace!(time = %bar.time(), direction = ?request.direction, "entry signalled");
                Ok(State::Enter(request))
            }
            None => Ok(State::None),
        }
    }

    fn step_enter(
        &self,
        request: EntryRequest,
        bar: &B,
        lookback: &[B],
        observer: &mut dyn BacktestObserver<B>,
    ) -> Result<State, BacktestError> {
        if let Some(price) = request.entry_price {
            let breached = match request.direction {
                TradeDirection::Long => bar.high() >= price,
                TradeDirection::Short => bar.low() <= price,
            };
            if !breached {
                return Ok(State::Enter(request));
            }
        }

        let strategy = self.strategy;
        let direction = request.direction;
        let entry_price = bar.open();
        let mut position = Position::open(direction, bar.time(), entry_price);
        let time = bar.time();

        let mut stop: Option<f64> = None;
        if let Some(stop_loss) = &strategy.stop_loss {
            let distance = self.distance(stop_loss, "stop_loss", &position, bar, lookback)?;
            stop = Some(direction.stop_from(entry_price, distance));
        }
        if let Some(trailing) = &strategy.trailing_stop_loss {
            let distance =
                self.distance(trailing, "trailing_stop_loss", &position, bar, lookback)?;
            let candidate = direction.stop_from(position.max_price_recorded, distance);
            stop = Some(match stop {
                Some(fixed) => direction.most_favorable(fixed, candidate),
                None => candidate,
            });
        }
        let target = match &strategy.profit_target {
            Some(profit_target) => {
                let distance =
                    self.distance(profit_target, "profit_target", &position, bar, lookback)?;
                Some(direction.target_from(entry_price, distance))
            }
            None => None,
        };

        position.cur_stop_price = stop;
        position.profit_target = target;
        position.establish_risk();

        if self.options.record_stop_price {
            position.stop_price_series =
                Some(position.cur_stop_price.map(|value| point(time, value)).into_iter().collect());
        }
        if self.options.record_risk {
            position.risk_series =
                Some(position.cur_risk_pct.map(|value| point(time, value)).into_iter().collect());
        }

        notify(observer, |o| {
            o.on_enter(&EnterEvent {
                direction,
                entry_price,
                bar,
                position: &position,
            })
        });

        Ok(State::Position(position))
    }

    fn step_position(
        &mut self,
        mut position: Position,
        bar: &B,
        lookback: &[B],
        observer: &mut dyn BacktestObserver<B>,
    ) -> Result<State, BacktestError> {
        let strategy = self.strategy;
        let direction = position.direction;
        let time = bar.time();

        position.record_extreme(bar.high(), bar.low());

        if let Some(stop) = position.cur_stop_price {
            let breached = match direction {
                TradeDirection::Long => bar.low() <= stop,
                TradeDirection::Short => bar.high() >= stop,
            };
            if breached {
                self.close(position, bar, stop, ExitReason::StopLoss, observer);
                return Ok(State::None);
            }
        }

        if let Some(trailing) = &strategy.trailing_stop_loss {
            let distance =
                self.distance(trailing, "trailing_stop_loss", &position, bar, lookback)?;
            let candidate = direction.stop_from(position.max_price_recorded, distance);
            let tighter = match position.cur_stop_price {
                Some(current) => direction.is_more_favorable(candidate, current),
                None => true,
            };
            if tighter {
                position.cur_stop_price = Some(candidate);
            }
        }

        if let (Some(series), Some(stop)) =
            (position.stop_price_series.as_mut(), position.cur_stop_price)
        {
            series.push(point(time, stop));
        }

        if let Some(target) = position.profit_target {
            let breached = match direction {
                TradeDirection::Long => bar.high() >= target,
                TradeDirection::Short => bar.low() <= target,
            };
            if breached {
                self.close(position, bar, target, ExitReason::ProfitTarget, observer);
                return Ok(State::None);
            }
        }

        position.mark_to_close(bar.close());

        if let (Some(series), Some(risk)) = (position.risk_series.as_mut(), position.cur_risk_pct) {
            series.push(point(time, risk));
        }

        let Some(exit_rule) = &strategy.exit_rule else {
            return Ok(State::Position(position));
        };

        let mut signal = ExitSignal::new();
        {
            let args = PositionArgs {
                entry_price: position.entry_price,
                position: &position,
                bar,
                lookback,
                parameters: &strategy.parameters,
            };
            exit_rule(&mut signal, &args)?;
        }

        if signal.calls() > 1 {
            return Err(BacktestError::DuplicateSignal {
                hook: "exit_rule",
                time,
            });
        }

        match signal.into_request() {
            Some(ExitRequest::AtClose) => {
                self.close(position, bar, bar.close(), ExitReason::ExitRule, observer);
                Ok(State::None)
            }
            Some(ExitRequest::AtNextOpen) => Ok(State::Exit(position)),
            None => Ok(State::Position(position)),
        }
    }

    /// Evaluate a distance hook and reject anything but a finite positive value.
    fn distance(
        &self,
        hook: &DistanceFn<B, P>,
        name: &'static str,
        position: &Position,
        bar: &B,
        lookback: &[B],
    ) -> Result<f64, BacktestError> {
        let args = PositionArgs {
            entry_price: position.entry_price,
            position,
            bar,
            lookback,
            parameters: &self.strategy.parameters,
        };
        let distance = hook(&args)?;
        if !distance.is_finite() || distance <= 0.0 {
            return Err(BacktestError::InvalidDistance {
                hook: name,
                distance,
                time: bar.time(),
            });
        }
        Ok(distance)
    }

    fn close(
        &mut self,
        position: Position,
        bar: &B,
        exit_price: f64,
        reason: ExitReason,
        observer: &mut dyn BacktestObserver<B>,
    ) {
        let trade = finalize_position(&position, bar.time(), exit_price, reason);
        notify(observer, |o| {
            o.on_exit(&ExitEvent {
                exit_price,
                bar,
                position: &position,
                reason,
            })
        });
        self.trades.push(trade);
    }
}

fn point(time: NaiveDateTime, value: f64) -> TimestampedValue {
    TimestampedValue { time, value }
}
