//! Strategy contract: the decision hooks a caller plugs into the engine.
//!
//! A [`Strategy`] is a set of optional function slots. The engine branches on
//! slot presence at each decision point:
//!
//! - `entry_rule` (required): signals entries while flat
//! - `stop_loss`: distance from entry, evaluated once at entry
//! - `trailing_stop_loss`: distance from the favorable extreme, every bar
//! - `profit_target`: distance from entry, evaluated once at entry
//! - `exit_rule`: signals discretionary exits while in a position
//! - `prep_indicators`: decorates the bar series once before the run
//!
//! Every hook returns `Result`; an error aborts the run and reaches the caller
//! unchanged.

pub mod signal;

pub use signal::{EntryRequest, EntrySignal, ExitRequest, ExitSignal};

use crate::domain::Position;

/// Error raised inside a strategy hook.
pub type StrategyError = Box<dyn std::error::Error + Send + Sync>;

pub type StrategyResult<T> = Result<T, StrategyError>;

/// Arguments for `entry_rule`.
#[derive(Debug)]
pub struct EntryArgs<'a, B, P> {
    pub bar: &'a B,
    /// Most recent bars, oldest first, current bar last.
    pub lookback: &'a [B],
    pub parameters: &'a P,
}

/// Arguments for hooks evaluated while a position exists.
#[derive(Debug)]
pub struct PositionArgs<'a, B, P> {
    pub entry_price: f64,
    pub position: &'a Position,
    pub bar: &'a B,
    pub lookback: &'a [B],
    pub parameters: &'a P,
}

pub type EntryRuleFn<B, P> =
    Box<dyn Fn(&mut EntrySignal, &EntryArgs<'_, B, P>) -> StrategyResult<()> + Send + Sync>;
pub type ExitRuleFn<B, P> =
    Box<dyn Fn(&mut ExitSignal, &PositionArgs<'_, B, P>) -> StrategyResult<()> + Send + Sync>;
pub type DistanceFn<B, P> =
    Box<dyn Fn(&PositionArgs<'_, B, P>) -> StrategyResult<f64> + Send + Sync>;
pub type PrepIndicatorsFn<B, P> =
    Box<dyn Fn(&P, &[B]) -> StrategyResult<Vec<B>> + Send + Sync>;

/// A trading strategy: lookback size, opaque parameters and decision hooks.
pub struct Strategy<B, P = ()> {
    pub(crate) lookback_period: usize,
    pub(crate) parameters: P,
    pub(crate) entry_rule: EntryRuleFn<B, P>,
    pub(crate) exit_rule: Option<ExitRuleFn<B, P>>,
    pub(crate) stop_loss: Option<DistanceFn<B, P>>,
    pub(crate) trailing_stop_loss: Option<DistanceFn<B, P>>,
    pub(crate) profit_target: Option<DistanceFn<B, P>>,
    pub(crate) prep_indicators: Option<PrepIndicatorsFn<B, P>>,
}

impl<B> Strategy<B, ()> {
    /// Strategy without parameters.
    pub fn new<F>(entry_rule: F) -> Self
    where
        F: Fn(&mut EntrySignal, &EntryArgs<'_, B, ()>) -> StrategyResult<()> + Send + Sync + 'static,
    {
        Self::with_parameters((), entry_rule)
    }
}

impl<B, P> Strategy<B, P> {
    /// Strategy carrying `parameters`, passed unchanged to every hook.
    pub fn with_parameters<F>(parameters: P, entry_rule: F) -> Self
    where
        F: Fn(&mut EntrySignal, &EntryArgs<'_, B, P>) -> StrategyResult<()> + Send + Sync + 'static,
    {
        Self {
            lookback_period: 1,
            parameters,
            entry_rule: Box::new(entry_rule),
            exit_rule: None,
            stop_loss: None,
            trailing_stop_loss: None,
            profit_target: None,
            prep_indicators: None,
        }
    }

    pub fn with_lookback_period(mut self, lookback_period: usize) -> Self {
        self.lookback_period = lookback_period;
        self
    }

    pub fn with_exit_rule<F>(mut self, exit_rule: F) -> Self
    where
        F: Fn(&mut ExitSignal, &PositionArgs<'_, B, P>) -> StrategyResult<()> + Send + Sync + 'static,
    {
        self.exit_rule = Some(Box::new(exit_rule));
        self
    }

    pub fn with_stop_loss<F>(mut self, stop_loss: F) -> Self
    where
        F: Fn(&PositionArgs<'_, B, P>) -> StrategyResult<f64> + Send + Sync + 'static,
    {
        self.stop_loss = Some(Box::new(stop_loss));
        self
    }

    pub fn with_trailing_stop_loss<F>(mut self, trailing_stop_loss: F) -> Self
    where
        F: Fn(&PositionArgs<'_, B, P>) -> StrategyResult<f64> + Send + Sync + 'static,
    {
        self.trailing_stop_loss = Some(Box::new(trailing_stop_loss));
        self
    }

    pub fn with_profit_target<F>(mut self, profit_target: F) -> Self
    where
        F: Fn(&PositionArgs<'_, B, P>) -> StrategyResult<f64> + Send + Sync + 'static,
    {
        self.profit_target = Some(Box::new(profit_target));
        self
    }

    pub fn with_prep_indicators<F>(mut self, prep_indicators: F) -> Self
    where
        F: Fn(&P, &[B]) -> StrategyResult<Vec<B>> + Send + Sync + 'static,
    {
        self.prep_indicators = Some(Box::new(prep_indicators));
        self
    }

    pub fn lookback_period(&self) -> usize {
        self.lookback_period
    }

    pub fn parameters(&self) -> &P {
        &self.parameters
    }

    pub fn has_exit_rule(&self) -> bool {
        self.exit_rule.is_some()
    }

    pub fn has_stop_loss(&self) -> bool {
        self.stop_loss.is_some()
    }

    pub fn has_trailing_stop_loss(&self) -> bool {
        self.trailing_stop_loss.is_some()
    }

    pub fn has_profit_target(&self) -> bool {
        self.profit_target.is_some()
    }

    pub fn has_prep_indicators(&self) -> bool {
        self.prep_indicators.is_some()
    }
}

impl<B, P: std::fmt::Debug> std::fmt::Debug for Strategy<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy")
            .field("lookback_period", &self.lookback_period)
            .field("parameters", &self.parameters)
            .field("exit_rule", &self.has_exit_rule())
            .field("stop_loss", &self.has_stop_loss())
            .field("trailing_stop_loss", &self.has_trailing_stop_loss())
            .field("profit_target", &self.has_profit_target())
            .field("prep_indicators", &self.has_prep_indicators())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;

    #[test]
    fn defaults_to_lookback_of_one_and_no_hooks() {
        let strategy: Strategy<Bar> = Strategy::new(|_enter, _args| Ok(()));
        assert_eq!(strategy.lookback_period(), 1);
        assert!(!strategy.has_exit_rule());
        assert!(!strategy.has_stop_loss());
        assert!(!strategy.has_trailing_stop_loss());
        assert!(!strategy.has_profit_target());
        assert!(!strategy.has_prep_indicators());
    }

    #[test]
    fn builder_fills_slots() {
        let strategy: Strategy<Bar, f64> = Strategy::with_parameters(2.5, |enter, _args| {
            enter.long();
            Ok(())
        })
        .with_lookback_period(5)
        .with_stop_loss(|args| Ok(*args.parameters))
        .with_profit_target(|args| Ok(args.parameters * 2.0))
        .with_exit_rule(|_exit, _args| Ok(()));

        assert_eq!(strategy.lookback_period(), 5);
        assert_eq!(*strategy.parameters(), 2.5);
        assert!(strategy.has_stop_loss());
        assert!(strategy.has_profit_target());
        assert!(strategy.has_exit_rule());
        assert!(!strategy.has_trailing_stop_loss());
    }

    #[test]
    fn debug_reports_slot_presence() {
        let strategy: Strategy<Bar> =
            Strategy::new(|_enter, _args| Ok(())).with_trailing_stop_loss(|_| Ok(1.0));
        let text = format!("{strategy:?}");
        assert!(text.contains("trailing_stop_loss: true"));
        assert!(text.contains("stop_loss: false"));
    }
}
