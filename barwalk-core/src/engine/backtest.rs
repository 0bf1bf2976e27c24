//! Backtest driver: validates input, prepares indicators, feeds bars through
//! the lookback window into the state machine, and force-closes at the end.

use std::borrow::Cow;

use tracing::{debug, info};

use crate::domain::{PriceBar, Trade};
use crate::strategy::Strategy;

use super::error::BacktestError;
use super::lookback::LookbackWindow;
use super::observer::{notify, BacktestObserver, NoOpObserver};
use super::state::BacktestOptions;
use super::state_machine::PositionStateMachine;

/// Run `strategy` once over `bars` and return the completed trades in exit order.
///
/// Any invalid input, illegal signal, or strategy error aborts the run; no
/// partial trade list is returned.
pub fn backtest<B, P>(
    strategy: &Strategy<B, P>,
    bars: &[B],
    options: BacktestOptions,
    observer: &mut dyn BacktestObserver<B>,
) -> Result<Vec<Trade>, BacktestError>
where
    B: PriceBar + Clone,
{
    let lookback_period = strategy.lookback_period;
    if lookback_period == 0 {
        return Err(BacktestError::InvalidStrategy(
            "lookback period must be >= 1".into(),
        ));
    }
    validate_series(bars)?;
    if bars.len() < lookback_period {
        return Err(BacktestError::InsufficientBars {
            bars: bars.len(),
            lookback_period,
        });
    }

    let series: Cow<'_, [B]> = match &strategy.prep_indicators {
        Some(prep) => {
            let prepared = prep(&strategy.parameters, bars)?;
            validate_series(&prepared)?;
            if prepared.len() < lookback_period {
                return Err(BacktestError::InsufficientBars {
                    bars: prepared.len(),
                    lookback_period,
                });
            }
            Cow::Owned(prepared)
        }
        None => Cow::Borrowed(bars),
    };

    debug!(bars = series.len(), lookback_period, "backtest starting");

    let mut window = LookbackWindow::new(lookback_period);
    let mut machine = PositionStateMachine::new(strategy, options);

    for bar in series.iter() {
        window.push(bar.clone());
        if !window.is_full() {
            continue;
        }
        machine.step(bar, window.snapshot(), observer)?;
    }

    // validate_series guarantees at least one bar.
    let last_bar = &series[series.len() - 1];
    let trades = machine.finish(last_bar, observer);

    info!(trades = trades.len(), bars = series.len(), "backtest finished");
    notify(observer, |o| o.on_complete(&trades));

    Ok(trades)
}

/// [`backtest`] without an observer.
pub fn backtest_silent<B, P>(
    strategy: &Strategy<B, P>,
    bars: &[B],
    options: BacktestOptions,
) -> Result<Vec<Trade>, BacktestError>
where
    B: PriceBar + Clone,
{
    backtest(strategy, bars, options, &mut NoOpObserver)
}

/// Reject empty series, insane OHLC, and non-increasing timestamps.
pub fn validate_series<B: PriceBar>(bars: &[B]) -> Result<(), BacktestError> {
    if bars.is_empty() {
        return Err(BacktestError::EmptySeries);
    }
    for (index, bar) in bars.iter().enumerate() {
        if !bar.is_sane() {
            return Err(BacktestError::MalformedBar {
                index,
                reason: format!(
                    "OHLC out of order, non-finite or non-positive (o={}, h={}, l={}, c={})",
                    bar.open(),
                    bar.high(),
                    bar.low(),
                    bar.close()
                ),
            });
        }
        if index > 0 && bar.time() <= bars[index - 1].time() {
            return Err(BacktestError::MalformedBar {
                index,
                reason: format!(
                    "time {} does not follow {}",
                    bar.time(),
                    bars[index - 1].time()
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::{Duration, NaiveDate};

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(base + Duration::days(i as i64), c, c + 1.0, c - 1.0, c, 100.0))
            .collect()
    }

    fn always_long() -> Strategy<Bar> {
        Strategy::new(|enter, _| {
            enter.long();
            Ok(())
        })
    }

    #[test]
    fn empty_series_rejected() {
        let err = backtest_silent(&always_long(), &[], BacktestOptions::default()).unwrap_err();
        assert!(matches!(err, BacktestError::EmptySeries));
    }

    #[test]
    fn fewer_bars_than_lookback_rejected() {
        let strategy = always_long().with_lookback_period(5);
        let series = bars(&[10.0, 11.0, 12.0]);
        let err = backtest_silent(&strategy, &series, BacktestOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            BacktestError::InsufficientBars {
                bars: 3,
                lookback_period: 5
            }
        ));
    }

    #[test]
    fn zero_lookback_rejected() {
        let strategy = always_long().with_lookback_period(0);
        let err = backtest_silent(&strategy, &bars(&[10.0]), BacktestOptions::default())
            .unwrap_err();
        assert!(matches!(err, BacktestError::InvalidStrategy(_)));
    }

    #[test]
    fn out_of_order_times_rejected() {
        let mut series = bars(&[10.0, 11.0, 12.0]);
        series.swap(1, 2);
        let err = validate_series(&series).unwrap_err();
        assert!(matches!(err, BacktestError::MalformedBar { index: 2, .. }));
    }

    #[test]
    fn insane_bar_rejected() {
        let mut series = bars(&[10.0, 11.0]);
        series[1].low = 20.0;
        let err = validate_series(&series).unwrap_err();
        assert!(matches!(err, BacktestError::MalformedBar { index: 1, .. }));
    }

    #[test]
    fn zero_price_bar_rejected() {
        let mut series = bars(&[10.0, 11.0, 12.0]);
        series[2] = Bar::new(series[2].time, 0.0, 0.0, 0.0, 0.0, 100.0);
        let err = validate_series(&series).unwrap_err();
        assert!(matches!(err, BacktestError::MalformedBar { index: 2, .. }));
    }

    #[test]
    fn single_bar_produces_no_trades() {
        let trades =
            backtest_silent(&always_long(), &bars(&[10.0]), BacktestOptions::default()).unwrap();
        assert!(trades.is_empty());
    }
}
