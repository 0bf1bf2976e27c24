//! Built-in strategies selectable from a run config.
//!
//! Each preset precomputes its indicators once in `prep_indicators` and reads
//! them back from the bars in its rules. Rules never act on warmup bars: an
//! entry requires every indicator it will later need to be defined.

use serde::{Deserialize, Serialize};

use barwalk_core::domain::{Bar, TradeDirection};
use barwalk_core::indicators::{atr, highest_high, lowest_low, sma};
use barwalk_core::strategy::{Strategy, StrategyResult};

use crate::config::StrategyConfig;

const SMA_FAST: &str = "sma_fast";
const SMA_SLOW: &str = "sma_slow";
const ATR: &str = "atr";
const CHANNEL_HIGH: &str = "channel_high";
const EXIT_LOW: &str = "exit_low";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaCrossoverParams {
    pub fast_period: usize,
    pub slow_period: usize,
    pub stop_atr_multiple: f64,
    pub atr_period: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelBreakoutParams {
    pub entry_period: usize,
    pub exit_period: usize,
    pub stop_atr_multiple: f64,
    pub atr_period: usize,
    pub target_atr_multiple: Option<f64>,
}

/// A preset strategy ready to run. Parameter types differ per preset.
#[derive(Debug)]
pub enum PresetStrategy {
    MaCrossover(Strategy<Bar, MaCrossoverParams>),
    ChannelBreakout(Strategy<Bar, ChannelBreakoutParams>),
}

/// Build the preset described by `config`.
pub fn build_preset(config: &StrategyConfig) -> PresetStrategy {
    match *config {
        StrategyConfig::MaCrossover {
            fast_period,
            slow_period,
            stop_atr_multiple,
            atr_period,
        } => PresetStrategy::MaCrossover(ma_crossover(MaCrossoverParams {
            fast_period,
            slow_period,
            stop_atr_multiple,
            atr_period,
        })),
        StrategyConfig::ChannelBreakout {
            entry_period,
            exit_period,
            stop_atr_multiple,
            atr_period,
            target_atr_multiple,
        } => PresetStrategy::ChannelBreakout(channel_breakout(ChannelBreakoutParams {
            entry_period,
            exit_period,
            stop_atr_multiple,
            atr_period,
            target_atr_multiple,
        })),
    }
}

/// Long when the fast SMA crosses above the slow SMA; exit when it crosses
/// back below. ATR-multiple trailing stop.
pub fn ma_crossover(params: MaCrossoverParams) -> Strategy<Bar, MaCrossoverParams> {
    Strategy::<Bar, _>::with_parameters(params, |enter, args| {
        let [prev, cur] = args.lookback else {
            return Ok(());
        };
        let (Some(pf), Some(ps), Some(cf), Some(cs)) = (
            prev.indicator(SMA_FAST),
            prev.indicator(SMA_SLOW),
            cur.indicator(SMA_FAST),
            cur.indicator(SMA_SLOW),
        ) else {
            return Ok(());
        };
        let atr_ready = cur.indicator(ATR).is_some_and(|v| v > 0.0);
        if atr_ready && pf <= ps && cf > cs {
            enter.enter(TradeDirection::Long);
        }
        Ok(())
    })
    .with_lookback_period(2)
    .with_exit_rule(|exit, args| {
        let [prev, cur] = args.lookback else {
            return Ok(());
        };
        if let (Some(pf), Some(ps), Some(cf), Some(cs)) = (
            prev.indicator(SMA_FAST),
            prev.indicator(SMA_SLOW),
            cur.indicator(SMA_FAST),
            cur.indicator(SMA_SLOW),
        ) {
            if pf >= ps && cf < cs {
                exit.exit();
            }
        }
        Ok(())
    })
    .with_trailing_stop_loss(|args| {
        Ok(required(args.bar, ATR)? * args.parameters.stop_atr_multiple)
    })
    .with_prep_indicators(|params, bars| {
        let fast = sma(bars, period("fast_period", params.fast_period)?);
        let slow = sma(bars, period("slow_period", params.slow_period)?);
        let range = atr(bars, period("atr_period", params.atr_period)?);
        Ok(bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let mut bar = bar.clone();
                bar.set_indicator(SMA_FAST, fast[i]);
                bar.set_indicator(SMA_SLOW, slow[i]);
                bar.set_indicator(ATR, range[i]);
                bar
            })
            .collect())
    })
}

/// Conditional long entry at the current `entry_period` high; exit on a close
/// below the prior `exit_period` low. Fixed ATR stop, optional ATR target.
pub fn channel_breakout(params: ChannelBreakoutParams) -> Strategy<Bar, ChannelBreakoutParams> {
    let strategy = Strategy::<Bar, _>::with_parameters(params, |enter, args| {
        let bar = args.bar;
        let atr_ready = bar.indicator(ATR).is_some_and(|v| v > 0.0);
        if let (Some(level), true) = (bar.indicator(CHANNEL_HIGH), atr_ready) {
            enter.enter_at(TradeDirection::Long, level);
        }
        Ok(())
    })
    .with_exit_rule(|exit, args| {
        if let Some(floor) = args.bar.indicator(EXIT_LOW) {
            if args.bar.close < floor {
                exit.exit();
            }
        }
        Ok(())
    })
    .with_stop_loss(|args| Ok(required(args.bar, ATR)? * args.parameters.stop_atr_multiple))
    .with_prep_indicators(|params, bars| {
        let channel = highest_high(bars, period("entry_period", params.entry_period)?);
        let floor = lowest_low(bars, period("exit_period", params.exit_period)?);
        let range = atr(bars, period("atr_period", params.atr_period)?);
        Ok(bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let mut bar = bar.clone();
                bar.set_indicator(CHANNEL_HIGH, channel[i]);
                // Prior bar's channel, so today's low cannot trigger its own exit.
                let prior_floor = if i == 0 { f64::NAN } else { floor[i - 1] };
                bar.set_indicator(EXIT_LOW, prior_floor);
                bar.set_indicator(ATR, range[i]);
                bar
            })
            .collect())
    });

    if params.target_atr_multiple.is_some() {
        strategy.with_profit_target(|args| {
            let multiple = args.parameters.target_atr_multiple.unwrap_or_default();
            Ok(required(args.bar, ATR)? * multiple)
        })
    } else {
        strategy
    }
}

fn period(name: &str, value: usize) -> StrategyResult<usize> {
    if value == 0 {
        return Err(format!("{name} must be >= 1").into());
    }
    Ok(value)
}

fn required(bar: &Bar, name: &str) -> StrategyResult<f64> {
    bar.indicator(name)
        .ok_or_else(|| format!("indicator '{name}' undefined at {}", bar.time).into())
}
