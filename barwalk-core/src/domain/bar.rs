//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read access to the base OHLCV fields of a price bar.
///
/// The state machine only ever reads these fields. Strategies that decorate
/// bars with indicator values can use their own bar type as long as it
/// implements this trait.
pub trait PriceBar {
    fn time(&self) -> NaiveDateTime;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    /// Basic OHLC sanity check: all prices finite, 0 < low <= open,close <= high.
    fn is_sane(&self) -> bool {
        let (o, h, l, c) = (self.open(), self.high(), self.low(), self.close());
        if !(o.is_finite() && h.is_finite() && l.is_finite() && c.is_finite()) {
            return false;
        }
        l > 0.0 && l <= o && l <= c && o <= h && c <= h
    }
}

/// OHLCV bar for a single time interval.
///
/// `indicators` holds derived values written by a strategy's
/// `prep_indicators` hook (e.g. `"sma_10"`, `"atr_14"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub indicators: BTreeMap<String, f64>,
}

impl Bar {
    pub fn new(time: NaiveDateTime, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
            indicators: BTreeMap::new(),
        }
    }

    /// Derived indicator value, if the strategy computed one under `name`.
    /// NaN (warmup) values are reported as `None`.
    pub fn indicator(&self, name: &str) -> Option<f64> {
        self.indicators.get(name).copied().filter(|v| !v.is_nan())
    }

    pub fn set_indicator(&mut self, name: impl Into<String>, value: f64) {
        self.indicators.insert(name.into(), value);
    }
}

impl PriceBar for Bar {
    fn time(&self) -> NaiveDateTime {
        self.time
    }

    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}
