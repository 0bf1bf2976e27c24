//! Open position tracking.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    #[default]
    Long,
    Short,
}

impl TradeDirection {
    /// Profit per unit when exiting at `exit_price`.
    pub fn profit(self, entry_price: f64, exit_price: f64) -> f64 {
        match self {
            TradeDirection::Long => exit_price - entry_price,
            TradeDirection::Short => entry_price - exit_price,
        }
    }

    /// Growth factor when exiting at `exit_price`.
    pub fn growth(self, entry_price: f64, exit_price: f64) -> f64 {
        match self {
            TradeDirection::Long => exit_price / entry_price,
            TradeDirection::Short => entry_price / exit_price,
        }
    }

    /// Absolute stop price `distance` away from `reference`, on the losing side.
    pub fn stop_from(self, reference: f64, distance: f64) -> f64 {
        match self {
            TradeDirection::Long => reference - distance,
            TradeDirection::Short => reference + distance,
        }
    }

    /// Absolute target price `distance` away from `reference`, on the winning side.
    pub fn target_from(self, reference: f64, distance: f64) -> f64 {
        match self {
            TradeDirection::Long => reference + distance,
            TradeDirection::Short => reference - distance,
        }
    }

    /// True if `candidate` is strictly more favorable to the trade than
    /// `current` (higher for longs, lower for shorts).
    pub fn is_more_favorable(self, candidate: f64, current: f64) -> bool {
        match self {
            TradeDirection::Long => candidate > current,
            TradeDirection::Short => candidate < current,
        }
    }

    /// The more favorable of two prices.
    pub fn most_favorable(self, a: f64, b: f64) -> f64 {
        match self {
            TradeDirection::Long => a.max(b),
            TradeDirection::Short => a.min(b),
        }
    }
}

/// A value recorded at a bar's time (stop price or risk series point).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimestampedValue {
    pub time: NaiveDateTime,
    pub value: f64,
}

/// The single open position held by the state machine.
///
/// Strategy callbacks only ever see `&Position`; every mutation is applied
/// by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub direction: TradeDirection,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub initial_stop_price: Option<f64>,
    pub cur_stop_price: Option<f64>,
    pub profit_target: Option<f64>,
    pub initial_unit_risk: Option<f64>,
    pub initial_risk_pct: Option<f64>,
    pub cur_risk_pct: Option<f64>,
    pub cur_r_multiple: Option<f64>,
    /// Best price reached in the trade's favor since entry.
    pub max_price_recorded: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub growth: f64,
    /// Bars processed while in the position.
    pub holding_period: usize,
    pub stop_price_series: Option<Vec<TimestampedValue>>,
    pub risk_series: Option<Vec<TimestampedValue>>,
}

impl Position {
    /// A freshly opened position, no stop or target yet.
    pub fn open(direction: TradeDirection, entry_time: NaiveDateTime, entry_price: f64) -> Self {
        Self {
            direction,
            entry_time,
            entry_price,
            initial_stop_price: None,
            cur_stop_price: None,
            profit_target: None,
            initial_unit_risk: None,
            initial_risk_pct: None,
            cur_risk_pct: None,
            cur_r_multiple: None,
            max_price_recorded: entry_price,
            profit: 0.0,
            profit_pct: 0.0,
            growth: 1.0,
            holding_period: 0,
            stop_price_series: None,
            risk_series: None,
        }
    }

    pub fn is_long(&self) -> bool {
        self.direction == TradeDirection::Long
    }

    pub fn is_short(&self) -> bool {
        self.direction == TradeDirection::Short
    }

    /// Push the favorable extreme out using a bar's high (long) or low (short).
    pub fn record_extreme(&mut self, high: f64, low: f64) {
        self.max_price_recorded = match self.direction {
            TradeDirection::Long => self.max_price_recorded.max(high),
            TradeDirection::Short => self.max_price_recorded.min(low),
        };
    }

    /// Establish the initial risk numbers from the current stop.
    pub fn establish_risk(&mut self) {
        if let Some(stop) = self.cur_stop_price {
            let unit_risk = (self.entry_price - stop).abs();
            let risk_pct = unit_risk / self.entry_price * 100.0;
            self.initial_stop_price = Some(stop);
            self.initial_unit_risk = Some(unit_risk);
            self.initial_risk_pct = Some(risk_pct);
            self.cur_risk_pct = Some(risk_pct);
            self.cur_r_multiple = Some(0.0);
        }
    }

    /// Mark the position to `close` and count the bar.
    pub fn mark_to_close(&mut self, close: f64) {
        self.profit = self.direction.profit(self.entry_price, close);
        self.profit_pct = self.profit / self.entry_price * 100.0;
        self.growth = self.direction.growth(self.entry_price, close);

        if let Some(stop) = self.cur_stop_price {
            let unit_risk = match self.direction {
                TradeDirection::Long => close - stop,
                TradeDirection::Short => stop - close,
            };
            self.cur_risk_pct = Some(unit_risk / close * 100.0);
            self.cur_r_multiple = if unit_risk != 0.0 {
                Some(self.profit / unit_risk)
            } else {
                None
            };
        }

        self.holding_period += 1;
    }
}
