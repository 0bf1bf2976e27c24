//! Trade: a completed round-trip, frozen at exit.

use super::position::{TimestampedValue, TradeDirection};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitReason {
    StopLoss,
    ProfitTarget,
    ExitRule,
    /// Still open at the end of the bar sequence.
    Finalize,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop-loss",
            ExitReason::ProfitTarget => "profit-target",
            ExitReason::ExitRule => "exit-rule",
            ExitReason::Finalize => "finalize",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete round-trip trade record: entry → exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub direction: TradeDirection,

    // ── Entry ──
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    // ── Result ──
    pub profit: f64,
    pub profit_pct: f64,
    pub growth: f64,
    pub holding_period: usize,

    // ── Risk ──
    /// Initial risk as a percent of entry price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rmultiple: Option<f64>,
    /// Initial stop price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_target: Option<f64>,

    // ── Recorded series ──
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_price_series: Option<Vec<TimestampedValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_series: Option<Vec<TimestampedValue>>,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.profit < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_trade() -> Trade {
        let day = |d| {
            NaiveDate::from_ymd_opt(2024, 1, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        Trade {
            direction: TradeDirection::Long,
            entry_time: day(5),
            entry_price: 100.0,
            exit_time: day(11),
            exit_price: 110.0,
            exit_reason: ExitReason::ProfitTarget,
            profit: 10.0,
            profit_pct: 10.0,
            growth: 1.1,
            holding_period: 4,
            risk_pct: Some(5.0),
            rmultiple: Some(2.0),
            stop_price: Some(95.0),
            profit_target: Some(110.0),
            stop_price_series: None,
            risk_series: None,
        }
    }

    #[test]
    fn winner_and_loser() {
        let mut trade = sample_trade();
        assert!(trade.is_winner());
        assert!(!trade.is_loser());
        trade.profit = 0.0;
        assert!(!trade.is_winner());
        assert!(!trade.is_loser());
    }

    #[test]
    fn exit_reason_wire_names() {
        for (reason, name) in [
            (ExitReason::StopLoss, "stop-loss"),
            (ExitReason::ProfitTarget, "profit-target"),
            (ExitReason::ExitRule, "exit-rule"),
            (ExitReason::Finalize, "finalize"),
        ] {
            assert_eq!(reason.to_string(), name);
            assert_eq!(serde_json::to_string(&reason).unwrap(), format!("\"{name}\""));
        }
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        assert!(!json.contains("stop_price_series"));
        let deser: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }
}
