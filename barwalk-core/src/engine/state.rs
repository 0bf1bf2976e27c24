//! Run options and position status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Options for a single backtest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestOptions {
    /// Record the stop price on every bar while in a position.
    pub record_stop_price: bool,
    /// Record the current risk percent on every bar while in a position.
    pub record_risk: bool,
}

impl BacktestOptions {
    pub fn recording_all() -> Self {
        Self {
            record_stop_price: true,
            record_risk: true,
        }
    }
}

/// Where the state machine is in the trade cycle.
///
/// `None → Enter → Position → (Exit →) None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionStatus {
    /// Flat, waiting for an entry signal.
    None,
    /// Entry signalled, waiting for the next bar (or the conditional price).
    Enter,
    /// In a position.
    Position,
    /// Exit deferred to the next bar's open.
    Exit,
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PositionStatus::None => "none",
            PositionStatus::Enter => "enter",
            PositionStatus::Position => "position",
            PositionStatus::Exit => "exit",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_to_no_recording() {
        let options = BacktestOptions::default();
        assert!(!options.record_stop_price);
        assert!(!options.record_risk);
    }

    #[test]
    fn options_deserialize_partial() {
        let options: BacktestOptions = serde_json::from_str(r#"{"record_risk": true}"#).unwrap();
        assert!(options.record_risk);
        assert!(!options.record_stop_price);
    }
}
