//! Trade analysis: pure functions from a trade list to summary statistics.
//!
//! Capital compounds through each trade's `growth` in order. Drawdown is
//! measured against the running peak of that compounded capital.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use barwalk_core::domain::Trade;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("starting capital must be finite and > 0, got {0}")]
    InvalidCapital(f64),
}

/// Summary statistics for one backtest's trades.
///
/// Optional fields are `None` when their population is empty (no trades with
/// an R-multiple, no losing trades, and so on).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub starting_capital: f64,
    pub final_capital: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub growth: f64,
    pub total_trades: usize,
    /// Sum of every trade's holding period.
    pub bar_count: usize,
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    pub proportion_profitable: f64,
    pub percent_profitable: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectancy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rmultiple_std_dev: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_quality: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_on_account: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_profit_per_trade: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_winning_trade: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_losing_trade: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_risk_pct: Option<f64>,
}

/// Analyze `trades` as if `starting_capital` were compounded through each one.
pub fn analyze(starting_capital: f64, trades: &[Trade]) -> Result<AnalysisReport, AnalysisError> {
    if !starting_capital.is_finite() || starting_capital <= 0.0 {
        return Err(AnalysisError::InvalidCapital(starting_capital));
    }

    let mut capital = starting_capital;
    let mut peak = starting_capital;
    let mut max_drawdown = 0.0_f64;
    let mut max_drawdown_pct = 0.0_f64;
    for trade in trades {
        capital *= trade.growth;
        peak = peak.max(capital);
        let drawdown = capital - peak;
        max_drawdown = max_drawdown.min(drawdown);
        max_drawdown_pct = max_drawdown_pct.min(drawdown / peak * 100.0);
    }

    let profit = capital - starting_capital;
    let profit_pct = profit / starting_capital * 100.0;

    let winners: Vec<f64> = trades.iter().filter(|t| t.is_winner()).map(|t| t.profit).collect();
    let losers: Vec<f64> = trades.iter().filter(|t| t.is_loser()).map(|t| t.profit).collect();
    let proportion_profitable = if trades.is_empty() {
        0.0
    } else {
        winners.len() as f64 / trades.len() as f64
    };

    let profit_factor = if losers.is_empty() {
        None
    } else {
        Some(winners.iter().sum::<f64>() / losers.iter().sum::<f64>().abs())
    };

    let rmultiples: Vec<f64> = trades.iter().filter_map(|t| t.rmultiple).collect();
    let expectancy = mean(&rmultiples);
    let rmultiple_std_dev = sample_std_dev(&rmultiples);
    let system_quality = match (expectancy, rmultiple_std_dev) {
        (Some(e), Some(sd)) if sd != 0.0 => Some(e / sd),
        _ => None,
    };

    let return_on_account = if max_drawdown_pct == 0.0 {
        None
    } else {
        Some(profit_pct / max_drawdown_pct.abs())
    };

    let profits: Vec<f64> = trades.iter().map(|t| t.profit).collect();
    let average_winning_trade = mean(&winners);
    let average_losing_trade = mean(&losers);
    let expected_value = if trades.is_empty() {
        None
    } else {
        Some(
            proportion_profitable * average_winning_trade.unwrap_or(0.0)
                + (1.0 - proportion_profitable) * average_losing_trade.unwrap_or(0.0),
        )
    };

    let max_risk_pct = trades
        .iter()
        .filter_map(|t| t.risk_pct)
        .fold(None, |acc: Option<f64>, r| Some(acc.map_or(r, |m| m.max(r))));

    Ok(AnalysisReport {
        starting_capital,
        final_capital: capital,
        profit,
        profit_pct,
        growth: capital / starting_capital,
        total_trades: trades.len(),
        bar_count: trades.iter().map(|t| t.holding_period).sum(),
        max_drawdown,
        max_drawdown_pct,
        proportion_profitable,
        percent_profitable: proportion_profitable * 100.0,
        profit_factor,
        expectancy,
        rmultiple_std_dev,
        system_quality,
        return_on_account,
        average_profit_per_trade: mean(&profits),
        average_winning_trade,
        average_losing_trade,
        expected_value,
        max_risk_pct,
    })
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 divisor). `None` below two values.
pub(crate) fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}
