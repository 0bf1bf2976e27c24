//! Equity and drawdown curves, one point per trade.
//!
//! Both curves start with the starting capital (resp. zero drawdown) before
//! the first trade, so they have `trades.len() + 1` points.

use barwalk_core::domain::Trade;

/// `[C, C*g1, C*g1*g2, ...]` where `g` is each trade's growth.
pub fn compute_equity_curve(starting_capital: f64, trades: &[Trade]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(trades.len() + 1);
    let mut capital = starting_capital;
    curve.push(capital);
    for trade in trades {
        capital *= trade.growth;
        curve.push(capital);
    }
    curve
}

/// Drawdown (capital minus running peak) aligned with the equity curve.
/// Always <= 0.
pub fn compute_drawdown(starting_capital: f64, trades: &[Trade]) -> Vec<f64> {
    let mut peak = starting_capital;
    compute_equity_curve(starting_capital, trades)
        .into_iter()
        .map(|capital| {
            peak = peak.max(capital);
            capital - peak
        })
        .collect()
}
