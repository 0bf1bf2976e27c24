//! Price channel bands: highest high / lowest low over a trailing window.
//!
//! Window includes the current bar. First valid value at index period-1.

use crate::domain::PriceBar;

/// max(high[t-period+1..=t]).
///
/// # Panics
///
/// Panics if `period` is zero.
pub fn highest_high<B: PriceBar>(bars: &[B], period: usize) -> Vec<f64> {
    assert!(period >= 1, "channel period must be >= 1");
    rolling(bars, period, |window| {
        window.iter().map(|b| b.high()).fold(f64::NEG_INFINITY, f64::max)
    })
}

/// min(low[t-period+1..=t]).
///
/// # Panics
///
/// Panics if `period` is zero.
pub fn lowest_low<B: PriceBar>(bars: &[B], period: usize) -> Vec<f64> {
    assert!(period >= 1, "channel period must be >= 1");
    rolling(bars, period, |window| {
        window.iter().map(|b| b.low()).fold(f64::INFINITY, f64::min)
    })
}

fn rolling<B, F>(bars: &[B], period: usize, reduce: F) -> Vec<f64>
where
    F: Fn(&[B]) -> f64,
{
    let mut result = vec![f64::NAN; bars.len()];
    for i in period.saturating_sub(1)..bars.len() {
        result[i] = reduce(&bars[i + 1 - period..=i]);
    }
    result
}
