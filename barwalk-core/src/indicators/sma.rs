//! Simple Moving Average of closes.
//!
//! First valid value at index period-1.

use crate::domain::PriceBar;

/// Rolling mean of `close` over `period` bars.
///
/// # Panics
///
/// Panics if `period` is zero.
pub fn sma<B: PriceBar>(bars: &[B], period: usize) -> Vec<f64> {
    assert!(period >= 1, "SMA period must be >= 1");
    let n = bars.len();
    let mut result = vec![f64::NAN; n];
    if n < period {
        return result;
    }

    let mut sum: f64 = bars.iter().take(period).map(|b| b.close()).sum();
    result[period - 1] = sum / period as f64;

    for i in period..n {
        sum += bars[i].close() - bars[i - period].close();
        result[i] = sum / period as f64;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_period_3() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let out = sma(&bars, 3);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_approx(out[2], 2.0, DEFAULT_EPSILON);
        assert_approx(out[3], 3.0, DEFAULT_EPSILON);
        assert_approx(out[4], 4.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_period_1_is_close() {
        let bars = make_bars(&[10.0, 20.0, 15.0]);
        assert_eq!(sma(&bars, 1), vec![10.0, 20.0, 15.0]);
    }

    #[test]
    fn sma_short_series_all_nan() {
        let bars = make_bars(&[1.0, 2.0]);
        assert!(sma(&bars, 5).iter().all(|v| v.is_nan()));
    }

    #[test]
    #[should_panic(expected = "SMA period must be >= 1")]
    fn sma_zero_period_panics() {
        sma(&make_bars(&[1.0]), 0);
    }
}
