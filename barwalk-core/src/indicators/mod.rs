//! Reference indicators.
//!
//! Pure functions over a bar series. Each returns one value per bar, with NaN
//! for the warmup bars where the window is not yet full. Strategy
//! `prep_indicators` hooks compute these once before the bar loop and attach
//! them to bars by name.

pub mod atr;
pub mod channel;
pub mod sma;

pub use atr::{atr, true_range, wilder_smooth};
pub use channel::{highest_high, lowest_low};
pub use sma::sma;

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                base + chrono::Duration::days(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
