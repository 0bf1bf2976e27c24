//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR uses Wilder smoothing (EMA with alpha = 1/period), seeded with the mean
//! of the first `period` true ranges that have a previous close.
//! First valid value at index `period`.

use crate::domain::PriceBar;

/// True Range series.
/// TR[0] = high[0] - low[0] (no previous close).
pub fn true_range<B: PriceBar>(bars: &[B]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let range = bar.high() - bar.low();
        if i == 0 {
            tr.push(range);
            continue;
        }
        let pc = bars[i - 1].close();
        tr.push(range.max((bar.high() - pc).abs()).max((bar.low() - pc).abs()));
    }
    tr
}

/// Wilder smoothing. Leading NaNs are skipped; the seed is the mean of the
/// first `period` non-NaN values. A zero period yields all NaN.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 {
        return result;
    }
    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return result;
    };
    let seed_end = start + period;
    if seed_end > n {
        return result;
    }

    let mut prev = values[start..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = prev;

    let alpha = 1.0 / period as f64;
    for i in seed_end..n {
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }
    result
}

/// Wilder ATR over `period` bars.
///
/// # Panics
///
/// Panics if `period` is zero.
pub fn atr<B: PriceBar>(bars: &[B], period: usize) -> Vec<f64> {
    assert!(period >= 1, "ATR period must be >= 1");
    let mut tr = true_range(bars);
    // TR[0] has no previous close; start the seed from TR[1].
    if let Some(first) = tr.first_mut() {
        *first = f64::NAN;
    }
    wilder_smooth(&tr, period)
}
