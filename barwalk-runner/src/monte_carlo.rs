//! Monte Carlo trade resampling.
//!
//! Draws trades with replacement to build alternative trade sequences, then
//! analyzes each one to see how sensitive the result is to trade order and
//! selection. Deterministic for a given seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use barwalk_core::domain::Trade;

use crate::analysis::{analyze, AnalysisError};

/// Percentile spread of one statistic across Monte Carlo samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileSpread {
    pub p5: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub p95: f64,
}

impl PercentileSpread {
    fn from_values(mut values: Vec<f64>) -> Self {
        values.sort_by(|a, b| a.total_cmp(b));
        Self {
            p5: percentile_sorted(&values, 5.0),
            p25: percentile_sorted(&values, 25.0),
            median: percentile_sorted(&values, 50.0),
            p75: percentile_sorted(&values, 75.0),
            p95: percentile_sorted(&values, 95.0),
        }
    }
}

/// Distribution of outcomes across resampled trade sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub iterations: usize,
    pub profit_pct: PercentileSpread,
    pub max_drawdown_pct: PercentileSpread,
    /// Fraction of samples that finished below the starting capital.
    pub probability_of_loss: f64,
}

/// Resample `trades` with replacement into `iterations` sequences of
/// `sample_size` trades each.
///
/// Returns no samples when `trades` is empty.
pub fn monte_carlo(
    trades: &[Trade],
    iterations: usize,
    sample_size: usize,
    seed: u64,
) -> Vec<Vec<Trade>> {
    if trades.is_empty() {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let samples: Vec<Vec<Trade>> = (0..iterations)
        .map(|_| {
            (0..sample_size)
                .map(|_| trades[rng.gen_range(0..trades.len())].clone())
                .collect()
        })
        .collect();
    debug!(iterations, sample_size, seed, "monte carlo samples drawn");
    samples
}

/// Analyze every sample and summarize the spread of outcomes.
///
/// Returns `Ok(None)` when there are no samples.
pub fn summarize_monte_carlo(
    starting_capital: f64,
    samples: &[Vec<Trade>],
) -> Result<Option<MonteCarloSummary>, AnalysisError> {
    if samples.is_empty() {
        return Ok(None);
    }
    let mut profit_pcts = Vec::with_capacity(samples.len());
    let mut drawdown_pcts = Vec::with_capacity(samples.len());
    for sample in samples {
        let report = analyze(starting_capital, sample)?;
        profit_pcts.push(report.profit_pct);
        drawdown_pcts.push(report.max_drawdown_pct);
    }
    let losses = profit_pcts.iter().filter(|&&p| p < 0.0).count();

    Ok(Some(MonteCarloSummary {
        iterations: samples.len(),
        probability_of_loss: losses as f64 / samples.len() as f64,
        profit_pct: PercentileSpread::from_values(profit_pcts),
        max_drawdown_pct: PercentileSpread::from_values(drawdown_pcts),
    }))
}

/// Linear-interpolated percentile of pre-sorted data.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}
