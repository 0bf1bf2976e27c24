//! Bar loading for the runner: CSV files or a seeded synthetic random walk.
//!
//! CSV rows are validated as they are read so errors point at the offending
//! line rather than surfacing later as an engine failure.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use barwalk_core::domain::{Bar, PriceBar};

use crate::config::DataConfig;

/// Errors from the data loading layer. `line` is the 1-based line in the
/// file, counting the header as line 1.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open { path: PathBuf, source: csv::Error },
    #[error("line {line}: {source}")]
    Row { line: u64, source: csv::Error },
    #[error("line {line}: unrecognized time '{value}'")]
    Time { line: u64, value: String },
    #[error("line {line}: {reason}")]
    Malformed { line: u64, reason: String },
    #[error("{0} contains no bars")]
    Empty(PathBuf),
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// Load the bars described by `data`.
pub fn load_bars(data: &DataConfig) -> Result<Vec<Bar>, LoadError> {
    match data {
        DataConfig::Csv(path) => load_csv_bars(path),
        DataConfig::Synthetic {
            bars,
            seed,
            start_price,
        } => Ok(generate_synthetic_bars(*bars, *seed, *start_price)),
    }
}

/// Read bars from a CSV file with a `time,open,high,low,close,volume` header.
pub fn load_csv_bars(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut bars: Vec<Bar> = Vec::new();
    for (i, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = i as u64 + 2;
        let row = result.map_err(|source| LoadError::Row { line, source })?;
        let time = parse_time(&row.time).ok_or_else(|| LoadError::Time {
            line,
            value: row.time.clone(),
        })?;
        let bar = Bar::new(time, row.open, row.high, row.low, row.close, row.volume);

        if !bar.is_sane() {
            return Err(LoadError::Malformed {
                line,
                reason: format!(
                    "OHLC out of order, non-finite or non-positive (o={}, h={}, l={}, c={})",
                    bar.open, bar.high, bar.low, bar.close
                ),
            });
        }
        if let Some(prev) = bars.last() {
            if bar.time <= prev.time {
                return Err(LoadError::Malformed {
                    line,
                    reason: format!("time {} does not follow {}", bar.time, prev.time),
                });
            }
        }
        bars.push(bar);
    }

    if bars.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    info!(path = %path.display(), bars = bars.len(), "loaded CSV bars");
    Ok(bars)
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD HH:MM:SS`.
pub fn parse_time(value: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Seeded random walk of daily bars starting 2020-01-01.
///
/// Same `(count, seed, start_price)` always yields the same bars.
pub fn generate_synthetic_bars(count: usize, seed: u64, start_price: f64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2020, 1, 1)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN);

    let mut bars = Vec::with_capacity(count);
    let mut price = start_price;
    for i in 0..count {
        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000.0..5_000_000.0_f64).round();

        bars.push(Bar::new(
            start + Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume,
        ));
        price = close;
    }
    bars
}
