//! Result export: JSON and CSV artifacts.
//!
//! - **JSON**: trade list, analysis report, and the full run result
//! - **CSV**: one row per trade for spreadsheets and plotting tools
//!
//! Persisted run results carry a `schema_version`; newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use barwalk_core::domain::Trade;

use crate::analysis::AnalysisReport;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

const TRADE_COLUMNS: [&str; 14] = [
    "direction",
    "entry_time",
    "entry_price",
    "exit_time",
    "exit_price",
    "exit_reason",
    "profit",
    "profit_pct",
    "growth",
    "holding_period",
    "risk_pct",
    "rmultiple",
    "stop_price",
    "profit_target",
];

// ─── CSV ────────────────────────────────────────────────────────────

/// Render trades as CSV. Undefined optional fields are empty cells.
pub fn trades_to_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(TRADE_COLUMNS)?;

    let opt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
    for t in trades {
        wtr.write_record([
            format!("{:?}", t.direction).to_lowercase(),
            t.entry_time.to_string(),
            format!("{:.6}", t.entry_price),
            t.exit_time.to_string(),
            format!("{:.6}", t.exit_price),
            t.exit_reason.to_string(),
            format!("{:.6}", t.profit),
            format!("{:.4}", t.profit_pct),
            format!("{:.6}", t.growth),
            t.holding_period.to_string(),
            opt(t.risk_pct),
            opt(t.rmultiple),
            opt(t.stop_price),
            opt(t.profit_target),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn write_trades_csv(trades: &[Trade], path: &Path) -> Result<()> {
    std::fs::write(path, trades_to_csv(trades)?)
        .with_context(|| format!("failed to write {}", path.display()))
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn write_trades_json(trades: &[Trade], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(trades).context("failed to serialize trades")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

pub fn read_trades_json(path: &Path) -> Result<Vec<Trade>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("invalid trade list in {}", path.display()))
}

pub fn write_report_json(report: &AnalysisReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Deserialize a `BacktestResult`, rejecting unknown schema versions.
pub fn import_result_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one run under `output_dir/<run_id prefix>/`:
/// - `result.json`: the full `BacktestResult`
/// - `trades.json`, `trades.csv`: the trade list
/// - `report.json`: the analysis report
///
/// Returns the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let short_id: String = result.run_id.chars().take(12).collect();
    let dirname = if short_id.is_empty() {
        result.strategy.to_lowercase()
    } else {
        format!("{}_{short_id}", result.strategy.to_lowercase())
    };
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = serde_json::to_string_pretty(result).context("failed to serialize result")?;
    std::fs::write(run_dir.join("result.json"), json)
        .with_context(|| format!("failed to write result.json in {}", run_dir.display()))?;
    write_trades_json(&result.trades, &run_dir.join("trades.json"))?;
    write_trades_csv(&result.trades, &run_dir.join("trades.csv"))?;
    write_report_json(&result.report, &run_dir.join("report.json"))?;

    Ok(run_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, tests::trade};

    #[test]
    fn csv_has_header_and_empty_optionals() {
        let mut with_risk = trade(5.0, 1.05, Some(1.25));
        with_risk.risk_pct = Some(4.0);
        let csv = trades_to_csv(&[with_risk, trade(-2.0, 0.98, None)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], TRADE_COLUMNS.join(","));
        assert!(lines[1].starts_with("long,"));
        assert!(lines[1].contains(",exit-rule,"));
        assert!(lines[1].ends_with(",4.000000,1.250000,,"));
        assert!(lines[2].ends_with(",,,,"));
    }

    #[test]
    fn trades_json_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.json");
        let trades = vec![trade(5.0, 1.05, Some(1.0)), trade(-1.0, 0.99, None)];
        write_trades_json(&trades, &path).unwrap();
        assert_eq!(read_trades_json(&path).unwrap(), trades);
    }

    #[test]
    fn read_missing_trades_has_context() {
        let err = read_trades_json(Path::new("/nonexistent/trades.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn rejects_future_schema_version() {
        let report = analyze(100.0, &[]).unwrap();
        let result = BacktestResult {
            schema_version: SCHEMA_VERSION + 1,
            run_id: "abc".into(),
            strategy: "MA_CROSSOVER".into(),
            trades: vec![],
            report,
            equity_curve: vec![100.0],
            drawdown: vec![0.0],
            bar_count: 0,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(import_result_json(&json).is_err());
    }

    #[test]
    fn save_artifacts_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let trades = vec![trade(5.0, 1.05, Some(1.0))];
        let result = BacktestResult {
            schema_version: SCHEMA_VERSION,
            run_id: "0123456789abcdef".into(),
            strategy: "CHANNEL_BREAKOUT".into(),
            report: analyze(100.0, &trades).unwrap(),
            equity_curve: vec![100.0, 105.0],
            drawdown: vec![0.0, 0.0],
            bar_count: 10,
            trades,
        };
        let run_dir = save_artifacts(&result, dir.path()).unwrap();

        assert!(run_dir.ends_with("channel_breakout_0123456789ab"));
        for name in ["result.json", "trades.json", "trades.csv", "report.json"] {
            assert!(run_dir.join(name).exists(), "missing {name}");
        }
        let json = std::fs::read_to_string(run_dir.join("result.json")).unwrap();
        assert_eq!(import_result_json(&json).unwrap(), result);
    }
}
