//! Property tests for the analysis engine.
//!
//! 1. Final capital equals the product of growths
//! 2. Drawdowns are never positive and the equity curve agrees with the report
//! 3. Win/loss proportions stay in range

use barwalk_core::domain::{ExitReason, Trade, TradeDirection};
use barwalk_runner::analysis::analyze;
use barwalk_runner::equity::{compute_drawdown, compute_equity_curve};
use chrono::NaiveDate;
use proptest::prelude::*;

fn make_trade(growth: f64, rmultiple: Option<f64>) -> Trade {
    let t = NaiveDate::from_ymd_opt(2023, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let entry = 100.0;
    let exit = entry * growth;
    Trade {
        direction: TradeDirection::Long,
        entry_time: t,
        entry_price: entry,
        exit_time: t,
        exit_price: exit,
        exit_reason: ExitReason::ExitRule,
        profit: exit - entry,
        profit_pct: (exit - entry) / entry * 100.0,
        growth,
        holding_period: 2,
        risk_pct: None,
        rmultiple,
        stop_price: None,
        profit_target: None,
        stop_price_series: None,
        risk_series: None,
    }
}

fn arb_trades() -> impl Strategy<Value = Vec<Trade>> {
    prop::collection::vec(
        (0.5..1.8_f64, prop::option::of(-3.0..6.0_f64)),
        0..60,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .map(|(growth, r)| make_trade(growth, r))
            .collect()
    })
}

proptest! {
    #[test]
    fn final_capital_is_product_of_growths(trades in arb_trades(), capital in 1.0..1e6_f64) {
        let report = analyze(capital, &trades).unwrap();
        let expected = trades.iter().fold(capital, |c, t| c * t.growth);
        prop_assert!((report.final_capital - expected).abs() <= expected.abs() * 1e-12);
        prop_assert_eq!(report.total_trades, trades.len());
        prop_assert_eq!(report.bar_count, trades.len() * 2);
    }

    #[test]
    fn drawdown_consistent_with_curves(trades in arb_trades(), capital in 1.0..1e6_f64) {
        let report = analyze(capital, &trades).unwrap();
        let equity = compute_equity_curve(capital, &trades);
        let drawdown = compute_drawdown(capital, &trades);

        prop_assert_eq!(equity.len(), trades.len() + 1);
        prop_assert!(drawdown.iter().all(|&d| d <= 0.0));
        prop_assert!(report.max_drawdown <= 0.0);
        prop_assert!(report.max_drawdown_pct >= -100.0);
        let worst = drawdown.iter().copied().fold(0.0_f64, f64::min);
        prop_assert!((worst - report.max_drawdown).abs() <= capital * 1e-9);
        prop_assert_eq!(*equity.last().unwrap(), report.final_capital);
    }

    #[test]
    fn proportions_in_range(trades in arb_trades()) {
        let report = analyze(1000.0, &trades).unwrap();
        prop_assert!((0.0..=1.0).contains(&report.proportion_profitable));
        prop_assert!((report.percent_profitable - report.proportion_profitable * 100.0).abs() < 1e-9);
        if let Some(pf) = report.profit_factor {
            prop_assert!(pf >= 0.0);
        }
        let with_r = trades.iter().filter(|t| t.rmultiple.is_some()).count();
        prop_assert_eq!(report.expectancy.is_some(), with_r > 0);
        prop_assert_eq!(report.rmultiple_std_dev.is_some(), with_r > 1);
    }
}
