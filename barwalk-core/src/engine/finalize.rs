//! Trade finalizer: freezes an open position into a `Trade`.
//!
//! Pure function: position + exit event → trade record.

use chrono::NaiveDateTime;

use crate::domain::{ExitReason, Position, Trade};

/// Convert `position` into a completed trade exiting at `exit_price`.
pub fn finalize_position(
    position: &Position,
    exit_time: NaiveDateTime,
    exit_price: f64,
    exit_reason: ExitReason,
) -> Trade {
    let direction = position.direction;
    let profit = direction.profit(position.entry_price, exit_price);

    Trade {
        direction,
        entry_time: position.entry_time,
        entry_price: position.entry_price,
        exit_time,
        exit_price,
        exit_reason,
        profit,
        profit_pct: profit / position.entry_price * 100.0,
        growth: direction.growth(position.entry_price, exit_price),
        holding_period: position.holding_period,
        risk_pct: position.initial_risk_pct,
        rmultiple: position.initial_unit_risk.map(|risk| profit / risk),
        stop_price: position.initial_stop_price,
        profit_target: position.profit_target,
        stop_price_series: position.stop_price_series.clone(),
        risk_series: position.risk_series.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TradeDirection;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn long_trade_profit_and_growth() {
        let pos = Position::open(TradeDirection::Long, day(1), 100.0);
        let trade = finalize_position(&pos, day(5), 120.0, ExitReason::ExitRule);
        assert_eq!(trade.profit, 20.0);
        assert_eq!(trade.profit_pct, 20.0);
        assert_eq!(trade.growth, 1.2);
        assert_eq!(trade.exit_time, day(5));
        assert_eq!(trade.exit_reason, ExitReason::ExitRule);
        assert!(trade.rmultiple.is_none());
        assert!(trade.risk_pct.is_none());
    }

    #[test]
    fn short_trade_profit_and_growth() {
        let pos = Position::open(TradeDirection::Short, day(1), 100.0);
        let trade = finalize_position(&pos, day(2), 80.0, ExitReason::ProfitTarget);
        assert_eq!(trade.profit, 20.0);
        assert_eq!(trade.growth, 1.25);
    }

    #[test]
    fn rmultiple_uses_initial_unit_risk() {
        let mut pos = Position::open(TradeDirection::Long, day(1), 100.0);
        pos.cur_stop_price = Some(96.0);
        pos.establish_risk();
        // Trailing stop moved later; rmultiple still measured against the initial risk.
        pos.cur_stop_price = Some(104.0);
        let trade = finalize_position(&pos, day(3), 104.0, ExitReason::StopLoss);
        assert_eq!(trade.rmultiple, Some(1.0));
        assert_eq!(trade.stop_price, Some(96.0));
        assert_eq!(trade.risk_pct, Some(4.0));
    }

    #[test]
    fn matches_running_profit_at_close() {
        let mut pos = Position::open(TradeDirection::Short, day(1), 50.0);
        pos.mark_to_close(47.5);
        let trade = finalize_position(&pos, day(2), 47.5, ExitReason::ExitRule);
        assert_eq!(trade.profit, pos.profit);
        assert_eq!(trade.growth, pos.growth);
        assert_eq!(trade.holding_period, 1);
    }
}
