//! EMA band entry/exit rules.
//!
//! Entries trigger when the bar's low dips into the support band between
//! the 60- and 30-period EMAs while the longer trend (365 EMA and the
//! higher-timeframe filter) is still up. Exits trigger when the close
//! breaks below the 60 EMA.

use rust_decimal::Decimal;
use tracing::{debug, info};

use super::{Decision, HtfFilter};
use crate::position::Position;
use crate::types::{IndicatorSnapshot, TradeDirection};

/// Pure evaluator: snapshot + current position in, decision out.
pub struct EmaBandEvaluator {
    htf_filter: Box<dyn HtfFilter>,
}

impl EmaBandEvaluator {
    pub fn new(htf_filter: Box<dyn HtfFilter>) -> Self {
        Self { htf_filter }
    }

    /// Evaluate one cycle. The buy check runs before the sell check; each
    /// is gated by the current position, and a signal that fires against
    /// the wrong position state is a logged no-op rather than an error.
    pub fn evaluate(&self, snapshot: &IndicatorSnapshot, position: &Position) -> Decision {
        if self.entry_conditions(snapshot) {
            if position.quantity.is_zero() {
                return Decision::Buy;
            }
            info!(
                symbol = %position.symbol,
                quantity = %position.quantity,
                "Buy conditions met but already in position, nothing to do"
            );
        }

        if Self::exit_conditions(snapshot) {
            if position.quantity > Decimal::ZERO {
                return Decision::Sell;
            }
            info!(symbol = %position.symbol, "Sell conditions met but nothing to sell");
        }

        Decision::NoOp
    }

    /// Low strictly inside the 60/30 EMA support band.
    fn in_support_band(snapshot: &IndicatorSnapshot) -> bool {
        snapshot.ema_60 < snapshot.low && snapshot.low < snapshot.ema_30
    }

    fn entry_conditions(&self, snapshot: &IndicatorSnapshot) -> bool {
        if !Self::in_support_band(snapshot) {
            return false;
        }
        if snapshot.low <= snapshot.ema_365 {
            return false;
        }
        if !self.htf_filter.confirm(snapshot) {
            debug!(filter = self.htf_filter.name(), "Entry vetoed by higher-timeframe filter");
            return false;
        }
        true
    }

    fn exit_conditions(snapshot: &IndicatorSnapshot) -> bool {
        snapshot.close < snapshot.ema_60
    }
}

/// Ratio of the realized move to the initial risk distance, as an absolute
/// value.
///
/// Long:  (close − entry) / (entry − stop).
/// Short: (entry − close) / (stop − entry).
///
/// Returns `None` when the risk distance is zero. Intended for gating exits
/// on a minimum profit-to-risk ratio; the current exit rules do not use it
/// yet.
pub fn profit_coefficient(
    close: Decimal,
    entry_price: Decimal,
    stop_price: Decimal,
    direction: TradeDirection,
) -> Option<Decimal> {
    let (move_made, risk_distance) = match direction {
        TradeDirection::Long => (close - entry_price, entry_price - stop_price),
        TradeDirection::Short => (entry_price - close, stop_price - entry_price),
    };
    move_made.checked_div(risk_distance).map(|ratio| ratio.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::AlwaysConfirm;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    struct NeverConfirm;

    impl HtfFilter for NeverConfirm {
        fn confirm(&self, _snapshot: &IndicatorSnapshot) -> bool {
            false
        }
    }

    fn snapshot(close: Decimal, low: Decimal) -> IndicatorSnapshot {
        IndicatorSnapshot {
            timestamp: Utc::now(),
            close,
            high: close + dec!(100),
            low,
            macd_histogram: dec!(0),
            ema_30: dec!(20500),
            ema_60: dec!(20000),
            ema_365: dec!(18000),
        }
    }

    fn flat() -> Position {
        Position {
            symbol: "BTC-USD".to_string(),
            quantity: dec!(0),
        }
    }

    fn long(quantity: Decimal) -> Position {
        Position {
            symbol: "BTC-USD".to_string(),
            quantity,
        }
    }

    fn evaluator() -> EmaBandEvaluator {
        EmaBandEvaluator::new(Box::new(AlwaysConfirm))
    }

    #[test]
    fn test_buy_when_low_in_band_and_flat() {
        // low between ema_60 (20000) and ema_30 (20500), above ema_365
        let decision = evaluator().evaluate(&snapshot(dec!(20600), dec!(20250)), &flat());
        assert_eq!(decision, Decision::Buy);
    }

    #[test]
    fn test_band_bounds_are_strict() {
        let evaluator = evaluator();
        // low exactly on the 60 EMA: outside the band
        assert_eq!(
            evaluator.evaluate(&snapshot(dec!(20600), dec!(20000)), &flat()),
            Decision::NoOp
        );
        // low exactly on the 30 EMA: outside the band
        assert_eq!(
            evaluator.evaluate(&snapshot(dec!(20600), dec!(20500)), &flat()),
            Decision::NoOp
        );
    }

    #[test]
    fn test_no_buy_below_long_trend_ema() {
        let mut s = snapshot(dec!(20600), dec!(20250));
        s.ema_365 = dec!(20300);
        assert_eq!(evaluator().evaluate(&s, &flat()), Decision::NoOp);
    }

    #[test]
    fn test_htf_filter_vetoes_entry() {
        let evaluator = EmaBandEvaluator::new(Box::new(NeverConfirm));
        let decision = evaluator.evaluate(&snapshot(dec!(20600), dec!(20250)), &flat());
        assert_eq!(decision, Decision::NoOp);
    }

    #[test]
    fn test_buy_signal_is_noop_while_in_position() {
        let decision = evaluator().evaluate(&snapshot(dec!(20600), dec!(20250)), &long(dec!(0.5)));
        assert_eq!(decision, Decision::NoOp);
    }

    #[test]
    fn test_sell_when_close_below_ema_60() {
        let decision = evaluator().evaluate(&snapshot(dec!(19900), dec!(19800)), &long(dec!(0.5)));
        assert_eq!(decision, Decision::Sell);
    }

    #[test]
    fn test_sell_signal_is_noop_while_flat() {
        let decision = evaluator().evaluate(&snapshot(dec!(19900), dec!(19800)), &flat());
        assert_eq!(decision, Decision::NoOp);
    }

    #[test]
    fn test_close_on_ema_60_does_not_exit() {
        let decision = evaluator().evaluate(&snapshot(dec!(20000), dec!(19900)), &long(dec!(0.5)));
        assert_eq!(decision, Decision::NoOp);
    }

    #[test]
    fn test_profit_coefficient_long() {
        // entry 100, stop 90, close 130: 30 gained over 10 risked
        let coeff =
            profit_coefficient(dec!(130), dec!(100), dec!(90), TradeDirection::Long).unwrap();
        assert_eq!(coeff, dec!(3));
    }

    #[test]
    fn test_profit_coefficient_short() {
        // entry 100, stop 110, close 80: 20 gained over 10 risked
        let coeff =
            profit_coefficient(dec!(80), dec!(100), dec!(110), TradeDirection::Short).unwrap();
        assert_eq!(coeff, dec!(2));
    }

    #[test]
    fn test_profit_coefficient_is_absolute() {
        // Losing long still reports a positive ratio
        let coeff =
            profit_coefficient(dec!(95), dec!(100), dec!(90), TradeDirection::Long).unwrap();
        assert_eq!(coeff, dec!(0.5));
    }

    #[test]
    fn test_profit_coefficient_zero_risk_distance() {
        assert!(profit_coefficient(dec!(130), dec!(100), dec!(100), TradeDirection::Long).is_none());
    }
}
