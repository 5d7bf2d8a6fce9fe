//! Common Types Module
//!
//! Shared types used across the codebase to avoid circular dependencies.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// Direction of a trade, used by the profit-coefficient calculation.
///
/// The agent itself is long-only; `Short` exists so the calculation keeps
/// its sign convention for both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeDirection {
    Long,
    Short,
}

/// One immutable bundle of price and indicator values for an evaluation cycle.
///
/// Indicator computation happens upstream (see `market::SnapshotProvider`);
/// the evaluator only reads the final values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Bar timestamp
    pub timestamp: DateTime<Utc>,
    /// Last close price
    pub close: Decimal,
    /// Last bar high
    pub high: Decimal,
    /// Last bar low
    pub low: Decimal,
    /// MACD histogram value (carried in the snapshot, unused by the
    /// entry/exit rules)
    pub macd_histogram: Decimal,
    /// 30-period EMA of close
    pub ema_30: Decimal,
    /// 60-period EMA of close
    pub ema_60: Decimal,
    /// 365-period EMA of close
    pub ema_365: Decimal,
}

/// Account state read from the gateway before sizing an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Available cash balance
    pub cash: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_side_display() {
        assert_eq!(OrderSide::Buy.to_string(), "buy");
        assert_eq!(OrderSide::Sell.to_string(), "sell");
    }
}
