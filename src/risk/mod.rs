//! Position Sizing
//!
//! Computes entry quantities from the account's cash balance and the
//! configured risk fraction. Two sizing formulas exist side by side as
//! named strategies; which one production should standardize on is an
//! open question recorded in DESIGN.md, so neither is hard-wired.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

/// Errors from sizing an order. A sizing failure blocks submission for the
/// cycle; it never propagates NaN/∞ toward the broker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizingError {
    /// The 60 EMA reference is zero, so the risk distance is undefined
    #[error("Reference EMA is zero; risk distance undefined")]
    ZeroReferenceEma,

    /// Close sits exactly on the reference EMA; risking against a zero
    /// distance would size an unbounded position
    #[error("Risk distance is zero")]
    ZeroRiskDistance,

    #[error("Non-positive price: {0}")]
    NonPositivePrice(Decimal),
}

/// Which sizing formula to apply at entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingMode {
    /// Fixed fraction of cash converted to units at the close
    FlatRisk,
    /// Dollar risk scaled by the distance between close and the 60 EMA
    RiskToStop,
}

impl std::str::FromStr for SizingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flat-risk" | "flat" => Ok(Self::FlatRisk),
            "risk-to-stop" | "stop" => Ok(Self::RiskToStop),
            _ => Err(format!(
                "Unknown sizing mode: '{}'. Use 'flat-risk' or 'risk-to-stop'",
                s
            )),
        }
    }
}

impl std::fmt::Display for SizingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FlatRisk => write!(f, "flat-risk"),
            Self::RiskToStop => write!(f, "risk-to-stop"),
        }
    }
}

/// Sizing parameters. Rounding precision is configuration, not a constant
/// buried at the call sites.
#[derive(Debug, Clone)]
pub struct SizerConfig {
    /// Fraction of cash put at risk per trade (0 < r < 1)
    pub risk_fraction: Decimal,
    /// Decimal places for flat-risk quantities
    pub flat_risk_dp: u32,
    /// Decimal places for risk-to-stop quantities
    pub risk_to_stop_dp: u32,
}

impl Default for SizerConfig {
    fn default() -> Self {
        Self {
            risk_fraction: Decimal::new(2, 2), // 0.02
            flat_risk_dp: 4,
            risk_to_stop_dp: 2,
        }
    }
}

/// Entry sizer applying the configured strategy.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    mode: SizingMode,
    config: SizerConfig,
}

impl PositionSizer {
    pub fn new(mode: SizingMode, config: SizerConfig) -> Self {
        Self { mode, config }
    }

    pub fn mode(&self) -> SizingMode {
        self.mode
    }

    /// Size an entry with the configured strategy.
    pub fn size_entry(
        &self,
        cash: Decimal,
        close: Decimal,
        ema_60: Decimal,
    ) -> Result<Decimal, SizingError> {
        let units = match self.mode {
            SizingMode::FlatRisk => self.flat_risk(cash, close)?,
            SizingMode::RiskToStop => self.risk_to_stop(cash, close, ema_60)?,
        };
        debug!(mode = %self.mode, cash = %cash, close = %close, units = %units, "Entry sized");
        Ok(units)
    }

    /// `units = round(cash * risk_fraction / close)`.
    pub fn flat_risk(&self, cash: Decimal, close: Decimal) -> Result<Decimal, SizingError> {
        if close <= Decimal::ZERO {
            return Err(SizingError::NonPositivePrice(close));
        }
        let dollar_risk = cash * self.config.risk_fraction;
        let units = dollar_risk
            .checked_div(close)
            .ok_or(SizingError::NonPositivePrice(close))?;
        Ok(units.round_dp(self.config.flat_risk_dp))
    }

    /// `units = round(dollar_risk / trade_risk / close)` where
    /// `trade_risk = (close − ema_60) / ema_60`.
    pub fn risk_to_stop(
        &self,
        cash: Decimal,
        close: Decimal,
        ema_60: Decimal,
    ) -> Result<Decimal, SizingError> {
        if close <= Decimal::ZERO {
            return Err(SizingError::NonPositivePrice(close));
        }
        if ema_60.is_zero() {
            return Err(SizingError::ZeroReferenceEma);
        }

        let dollar_risk = cash * self.config.risk_fraction;
        let trade_risk = (close - ema_60)
            .checked_div(ema_60)
            .ok_or(SizingError::ZeroReferenceEma)?;
        if trade_risk.is_zero() {
            return Err(SizingError::ZeroRiskDistance);
        }

        let position_dollars = dollar_risk
            .checked_div(trade_risk)
            .ok_or(SizingError::ZeroRiskDistance)?;
        let units = position_dollars
            .checked_div(close)
            .ok_or(SizingError::NonPositivePrice(close))?;
        Ok(units.round_dp(self.config.risk_to_stop_dp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sizer(mode: SizingMode) -> PositionSizer {
        PositionSizer::new(mode, SizerConfig::default())
    }

    #[test]
    fn test_flat_risk_reference_values() {
        // cash 10000 at 2% risk buys 200 dollars of a 20000 close: 0.01 units
        let units = sizer(SizingMode::FlatRisk)
            .flat_risk(dec!(10000), dec!(20000))
            .unwrap();
        assert_eq!(units, dec!(0.01));
    }

    #[test]
    fn test_risk_to_stop_reference_values() {
        // dollar_risk 200, trade_risk (21000-20000)/20000 = 0.05,
        // position 4000 dollars, 4000/21000 rounded to 0.19 units
        let units = sizer(SizingMode::RiskToStop)
            .risk_to_stop(dec!(10000), dec!(21000), dec!(20000))
            .unwrap();
        assert_eq!(units, dec!(0.19));
    }

    #[test]
    fn test_zero_reference_ema_errors() {
        let result = sizer(SizingMode::RiskToStop).risk_to_stop(dec!(10000), dec!(21000), dec!(0));
        assert_eq!(result, Err(SizingError::ZeroReferenceEma));
    }

    #[test]
    fn test_zero_risk_distance_errors() {
        // close exactly on the EMA
        let result =
            sizer(SizingMode::RiskToStop).risk_to_stop(dec!(10000), dec!(20000), dec!(20000));
        assert_eq!(result, Err(SizingError::ZeroRiskDistance));
    }

    #[test]
    fn test_non_positive_price_errors() {
        assert_eq!(
            sizer(SizingMode::FlatRisk).flat_risk(dec!(10000), dec!(0)),
            Err(SizingError::NonPositivePrice(dec!(0)))
        );
        assert_eq!(
            sizer(SizingMode::RiskToStop).risk_to_stop(dec!(10000), dec!(-1), dec!(20000)),
            Err(SizingError::NonPositivePrice(dec!(-1)))
        );
    }

    #[test]
    fn test_size_entry_dispatches_on_mode() {
        let flat = sizer(SizingMode::FlatRisk)
            .size_entry(dec!(10000), dec!(20000), dec!(19000))
            .unwrap();
        assert_eq!(flat, dec!(0.01));

        let stop = sizer(SizingMode::RiskToStop)
            .size_entry(dec!(10000), dec!(21000), dec!(20000))
            .unwrap();
        assert_eq!(stop, dec!(0.19));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("flat-risk".parse::<SizingMode>().unwrap(), SizingMode::FlatRisk);
        assert_eq!("stop".parse::<SizingMode>().unwrap(), SizingMode::RiskToStop);
        assert!("martingale".parse::<SizingMode>().is_err());
    }

    #[test]
    fn test_rounding_precision_is_configurable() {
        let config = SizerConfig {
            flat_risk_dp: 2,
            ..Default::default()
        };
        let sizer = PositionSizer::new(SizingMode::FlatRisk, config);
        // 200 / 30000 = 0.00666..., rounds to 0.01 at 2 dp
        assert_eq!(sizer.flat_risk(dec!(10000), dec!(30000)).unwrap(), dec!(0.01));
    }
}
