//! Validated agent configuration bridging CLI arguments to domain types.

use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::risk::{SizerConfig, SizingMode};
use crate::scheduler::ScheduleConfig;

/// Errors from validating the agent configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Risk fraction must satisfy 0 < r < 1, got {0}")]
    InvalidRiskFraction(Decimal),

    #[error("Symbol must not be empty")]
    EmptySymbol,

    #[error("Interval must be positive: {0}")]
    ZeroInterval(&'static str),
}

/// Everything the agent needs at startup, validated once.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// The single traded symbol (e.g., "BTC-USD")
    pub symbol: String,
    /// Fraction of cash risked per trade
    pub risk_fraction: Decimal,
    /// Entry sizing strategy
    pub sizing: SizingMode,
    /// Seconds between reconciliation passes
    pub reconcile_interval_secs: u64,
    /// Evaluate fires at wall-clock multiples of this many seconds
    pub evaluate_period_secs: u64,
    /// Append-only trade log destination
    pub trade_log: PathBuf,
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.risk_fraction <= Decimal::ZERO || self.risk_fraction >= Decimal::ONE {
            return Err(ConfigError::InvalidRiskFraction(self.risk_fraction));
        }
        if self.reconcile_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("reconcile-interval"));
        }
        if self.evaluate_period_secs == 0 {
            return Err(ConfigError::ZeroInterval("evaluate-period"));
        }
        Ok(())
    }

    pub fn schedule(&self) -> ScheduleConfig {
        ScheduleConfig {
            reconcile_interval: Duration::from_secs(self.reconcile_interval_secs),
            evaluate_period: Duration::from_secs(self.evaluate_period_secs),
        }
    }

    pub fn sizer_config(&self) -> SizerConfig {
        SizerConfig {
            risk_fraction: self.risk_fraction,
            ..SizerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_config() -> AgentConfig {
        AgentConfig {
            symbol: "BTC-USD".to_string(),
            risk_fraction: dec!(0.02),
            sizing: SizingMode::FlatRisk,
            reconcile_interval_secs: 10,
            evaluate_period_secs: 60,
            trade_log: PathBuf::from("trade.log"),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_risk_fraction_bounds() {
        let mut config = base_config();
        config.risk_fraction = dec!(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRiskFraction(_))
        ));

        config.risk_fraction = dec!(1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRiskFraction(_))
        ));
    }

    #[test]
    fn test_empty_symbol_rejected() {
        let mut config = base_config();
        config.symbol = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::EmptySymbol)));
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let mut config = base_config();
        config.reconcile_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroInterval(_))));
    }
}
