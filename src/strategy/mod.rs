//! Signal evaluation for the EMA band strategy.

pub mod ema_band;

use crate::types::IndicatorSnapshot;

pub use ema_band::{profit_coefficient, EmaBandEvaluator};

/// Outcome of one evaluation cycle.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Decision {
    Buy,
    Sell,
    NoOp,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
            Self::NoOp => write!(f, "no-op"),
        }
    }
}

/// Higher-timeframe confirmation predicate for entries.
///
/// Pluggable so the entry rules don't change when a real higher-timeframe
/// check replaces the stub.
pub trait HtfFilter: Send + Sync {
    fn confirm(&self, snapshot: &IndicatorSnapshot) -> bool;

    fn name(&self) -> &'static str {
        "htf-filter"
    }
}

/// Stub confirmation that always passes.
// TODO: replace with an HtfFilter that fetches the higher-timeframe series
// and requires the current low to sit above all of its EMAs.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl HtfFilter for AlwaysConfirm {
    fn confirm(&self, _snapshot: &IndicatorSnapshot) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "always-confirm"
    }
}
