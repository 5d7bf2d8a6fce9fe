//! Core types for pending-order tracking.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::OrderSide;

/// Type-safe order identifier (broker-assigned).
///
/// Newtype wrapper so order ids cannot be mixed up with other strings at
/// compile time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let s: String = id.into();
        debug_assert!(!s.is_empty(), "OrderId cannot be empty");
        if s.is_empty() {
            tracing::warn!("Creating OrderId with empty string - this may cause tracking issues");
        }
        Self(s)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for OrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle states of a tracked order.
///
/// There is no Cancelled/Rejected/Expired state: the broker API in use
/// reports fills only, so an order that never fills stays `Pending` in the
/// registry until an operator intervenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Submitted and accepted by the broker, awaiting fill confirmation
    Pending,
    /// Fill confirmed; the entry is removed from the registry right after
    Filled,
}

impl OrderStatus {
    /// Returns true once no further updates are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Filled => write!(f, "Filled"),
        }
    }
}

/// An order accepted by the broker but not yet confirmed filled.
///
/// Held in memory only; a crash between submission and reconciliation loses
/// track of the in-flight order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    /// Broker-assigned order id
    pub id: OrderId,
    /// Trading symbol (e.g., "BTC-USD")
    pub symbol: String,
    pub side: OrderSide,
    /// Requested quantity
    pub quantity: Decimal,
    /// When the order was submitted
    pub submitted_at: DateTime<Utc>,
    pub status: OrderStatus,
}

impl PendingOrder {
    /// Create a pending entry for a freshly accepted order.
    ///
    /// Stamps `Utc::now()`: submission is a real-world event and the
    /// timestamp is for logging, not strategy logic.
    #[must_use]
    pub fn new(id: OrderId, symbol: String, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            id,
            symbol,
            side,
            quantity,
            submitted_at: Utc::now(),
            status: OrderStatus::Pending,
        }
    }

    /// Transition to `Filled` once the gateway confirms execution.
    pub fn mark_filled(&mut self) {
        self.status = OrderStatus::Filled;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
