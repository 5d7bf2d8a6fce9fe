//! Broker Gateway Abstraction
//!
//! Exchange-agnostic trait for order submission and status polling. The
//! decision and reconciliation code talks only to `OrderGateway`; concrete
//! broker connectivity lives behind it. The crate ships `PaperGateway`, an
//! in-memory simulation used by paper runs and tests.

pub mod paper;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::orders::OrderId;
use crate::types::{AccountSnapshot, OrderSide};

pub use paper::{FillMode, PaperGateway};

/// Errors surfaced by gateway calls.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Transport-level failure talking to the broker or data provider
    #[error("Network error: {0}")]
    Network(String),

    /// Missing or invalid credentials/endpoint configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The broker refused the order (insufficient funds, bad symbol, ...)
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("{0}")]
    Other(String),
}

impl GatewayError {
    /// Whether a retry with backoff can plausibly succeed.
    ///
    /// Rejections and configuration problems are deterministic; repeating
    /// them only delays the surfacing of the real problem.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Other(_))
    }
}

/// Order type forwarded to the broker. The agent only submits market
/// orders; `Limit` is carried for gateway implementations that support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Market => write!(f, "market"),
            Self::Limit => write!(f, "limit"),
        }
    }
}

/// Broker-side view of an order, as returned by submission and status
/// polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    /// Requested quantity
    pub quantity: Decimal,
    /// Set once the broker confirms execution
    pub filled_at: Option<DateTime<Utc>>,
    /// Average execution price, if the broker reports one
    pub filled_avg_price: Option<Decimal>,
}

impl GatewayOrder {
    pub fn is_filled(&self) -> bool {
        self.filled_at.is_some()
    }
}

/// Broker-side view of a held position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayPosition {
    pub symbol: String,
    pub quantity: Decimal,
}

/// Capability trait for the broker connection.
///
/// All calls may fail with `GatewayError`; read operations (status polls,
/// account and position queries) are worth retrying with backoff at the
/// call site, submission failures are surfaced and skipped for the cycle.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit an order. Returns the broker's view including the assigned id.
    async fn submit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        order_type: OrderType,
    ) -> Result<GatewayOrder, GatewayError>;

    /// Poll the current state of a previously submitted order.
    async fn get_order(&self, id: &OrderId) -> Result<GatewayOrder, GatewayError>;

    /// List currently held positions.
    async fn list_positions(&self) -> Result<Vec<GatewayPosition>, GatewayError>;

    /// Fetch the account's cash balance.
    async fn get_account(&self) -> Result<AccountSnapshot, GatewayError>;
}

/// Credentials and endpoint selection for a live gateway connection.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: String,
    pub api_secret: String,
    /// Use the broker's paper/sandbox endpoint
    pub sandbox: bool,
}

impl GatewayConfig {
    /// Build from `BROKER_API_KEY` / `BROKER_API_SECRET` environment
    /// variables (typically loaded from `.env` at startup).
    pub fn from_env() -> Result<Self, GatewayError> {
        let api_key = std::env::var("BROKER_API_KEY").map_err(|_| {
            GatewayError::Configuration("BROKER_API_KEY must be set in environment".to_string())
        })?;
        let api_secret = std::env::var("BROKER_API_SECRET").map_err(|_| {
            GatewayError::Configuration("BROKER_API_SECRET must be set in environment".to_string())
        })?;

        Ok(Self {
            api_key,
            api_secret,
            sandbox: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GatewayError::Network("timeout".into()).is_retryable());
        assert!(GatewayError::Other("mystery".into()).is_retryable());
        assert!(!GatewayError::Configuration("no key".into()).is_retryable());
        assert!(!GatewayError::OrderRejected("insufficient funds".into()).is_retryable());
    }

    #[test]
    fn test_order_type_display() {
        assert_eq!(OrderType::Market.to_string(), "market");
        assert_eq!(OrderType::Limit.to_string(), "limit");
    }
}
