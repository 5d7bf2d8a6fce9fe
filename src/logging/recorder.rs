//! Fill records and the recorder trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::gateway::GatewayOrder;
use crate::orders::OrderId;
use crate::types::OrderSide;

/// Error type for trade recording operations
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Immutable record of one confirmed fill. Written once per fill, never
/// mutated or deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct FillRecord {
    pub order_id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    /// Average execution price, when the broker reports one
    pub fill_price: Option<Decimal>,
    pub filled_at: DateTime<Utc>,
    /// The broker's raw order representation, serialized as JSON
    pub raw_order: String,
}

impl FillRecord {
    /// Build a record from a gateway order that has been confirmed filled.
    ///
    /// Errors if the order is not actually filled or cannot be serialized.
    pub fn from_filled_order(order: &GatewayOrder) -> Result<Self, RecordError> {
        let filled_at = order.filled_at.ok_or_else(|| {
            RecordError::Serialization(format!("Order {} has no fill timestamp", order.id))
        })?;
        let raw_order = serde_json::to_string(order)
            .map_err(|e| RecordError::Serialization(e.to_string()))?;

        Ok(Self {
            order_id: order.id.clone(),
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            fill_price: order.filled_avg_price,
            filled_at,
            raw_order,
        })
    }

    /// Human-readable fill message, one line.
    pub fn fill_message(&self) -> String {
        let price = self
            .fill_price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        format!(
            "order to {} {} {} was filled {} at price {}",
            self.side, self.quantity, self.symbol, self.filled_at, price
        )
    }
}

/// Trait for appending fill records to a log backend.
#[async_trait]
pub trait TradeRecorder: Send + Sync {
    /// Append one fill record. Implementations should be non-blocking.
    async fn record_fill(&self, record: &FillRecord) -> Result<(), RecordError>;

    /// Flush any buffered records (optional, default no-op)
    async fn flush(&self) -> Result<(), RecordError> {
        Ok(())
    }
}
