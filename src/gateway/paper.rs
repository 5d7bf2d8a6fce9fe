//! Simulated broker for paper runs and tests.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info};

use async_trait::async_trait;

use super::{GatewayError, GatewayOrder, GatewayPosition, OrderGateway, OrderType};
use crate::orders::OrderId;
use crate::types::{AccountSnapshot, OrderSide};

/// How the paper gateway resolves submitted orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    /// Orders stay unfilled until `fill_order` is called. Used by tests to
    /// exercise the pending/filled transitions explicitly.
    Manual,
    /// Orders report as filled on the first status poll after submission,
    /// at the current mark price if one has been set.
    Immediate,
}

#[derive(Debug, Default)]
struct PaperBook {
    orders: HashMap<OrderId, GatewayOrder>,
    positions: HashMap<String, Decimal>,
    cash: Decimal,
    mark_price: Option<Decimal>,
}

/// In-memory broker simulation.
///
/// Accepts every order, assigns a uuid order id, and tracks cash and
/// positions as fills are applied. Fill timing is controlled by `FillMode`
/// so tests can hold orders pending across reconciliation passes.
pub struct PaperGateway {
    fill_mode: FillMode,
    book: RwLock<PaperBook>,
}

impl PaperGateway {
    pub fn new(starting_cash: Decimal, fill_mode: FillMode) -> Self {
        Self {
            fill_mode,
            book: RwLock::new(PaperBook {
                cash: starting_cash,
                ..Default::default()
            }),
        }
    }

    /// Set the price used for `FillMode::Immediate` fills.
    pub async fn set_mark_price(&self, price: Decimal) {
        let mut book = self.book.write().await;
        book.mark_price = Some(price);
    }

    /// Seed a held position, as if it predated this process.
    pub async fn set_position(&self, symbol: &str, quantity: Decimal) {
        let mut book = self.book.write().await;
        book.positions.insert(symbol.to_string(), quantity);
    }

    /// Confirm execution of a pending order at the given price
    /// (`FillMode::Manual` control surface).
    pub async fn fill_order(&self, id: &OrderId, price: Decimal) -> Result<(), GatewayError> {
        let mut book = self.book.write().await;
        let order = book
            .orders
            .get_mut(id)
            .ok_or_else(|| GatewayError::Other(format!("Unknown order: {id}")))?;
        if order.filled_at.is_some() {
            return Ok(());
        }
        order.filled_at = Some(Utc::now());
        order.filled_avg_price = Some(price);

        let (symbol, side, quantity) = (order.symbol.clone(), order.side, order.quantity);
        Self::settle(&mut book, &symbol, side, quantity, price);
        Ok(())
    }

    fn settle(book: &mut PaperBook, symbol: &str, side: OrderSide, quantity: Decimal, price: Decimal) {
        let held = book.positions.entry(symbol.to_string()).or_insert(Decimal::ZERO);
        match side {
            OrderSide::Buy => {
                *held += quantity;
                book.cash -= quantity * price;
            }
            OrderSide::Sell => {
                *held -= quantity;
                book.cash += quantity * price;
            }
        }
        debug!(symbol, side = %side, quantity = %quantity, price = %price, "Paper fill settled");
    }
}

#[async_trait]
impl OrderGateway for PaperGateway {
    async fn submit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        order_type: OrderType,
    ) -> Result<GatewayOrder, GatewayError> {
        if quantity <= Decimal::ZERO {
            return Err(GatewayError::OrderRejected(format!(
                "Non-positive quantity: {quantity}"
            )));
        }

        let order = GatewayOrder {
            id: OrderId::new(uuid::Uuid::new_v4().to_string()),
            symbol: symbol.to_string(),
            side,
            quantity,
            filled_at: None,
            filled_avg_price: None,
        };

        info!(
            order_id = %order.id,
            symbol,
            side = %side,
            quantity = %quantity,
            order_type = %order_type,
            "Paper order accepted"
        );

        let mut book = self.book.write().await;
        book.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: &OrderId) -> Result<GatewayOrder, GatewayError> {
        let mut book = self.book.write().await;
        let needs_fill = {
            let order = book
                .orders
                .get(id)
                .ok_or_else(|| GatewayError::Other(format!("Unknown order: {id}")))?;
            self.fill_mode == FillMode::Immediate && order.filled_at.is_none()
        };

        if needs_fill {
            let price = book.mark_price;
            let details = book.orders.get_mut(id).map(|order| {
                order.filled_at = Some(Utc::now());
                order.filled_avg_price = price;
                (order.symbol.clone(), order.side, order.quantity)
            });
            if let (Some((symbol, side, quantity)), Some(price)) = (details, price) {
                Self::settle(&mut book, &symbol, side, quantity, price);
            }
        }

        book.orders
            .get(id)
            .cloned()
            .ok_or_else(|| GatewayError::Other(format!("Unknown order: {id}")))
    }

    async fn list_positions(&self) -> Result<Vec<GatewayPosition>, GatewayError> {
        let book = self.book.read().await;
        Ok(book
            .positions
            .iter()
            .filter(|(_, quantity)| !quantity.is_zero())
            .map(|(symbol, quantity)| GatewayPosition {
                symbol: symbol.clone(),
                quantity: *quantity,
            })
            .collect())
    }

    async fn get_account(&self) -> Result<AccountSnapshot, GatewayError> {
        let book = self.book.read().await;
        Ok(AccountSnapshot { cash: book.cash })
    }
}
