//! Position tracking for the single traded symbol.
//!
//! The tracker is the authoritative record of confirmed holdings. It is
//! mutated only by the reconciliation pass when the gateway confirms a fill;
//! order submission never touches it, so a rejected or still-working order
//! can never be mistaken for inventory.

use rust_decimal::Decimal;
use tracing::{info, warn};

/// Current holdings in the traded symbol. Long-only: quantity never goes
/// negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
}

/// Owns the single `Position` instance for the agent's symbol.
///
/// Not synchronized: the cooperative scheduler runs one job at a time, so
/// the tracker is only ever touched by the currently executing job. Callers
/// that move jobs onto separate tasks must add their own locking.
#[derive(Debug)]
pub struct PositionTracker {
    position: Position,
}

impl PositionTracker {
    /// Create a flat tracker for the given symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            position: Position {
                symbol: symbol.into(),
                quantity: Decimal::ZERO,
            },
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn quantity(&self) -> Decimal {
        self.position.quantity
    }

    pub fn is_flat(&self) -> bool {
        self.position.quantity.is_zero()
    }

    /// Seed the tracker from a gateway-reported quantity at startup.
    pub fn seed(&mut self, quantity: Decimal) {
        if quantity < Decimal::ZERO {
            warn!(
                symbol = %self.position.symbol,
                quantity = %quantity,
                "Gateway reported a short position for a long-only tracker; clamping to zero"
            );
            self.position.quantity = Decimal::ZERO;
            return;
        }
        self.position.quantity = quantity;
        info!(
            symbol = %self.position.symbol,
            quantity = %quantity,
            "Position seeded from gateway"
        );
    }

    /// Apply a confirmed buy fill. The filled quantity replaces the tracked
    /// quantity outright; a second concurrently opened position would be
    /// overwritten, which the submission path rules out by never buying
    /// while a position is open.
    pub fn apply_buy_fill(&mut self, filled_quantity: Decimal) {
        let previous = self.position.quantity;
        self.position.quantity = filled_quantity;
        info!(
            symbol = %self.position.symbol,
            previous = %previous,
            quantity = %filled_quantity,
            "Buy fill applied"
        );
    }

    /// Apply a confirmed sell fill, flattening the position.
    pub fn apply_sell_fill(&mut self) {
        let previous = self.position.quantity;
        self.position.quantity = Decimal::ZERO;
        info!(
            symbol = %self.position.symbol,
            previous = %previous,
            "Sell fill applied, position flat"
        );
    }
}
