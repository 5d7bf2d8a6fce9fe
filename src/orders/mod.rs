//! Order Management Module
//!
//! Pending-order lifecycle tracking and fill reconciliation.
//!
//! # Architecture
//!
//! - `PendingOrderRegistry` - insertion-ordered map of unconfirmed orders
//! - `reconciler` - per-tick pass that applies confirmed fills to the
//!   position tracker and trade log
//! - Core types - `OrderId`, `OrderStatus`, `PendingOrder`

pub mod reconciler;
mod registry;
mod types;

pub use reconciler::{reconcile_once, ReconcileOutcome};
pub use registry::PendingOrderRegistry;
pub use types::{OrderId, OrderStatus, PendingOrder};
