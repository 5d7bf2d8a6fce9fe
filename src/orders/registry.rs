//! In-memory registry of submitted-but-unconfirmed orders.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::types::{OrderId, PendingOrder};

/// Tracks every order that has been accepted by the broker but whose fill
/// has not yet been observed.
///
/// Iteration follows insertion order so a reconciliation pass visits orders
/// deterministically. Not synchronized: the cooperative scheduler guarantees
/// a single job mutates it at a time; parallel schedulers would need to wrap
/// the owning `OrderManager` in a mutex.
#[derive(Debug, Default)]
pub struct PendingOrderRegistry {
    orders: HashMap<OrderId, PendingOrder>,
    /// Insertion order of the keys in `orders`
    sequence: Vec<OrderId>,
}

impl PendingOrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly accepted order.
    ///
    /// Broker ids are unique; if a duplicate id ever shows up the previous
    /// entry is replaced in place and a warning is logged.
    pub fn insert(&mut self, order: PendingOrder) {
        let id = order.id.clone();
        if self.orders.insert(id.clone(), order).is_some() {
            warn!(order_id = %id, "Duplicate order id registered; replacing previous entry");
        } else {
            self.sequence.push(id.clone());
            debug!(order_id = %id, pending = self.sequence.len(), "Order registered");
        }
    }

    /// Remove an order once its fill has been applied.
    pub fn remove(&mut self, id: &OrderId) -> Option<PendingOrder> {
        let removed = self.orders.remove(id);
        if removed.is_some() {
            self.sequence.retain(|known| known != id);
            debug!(order_id = %id, pending = self.sequence.len(), "Order removed from registry");
        }
        removed
    }

    pub fn get(&self, id: &OrderId) -> Option<&PendingOrder> {
        self.orders.get(id)
    }

    pub fn get_mut(&mut self, id: &OrderId) -> Option<&mut PendingOrder> {
        self.orders.get_mut(id)
    }

    pub fn contains(&self, id: &OrderId) -> bool {
        self.orders.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Snapshot of the tracked ids in insertion order.
    ///
    /// The reconciliation pass iterates over this snapshot so it can remove
    /// entries as fills are applied without invalidating its cursor.
    pub fn ids(&self) -> Vec<OrderId> {
        self.sequence.clone()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PendingOrder> {
        self.sequence.iter().filter_map(|id| self.orders.get(id))
    }
}
