//! Trading Engine
//!
//! `OrderManager` owns the mutable trading state (position tracker and
//! pending-order registry); `TradingAgent` wires the evaluator, sizer,
//! gateway, and trade log into the two scheduled cycles.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::gateway::{GatewayError, OrderGateway, OrderType};
use crate::logging::TradeRecorder;
use crate::market::SnapshotProvider;
use crate::orders::{
    reconcile_once, OrderId, PendingOrder, PendingOrderRegistry, ReconcileOutcome,
};
use crate::position::PositionTracker;
use crate::resilience::RetryPolicy;
use crate::risk::PositionSizer;
use crate::scheduler::CycleDriver;
use crate::strategy::{Decision, EmaBandEvaluator};
use crate::types::OrderSide;

/// Owns the two pieces of shared mutable trading state.
///
/// Passed by `&mut` into whichever job the scheduler is currently running.
/// No ambient/global state, no internal locking; the cooperative scheduler
/// is the synchronization.
#[derive(Debug)]
pub struct OrderManager {
    tracker: PositionTracker,
    registry: PendingOrderRegistry,
}

impl OrderManager {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            tracker: PositionTracker::new(symbol),
            registry: PendingOrderRegistry::new(),
        }
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut PositionTracker {
        &mut self.tracker
    }

    pub fn registry(&self) -> &PendingOrderRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PendingOrderRegistry {
        &mut self.registry
    }
}

/// Outcome of one decision cycle, mainly for tests and logging.
#[derive(Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// An order was submitted and registered
    Submitted { id: OrderId, side: OrderSide },
    /// Conditions did not call for an order
    NoAction,
    /// A signal fired while an earlier order was still unconfirmed; held
    /// until reconciliation settles it
    HeldPendingOrder,
    /// Something went wrong; the cycle was abandoned without touching
    /// position or registry state
    Skipped,
}

/// The long-running agent: evaluates snapshots, submits orders, reconciles
/// fills.
pub struct TradingAgent<G: OrderGateway> {
    symbol: String,
    gateway: Arc<G>,
    snapshots: Box<dyn SnapshotProvider>,
    recorder: Arc<dyn TradeRecorder>,
    evaluator: EmaBandEvaluator,
    sizer: PositionSizer,
    retry: RetryPolicy,
    manager: OrderManager,
}

impl<G: OrderGateway> TradingAgent<G> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        gateway: Arc<G>,
        snapshots: Box<dyn SnapshotProvider>,
        recorder: Arc<dyn TradeRecorder>,
        evaluator: EmaBandEvaluator,
        sizer: PositionSizer,
        retry: RetryPolicy,
    ) -> Self {
        let symbol = symbol.into();
        Self {
            manager: OrderManager::new(symbol.clone()),
            symbol,
            gateway,
            snapshots,
            recorder,
            evaluator,
            sizer,
            retry,
        }
    }

    pub fn manager(&self) -> &OrderManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut OrderManager {
        &mut self.manager
    }

    /// Seed the position tracker from gateway-reported holdings. Call once
    /// at startup, before scheduling begins.
    pub async fn initialize(&mut self) -> Result<(), GatewayError> {
        let positions = self
            .retry
            .retry_read("list_positions", || self.gateway.list_positions())
            .await?;

        let held = positions
            .iter()
            .filter(|p| p.symbol == self.symbol)
            .map(|p| p.quantity)
            .sum::<Decimal>();
        self.manager.tracker_mut().seed(held);
        Ok(())
    }

    /// Run one decision cycle: fetch a snapshot, evaluate, and submit an
    /// order when called for.
    ///
    /// Every failure is local to the cycle: it is logged and the cycle is
    /// skipped, leaving the tracker and registry exactly as they were. The
    /// tracker is never mutated here; only the reconciliation pass applies
    /// fills.
    pub async fn evaluate_cycle(&mut self) -> CycleOutcome {
        let snapshot = match self
            .retry
            .retry_read("latest_snapshot", || self.snapshots.latest(&self.symbol))
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(symbol = %self.symbol, error = %e, "Failed to fetch indicator snapshot");
                return CycleOutcome::Skipped;
            }
        };

        let decision = self
            .evaluator
            .evaluate(&snapshot, self.manager.tracker().position());
        info!(symbol = %self.symbol, decision = %decision, close = %snapshot.close, "Cycle evaluated");

        // An unconfirmed order means the tracked position is provisional:
        // acting on it could buy twice or sell inventory that is already
        // being sold. Hold until reconciliation settles the order.
        if decision != Decision::NoOp && !self.manager.registry().is_empty() {
            info!(
                symbol = %self.symbol,
                pending = self.manager.registry().len(),
                "Signal held while an order is awaiting confirmation"
            );
            return CycleOutcome::HeldPendingOrder;
        }

        match decision {
            Decision::Buy => {
                let account = match self
                    .retry
                    .retry_read("get_account", || self.gateway.get_account())
                    .await
                {
                    Ok(account) => account,
                    Err(e) => {
                        error!(error = %e, "Failed to fetch account before sizing");
                        return CycleOutcome::Skipped;
                    }
                };

                let quantity =
                    match self
                        .sizer
                        .size_entry(account.cash, snapshot.close, snapshot.ema_60)
                    {
                        Ok(quantity) if quantity > Decimal::ZERO => quantity,
                        Ok(quantity) => {
                            warn!(quantity = %quantity, "Sizing produced no tradable quantity; skipping");
                            return CycleOutcome::Skipped;
                        }
                        Err(e) => {
                            warn!(error = %e, "Sizing failed; skipping order submission");
                            return CycleOutcome::Skipped;
                        }
                    };

                self.submit(OrderSide::Buy, quantity).await
            }
            Decision::Sell => {
                let quantity = self.manager.tracker().quantity();
                self.submit(OrderSide::Sell, quantity).await
            }
            Decision::NoOp => CycleOutcome::NoAction,
        }
    }

    /// Submit an order and register it as pending. Submission is not
    /// retried: a resend after an ambiguous failure could double-fill.
    async fn submit(&mut self, side: OrderSide, quantity: Decimal) -> CycleOutcome {
        info!(symbol = %self.symbol, side = %side, quantity = %quantity, "Sending order");

        let order = match self
            .gateway
            .submit_order(&self.symbol, side, quantity, OrderType::Market)
            .await
        {
            Ok(order) => order,
            Err(e) => {
                error!(symbol = %self.symbol, side = %side, error = %e, "Order submission failed");
                return CycleOutcome::Skipped;
            }
        };

        let id = order.id.clone();
        self.manager.registry_mut().insert(PendingOrder::new(
            order.id,
            order.symbol,
            order.side,
            order.quantity,
        ));

        CycleOutcome::Submitted { id, side }
    }

    /// Run one reconciliation pass over the pending orders.
    pub async fn reconcile_cycle(&mut self) -> Vec<ReconcileOutcome> {
        reconcile_once(
            self.gateway.as_ref(),
            &self.retry,
            &mut self.manager,
            self.recorder.as_ref(),
        )
        .await
    }
}

#[async_trait]
impl<G: OrderGateway> CycleDriver for TradingAgent<G> {
    async fn reconcile(&mut self) {
        self.reconcile_cycle().await;
    }

    async fn evaluate(&mut self) {
        self.evaluate_cycle().await;
    }
}
