//! Fill reconciliation against the broker.
//!
//! One pass per scheduler tick: poll every pending order, apply confirmed
//! fills to the position tracker, append trade-log entries, and drop the
//! filled orders from the registry. This is the only place position state
//! is mutated.

use rust_decimal::Decimal;
use tracing::{debug, error, info};

use crate::engine::OrderManager;
use crate::gateway::{GatewayError, OrderGateway};
use crate::logging::{FillRecord, TradeRecorder};
use crate::resilience::RetryPolicy;
use crate::types::OrderSide;

use super::types::OrderId;

/// Per-order result of a reconciliation pass.
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// Fill confirmed and applied to the position tracker
    Applied {
        id: OrderId,
        side: OrderSide,
        quantity: Decimal,
    },
    /// Broker has not filled the order yet; left in the registry
    StillPending(OrderId),
    /// Status poll failed; the order stays in the registry for the next
    /// pass
    Failed { id: OrderId, error: GatewayError },
}

/// Run one reconciliation pass.
///
/// Orders are visited in submission order. An error on one order never
/// blocks the rest of the pass; each order's outcome is collected and
/// returned. An empty registry is a no-op.
///
/// Orders the broker never fills stay in the registry indefinitely: there
/// is no expiry or cancellation policy yet, and none is invented here.
pub async fn reconcile_once<G: OrderGateway>(
    gateway: &G,
    retry: &RetryPolicy,
    manager: &mut OrderManager,
    recorder: &dyn TradeRecorder,
) -> Vec<ReconcileOutcome> {
    let ids = manager.registry().ids();
    if ids.is_empty() {
        return Vec::new();
    }
    debug!(pending = ids.len(), "Checking order status");

    let mut outcomes = Vec::with_capacity(ids.len());
    let mut filled_ids = Vec::new();

    for id in ids {
        let order = match retry
            .retry_read("get_order", || gateway.get_order(&id))
            .await
        {
            Ok(order) => order,
            Err(e) => {
                error!(order_id = %id, error = %e, "Failed to poll order status");
                outcomes.push(ReconcileOutcome::Failed { id, error: e });
                continue;
            }
        };

        if !order.is_filled() {
            debug!(order_id = %id, "Pending order has not been filled yet");
            outcomes.push(ReconcileOutcome::StillPending(id));
            continue;
        }

        match order.side {
            OrderSide::Buy => manager.tracker_mut().apply_buy_fill(order.quantity),
            OrderSide::Sell => manager.tracker_mut().apply_sell_fill(),
        }

        match FillRecord::from_filled_order(&order) {
            Ok(record) => {
                info!(order_id = %id, "{}", record.fill_message());
                if let Err(e) = recorder.record_fill(&record).await {
                    // The fill is already applied; losing the log line must
                    // not leave the order pending and re-apply the fill next
                    // pass.
                    error!(order_id = %id, error = %e, "Failed to append trade log entry");
                }
            }
            Err(e) => {
                error!(order_id = %id, error = %e, "Could not build trade log entry for fill");
            }
        }

        if let Some(entry) = manager.registry_mut().get_mut(&id) {
            entry.mark_filled();
        }
        filled_ids.push(id.clone());
        outcomes.push(ReconcileOutcome::Applied {
            id,
            side: order.side,
            quantity: order.quantity,
        });
    }

    for id in &filled_ids {
        manager.registry_mut().remove(id);
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{FillMode, OrderType, PaperGateway};
    use crate::logging::RecordError;
    use crate::orders::PendingOrder;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    /// Recorder capturing fills in memory.
    #[derive(Default)]
    struct MemoryRecorder {
        records: Mutex<Vec<FillRecord>>,
    }

    #[async_trait]
    impl TradeRecorder for MemoryRecorder {
        async fn record_fill(&self, record: &FillRecord) -> Result<(), RecordError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    async fn submit_and_track(
        gateway: &PaperGateway,
        manager: &mut OrderManager,
        side: OrderSide,
        quantity: Decimal,
    ) -> OrderId {
        let order = gateway
            .submit_order("BTC-USD", side, quantity, OrderType::Market)
            .await
            .unwrap();
        manager.registry_mut().insert(PendingOrder::new(
            order.id.clone(),
            order.symbol,
            order.side,
            order.quantity,
        ));
        order.id
    }

    #[tokio::test]
    async fn test_empty_registry_is_noop() {
        let gateway = PaperGateway::new(dec!(10000), FillMode::Manual);
        let mut manager = OrderManager::new("BTC-USD");
        let recorder = MemoryRecorder::default();

        let outcomes =
            reconcile_once(&gateway, &RetryPolicy::default(), &mut manager, &recorder).await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_buy_fill_applied_and_removed() {
        let gateway = PaperGateway::new(dec!(10000), FillMode::Manual);
        let mut manager = OrderManager::new("BTC-USD");
        let recorder = MemoryRecorder::default();

        let id = submit_and_track(&gateway, &mut manager, OrderSide::Buy, dec!(0.01)).await;
        gateway.fill_order(&id, dec!(20000)).await.unwrap();

        let outcomes =
            reconcile_once(&gateway, &RetryPolicy::default(), &mut manager, &recorder).await;

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], ReconcileOutcome::Applied { .. }));
        assert_eq!(manager.tracker().quantity(), dec!(0.01));
        assert!(manager.registry().is_empty());

        let records = recorder.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quantity, dec!(0.01));
    }

    #[tokio::test]
    async fn test_sell_fill_flattens_position() {
        let gateway = PaperGateway::new(dec!(10000), FillMode::Manual);
        let mut manager = OrderManager::new("BTC-USD");
        let recorder = MemoryRecorder::default();
        manager.tracker_mut().seed(dec!(0.01));

        let id = submit_and_track(&gateway, &mut manager, OrderSide::Sell, dec!(0.01)).await;
        gateway.fill_order(&id, dec!(21000)).await.unwrap();

        reconcile_once(&gateway, &RetryPolicy::default(), &mut manager, &recorder).await;
        assert!(manager.tracker().is_flat());
        assert!(manager.registry().is_empty());
    }

    #[tokio::test]
    async fn test_unfilled_order_left_untouched() {
        let gateway = PaperGateway::new(dec!(10000), FillMode::Manual);
        let mut manager = OrderManager::new("BTC-USD");
        let recorder = MemoryRecorder::default();

        let filled = submit_and_track(&gateway, &mut manager, OrderSide::Buy, dec!(0.01)).await;
        let unfilled = submit_and_track(&gateway, &mut manager, OrderSide::Buy, dec!(0.02)).await;
        gateway.fill_order(&filled, dec!(20000)).await.unwrap();

        let outcomes =
            reconcile_once(&gateway, &RetryPolicy::default(), &mut manager, &recorder).await;

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], ReconcileOutcome::Applied { .. }));
        assert!(matches!(outcomes[1], ReconcileOutcome::StillPending(_)));

        assert_eq!(manager.registry().len(), 1);
        assert!(manager.registry().contains(&unfilled));
        assert!(!manager.registry().contains(&filled));
        assert_eq!(recorder.records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_poll_failure_does_not_block_pass() {
        let gateway = PaperGateway::new(dec!(10000), FillMode::Manual);
        let mut manager = OrderManager::new("BTC-USD");
        let recorder = MemoryRecorder::default();

        // First entry references an order the gateway has never seen, so its
        // poll fails; the second is genuinely filled.
        manager.registry_mut().insert(PendingOrder::new(
            OrderId::new("ghost"),
            "BTC-USD".to_string(),
            OrderSide::Buy,
            dec!(0.01),
        ));
        let real = submit_and_track(&gateway, &mut manager, OrderSide::Buy, dec!(0.03)).await;
        gateway.fill_order(&real, dec!(20000)).await.unwrap();

        let retry = RetryPolicy {
            max_attempts: 1,
            initial_delay_ms: 1,
            max_delay_ms: 1,
            backoff_multiplier: 1.0,
        };
        let outcomes = reconcile_once(&gateway, &retry, &mut manager, &recorder).await;

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], ReconcileOutcome::Failed { .. }));
        assert!(matches!(outcomes[1], ReconcileOutcome::Applied { .. }));

        // The failing order stays for the next pass; the filled one is gone
        assert_eq!(manager.registry().len(), 1);
        assert!(manager.registry().contains(&OrderId::new("ghost")));
        assert_eq!(manager.tracker().quantity(), dec!(0.03));
    }
}
