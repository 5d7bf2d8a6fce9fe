//! Bounded exponential-backoff retries for gateway reads.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::gateway::GatewayError;

/// Retry policy for read operations against the gateway (status polls,
/// account and position queries).
///
/// Submissions are never routed through this policy: re-sending an order
/// whose outcome is unknown risks a duplicate fill, so submission failures
/// are surfaced to the caller and the cycle is skipped.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (0 behaves like 1)
    pub max_attempts: u32,
    /// Delay before the first retry (milliseconds)
    pub initial_delay_ms: u64,
    /// Cap on the computed delay (milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier applied per retry (e.g., 2.0 = doubling)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 250,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let raw = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis((raw as u64).min(self.max_delay_ms))
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or exhausts the attempt budget. Returns the last error on exhaustion.
    pub async fn retry_read<T, F, Fut>(
        &self,
        op_name: &str,
        mut operation: F,
    ) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(op = op_name, attempt, "Gateway read succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        op = op_name,
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Gateway read failed; backing off"
                    );
                    last_error = Some(e);
                    if attempt + 1 < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| GatewayError::Other(format!("{op_name}: no attempts made"))))
    }
}
