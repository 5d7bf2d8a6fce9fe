//! Cooperative two-cadence scheduler.
//!
//! Runs the reconcile job on a fixed interval and the evaluate job at
//! wall-clock boundaries (top of each minute by default), from a single
//! task. Exactly one job executes at a time and runs to completion before
//! the next is considered, so the jobs can share `&mut` trading state
//! without locks. A job that overruns simply delays the other.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, info};

/// The two operations the scheduler alternates between.
///
/// Implemented by the trading agent; the scheduler itself knows nothing
/// about trading.
#[async_trait]
pub trait CycleDriver {
    /// Short-interval job: poll pending orders and apply fills.
    async fn reconcile(&mut self);

    /// Boundary-aligned job: fetch a snapshot and run the decision cycle.
    async fn evaluate(&mut self);
}

/// Cadence configuration for the two jobs.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Fixed interval between reconcile passes
    pub reconcile_interval: Duration,
    /// Evaluate fires at wall-clock timestamps that are whole multiples of
    /// this period (60s = top of each minute)
    pub evaluate_period: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(10),
            evaluate_period: Duration::from_secs(60),
        }
    }
}

/// Cooperative periodic runner for a [`CycleDriver`].
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: ScheduleConfig,
}

impl Scheduler {
    pub fn new(config: ScheduleConfig) -> Self {
        Self { config }
    }

    /// Next wall-clock instant strictly after `now` that is a whole
    /// multiple of `period` since the Unix epoch.
    pub fn next_boundary(now: DateTime<Utc>, period: Duration) -> DateTime<Utc> {
        let period_secs = period.as_secs().max(1) as i64;
        let next = (now.timestamp().div_euclid(period_secs) + 1) * period_secs;
        // In-range for any sane wall clock; fall back to a plain offset if
        // the timestamp cannot be represented.
        Utc.timestamp_opt(next, 0)
            .single()
            .unwrap_or(now + chrono::Duration::seconds(period_secs))
    }

    /// Run both jobs forever.
    ///
    /// Ordering policy: when the evaluate boundary is due, a reconcile pass
    /// runs immediately before it so the decision cycle sees the freshest
    /// confirmed position; the fixed-interval clock restarts after that
    /// pass.
    pub async fn run<D: CycleDriver>(&self, driver: &mut D) {
        info!(
            reconcile_interval_secs = self.config.reconcile_interval.as_secs(),
            evaluate_period_secs = self.config.evaluate_period.as_secs(),
            "Scheduler started"
        );

        let mut next_reconcile = tokio::time::Instant::now() + self.config.reconcile_interval;
        let mut next_evaluate = Self::next_boundary(Utc::now(), self.config.evaluate_period);

        loop {
            let until_evaluate = (next_evaluate - Utc::now())
                .to_std()
                .unwrap_or(Duration::ZERO);
            let until_reconcile =
                next_reconcile.saturating_duration_since(tokio::time::Instant::now());

            if until_evaluate <= until_reconcile {
                tokio::time::sleep(until_evaluate).await;
                debug!("Evaluate boundary reached; reconciling first");
                driver.reconcile().await;
                driver.evaluate().await;
                next_evaluate = Self::next_boundary(Utc::now(), self.config.evaluate_period);
                next_reconcile = tokio::time::Instant::now() + self.config.reconcile_interval;
            } else {
                tokio::time::sleep(until_reconcile).await;
                driver.reconcile().await;
                next_reconcile = tokio::time::Instant::now() + self.config.reconcile_interval;
            }
        }
    }
}
