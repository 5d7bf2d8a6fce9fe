//! Market Data Seam
//!
//! The agent consumes precomputed indicator snapshots; fetching bars and
//! computing the EMAs/MACD lives behind `SnapshotProvider` so the core
//! never depends on a particular data vendor or indicator library.

use std::collections::VecDeque;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::gateway::GatewayError;
use crate::types::IndicatorSnapshot;

/// Source of the freshest indicator snapshot for a symbol.
///
/// Communication failures use the same error taxonomy as the broker
/// gateway; callers retry reads with backoff and skip the cycle when the
/// provider stays unreachable.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn latest(&self, symbol: &str) -> Result<IndicatorSnapshot, GatewayError>;
}

/// Replays a fixed sequence of snapshots, one per call.
///
/// Backs the paper-trading mode and tests; errors once the script is
/// exhausted so a runaway loop is visible instead of silently re-trading
/// the last bar.
pub struct ScriptedSnapshots {
    script: Mutex<VecDeque<IndicatorSnapshot>>,
}

impl ScriptedSnapshots {
    pub fn new(snapshots: Vec<IndicatorSnapshot>) -> Self {
        Self {
            script: Mutex::new(snapshots.into()),
        }
    }

    /// Load a JSON array of snapshots from disk.
    pub fn from_json_file(path: &Path) -> Result<Self, GatewayError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Configuration(format!("Cannot read {path:?}: {e}")))?;
        let snapshots: Vec<IndicatorSnapshot> = serde_json::from_str(&contents)
            .map_err(|e| GatewayError::Configuration(format!("Invalid snapshot file: {e}")))?;
        debug!(count = snapshots.len(), ?path, "Snapshot script loaded");
        Ok(Self::new(snapshots))
    }

    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl SnapshotProvider for ScriptedSnapshots {
    async fn latest(&self, _symbol: &str) -> Result<IndicatorSnapshot, GatewayError> {
        self.script
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| GatewayError::Other("Snapshot script exhausted".to_string()))
    }
}
