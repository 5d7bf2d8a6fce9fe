//! Append-only file trade log.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use super::recorder::{FillRecord, RecordError, TradeRecorder};

/// File-backed recorder appending two lines per fill: the broker's raw
/// order JSON, then the human-readable fill message.
///
/// Uses `spawn_blocking` to keep file I/O off the async runtime.
pub struct FileRecorder {
    file_path: Arc<PathBuf>,
}

impl FileRecorder {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path: Arc::new(file_path),
        }
    }
}

#[async_trait]
impl TradeRecorder for FileRecorder {
    async fn record_fill(&self, record: &FillRecord) -> Result<(), RecordError> {
        let file_path = Arc::clone(&self.file_path);
        let raw_order = record.raw_order.clone();
        let message = record.fill_message();

        tokio::task::spawn_blocking(move || {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&*file_path)?;
            writeln!(file, "{raw_order}")?;
            writeln!(file, "{message}")?;
            Ok::<(), RecordError>(())
        })
        .await
        .map_err(|e| RecordError::Io(std::io::Error::other(e)))??;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayOrder;
    use crate::orders::OrderId;
    use crate::types::OrderSide;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_appends_raw_order_and_message() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("trade.log");
        let recorder = FileRecorder::new(file_path.clone());

        let order = GatewayOrder {
            id: OrderId::new("abc-123"),
            symbol: "BTC-USD".to_string(),
            side: OrderSide::Sell,
            quantity: dec!(0.5),
            filled_at: Some(Utc::now()),
            filled_avg_price: Some(dec!(21000)),
        };
        let record = FillRecord::from_filled_order(&order).unwrap();

        recorder.record_fill(&record).await.unwrap();
        recorder.record_fill(&record).await.unwrap();

        let contents = std::fs::read_to_string(&file_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("\"abc-123\""));
        assert!(lines[1].contains("order to sell 0.5 BTC-USD was filled"));
    }
}
