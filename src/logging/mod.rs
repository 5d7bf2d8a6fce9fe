//! Trade Logging
//!
//! Pluggable `TradeRecorder` trait for appending confirmed fills to a
//! durable log, plus the file-backed implementation used by the binary.

mod file_recorder;
mod recorder;

pub use file_recorder::FileRecorder;
pub use recorder::{FillRecord, RecordError, TradeRecorder};
