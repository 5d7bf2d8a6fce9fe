//! CLI configuration layer.

mod config;

pub use config::{AgentConfig, ConfigError};
