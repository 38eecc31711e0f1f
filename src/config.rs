use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Bridge configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Progress broadcast period in milliseconds. 200 ms balances UI
    /// smoothness against polling overhead.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    /// Capacity of the outbound event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_progress_interval_ms() -> u64 {
    200
}

fn default_event_buffer() -> usize {
    100
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: default_progress_interval_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl BridgeConfig {
    /// Load from a JSON file; missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}
