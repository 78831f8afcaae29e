use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::env_parse;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Indexer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Messages accumulated before each batch ingest.
    #[serde(default = "d_batch_size")]
    pub batch_size: usize,
    /// Pause between fetched messages, in seconds.
    #[serde(default = "d_rate_limit_delay")]
    pub rate_limit_delay: f64,
    /// Minimum seconds between checkpoint writes. 0 persists immediately.
    #[serde(default = "d_state_flush_interval")]
    pub state_flush_interval: f64,
    /// Checkpoint file.
    #[serde(default = "d_state_path")]
    pub state_path: PathBuf,
    /// Channel registry file.
    #[serde(default = "d_channels_path")]
    pub channels_path: PathBuf,
    /// Directory of exported `<channel_id>.json` message files. When set,
    /// the crawler reads channels from these exports instead of a live
    /// connection.
    #[serde(default)]
    pub import_dir: Option<PathBuf>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            batch_size: d_batch_size(),
            rate_limit_delay: d_rate_limit_delay(),
            state_flush_interval: d_state_flush_interval(),
            state_path: d_state_path(),
            channels_path: d_channels_path(),
            import_dir: None,
        }
    }
}

impl IndexerConfig {
    pub(super) fn overlay(&mut self, get: &impl Fn(&str) -> Option<String>) -> Result<()> {
        env_parse(get, "STATE_FLUSH_INTERVAL", &mut self.state_flush_interval)?;
        Ok(())
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_batch_size() -> usize {
    100
}
fn d_rate_limit_delay() -> f64 {
    1.0
}
fn d_state_flush_interval() -> f64 {
    1.0
}
fn d_state_path() -> PathBuf {
    PathBuf::from("state.json")
}
fn d_channels_path() -> PathBuf {
    PathBuf::from("configs/channels.json")
}
