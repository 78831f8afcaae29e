use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{env_parse, env_set};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Meilisearch
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeiliConfig {
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "d_index_name")]
    pub index_name: String,
    /// Per-request timeout in seconds.
    #[serde(default = "d_timeout")]
    pub timeout: u64,
    #[serde(default = "d_max_retries")]
    pub max_retries: u32,
}

impl Default for MeiliConfig {
    fn default() -> Self {
        Self {
            host: d_host(),
            api_key: String::new(),
            index_name: d_index_name(),
            timeout: d_timeout(),
            max_retries: d_max_retries(),
        }
    }
}

impl MeiliConfig {
    pub(super) fn overlay(&mut self, get: &impl Fn(&str) -> Option<String>) -> Result<()> {
        env_set(get, "MEILI_HOST", &mut self.host);
        env_set(get, "MEILI_MASTER_KEY", &mut self.api_key);
        env_set(get, "MEILI_INDEX", &mut self.index_name);
        env_parse(get, "MEILI_TIMEOUT", &mut self.timeout)?;
        env_parse(get, "MEILI_MAX_RETRIES", &mut self.max_retries)?;
        Ok(())
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_host() -> String {
    "http://localhost:7700".into()
}
fn d_index_name() -> String {
    "telegram_messages".into()
}
fn d_timeout() -> u64 {
    5
}
fn d_max_retries() -> u32 {
    3
}
