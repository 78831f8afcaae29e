use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{env_parse, env_set};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Redis (cache + stats)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default = "d_port")]
    pub port: u16,
    #[serde(default)]
    pub db: i64,
    /// TTL for cached search results, in seconds.
    #[serde(default = "d_cache_ttl")]
    pub cache_ttl: u64,
    /// Per-operation read timeout in seconds.
    #[serde(default = "d_timeout")]
    pub socket_timeout: u64,
    /// Connect timeout in seconds.
    #[serde(default = "d_timeout")]
    pub socket_connect_timeout: u64,
    #[serde(default = "d_max_retries")]
    pub max_retries: u32,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: d_host(),
            port: d_port(),
            db: 0,
            cache_ttl: d_cache_ttl(),
            socket_timeout: d_timeout(),
            socket_connect_timeout: d_timeout(),
            max_retries: d_max_retries(),
        }
    }
}

impl RedisConfig {
    /// Connection URL in the form `redis://host:port/db`.
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }

    pub(super) fn overlay(&mut self, get: &impl Fn(&str) -> Option<String>) -> Result<()> {
        env_set(get, "REDIS_HOST", &mut self.host);
        env_parse(get, "REDIS_PORT", &mut self.port)?;
        env_parse(get, "REDIS_DB", &mut self.db)?;
        env_parse(get, "REDIS_CACHE_TTL", &mut self.cache_ttl)?;
        env_parse(get, "REDIS_SOCKET_TIMEOUT", &mut self.socket_timeout)?;
        env_parse(get, "REDIS_CONNECT_TIMEOUT", &mut self.socket_connect_timeout)?;
        env_parse(get, "REDIS_MAX_RETRIES", &mut self.max_retries)?;
        Ok(())
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_host() -> String {
    "localhost".into()
}
fn d_port() -> u16 {
    6379
}
fn d_cache_ttl() -> u64 {
    3600
}
fn d_timeout() -> u64 {
    5
}
fn d_max_retries() -> u32 {
    3
}
