//! Redis implementation of [`SearchCache`].

use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::Value;

use ts_domain::config::RedisConfig;
use ts_domain::error::Result;

use crate::backend::RedisBackend;
use crate::{cache_key, CacheParts, SearchCache};

/// Search-result cache with TTL, backed by Redis.
pub struct RedisCache {
    backend: RedisBackend,
    ttl: u64,
}

impl RedisCache {
    pub fn new(cfg: &RedisConfig) -> Result<Self> {
        Ok(Self {
            backend: RedisBackend::new(cfg)?,
            ttl: cfg.cache_ttl,
        })
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.backend.connection().await?;
        self.backend.run("GET", conn.get(key)).await
    }

    async fn set_raw(&self, key: &str, payload: String) -> Result<()> {
        let mut conn = self.backend.connection().await?;
        self.backend
            .run("SETEX", conn.set_ex(key, payload, self.ttl))
            .await
    }
}

#[async_trait]
impl SearchCache for RedisCache {
    async fn get(&self, query: &str, parts: &CacheParts<'_>) -> Option<Value> {
        let key = cache_key(query, parts);
        match self.get_raw(&key).await {
            Ok(Some(data)) => match serde_json::from_str(&data) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(error = %e, "cached payload failed to parse, treating as miss");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "cache get failed, treating as miss");
                None
            }
        }
    }

    async fn set(&self, query: &str, parts: &CacheParts<'_>, value: &Value) {
        let key = cache_key(query, parts);
        let payload = match serde_json::to_string(value) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "cache payload failed to serialize, skipping write");
                return;
            }
        };
        if let Err(e) = self.set_raw(&key, payload).await {
            tracing::warn!(error = %e, "cache set failed");
        }
    }
}
