//! Usage statistics: search counters and keyword frequencies in Redis.

use redis::AsyncCommands;
use serde::Serialize;

use ts_domain::config::RedisConfig;
use ts_domain::error::Result;

use crate::backend::RedisBackend;

const KEY_PREFIX: &str = "stats";

/// Aggregated usage statistics.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SearchStats {
    pub total_searches: u64,
    /// `(keyword, score)` pairs, most frequent first.
    pub top_keywords: Vec<(String, f64)>,
}

/// Records and reports search usage. Every operation is best-effort:
/// backend failures are logged and never surface to the caller.
pub struct StatsService {
    backend: RedisBackend,
}

impl StatsService {
    pub fn new(cfg: &RedisConfig) -> Result<Self> {
        Ok(Self {
            backend: RedisBackend::new(cfg)?,
        })
    }

    /// Count a search and bump the keyword frequency.
    pub async fn record_search(&self, query: &str) {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return;
        }

        if let Err(e) = self.record_search_inner(&normalized).await {
            tracing::warn!(error = %e, "stats record failed");
        }
    }

    async fn record_search_inner(&self, normalized: &str) -> Result<()> {
        let mut conn = self.backend.connection().await?;
        let _: i64 = self
            .backend
            .run("INCR", conn.incr(format!("{KEY_PREFIX}:total_searches"), 1))
            .await?;
        let _: f64 = self
            .backend
            .run(
                "ZINCRBY",
                conn.zincr(format!("{KEY_PREFIX}:keywords"), normalized, 1.0),
            )
            .await?;
        Ok(())
    }

    /// Current totals and the `top_k` most frequent keywords.
    pub async fn get_stats(&self, top_k: usize) -> SearchStats {
        match self.get_stats_inner(top_k).await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(error = %e, "stats fetch failed");
                SearchStats::default()
            }
        }
    }

    async fn get_stats_inner(&self, top_k: usize) -> Result<SearchStats> {
        let mut conn = self.backend.connection().await?;

        let total: Option<u64> = self
            .backend
            .run("GET", conn.get(format!("{KEY_PREFIX}:total_searches")))
            .await?;

        let top_keywords: Vec<(String, f64)> = self
            .backend
            .run(
                "ZREVRANGE",
                conn.zrevrange_withscores(
                    format!("{KEY_PREFIX}:keywords"),
                    0,
                    top_k as isize - 1,
                ),
            )
            .await?;

        Ok(SearchStats {
            total_searches: total.unwrap_or(0),
            top_keywords,
        })
    }
}
