//! Cache-aside layer for search results, plus lightweight usage
//! statistics. Both are backed by Redis; backend failures are never
//! allowed to break the read path.

mod backend;
mod cache;
mod stats;

pub use cache::RedisCache;
pub use stats::{SearchStats, StatsService};

use async_trait::async_trait;
use futures_core::future::BoxFuture;
use md5::{Digest, Md5};
use serde_json::Value;

use ts_domain::error::Result;
use ts_domain::trace::TraceEvent;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cache key
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Key parts accompanying a cached query: `(name, value)` pairs where a
/// `None` value excludes the part from the key entirely.
pub type CacheParts<'a> = [(&'a str, Option<String>)];

/// Derive the canonical cache key for a query.
///
/// Parts are sorted before hashing so that semantically equal lookups
/// produce the same key regardless of argument order, and keys stay
/// stable across process runs.
pub fn cache_key(query: &str, parts: &CacheParts<'_>) -> String {
    let mut items: Vec<(&str, &str)> = parts
        .iter()
        .filter_map(|(k, v)| v.as_deref().map(|v| (*k, v)))
        .collect();
    items.sort();

    let key_data = format!("{query}:{items:?}");
    format!("search:{}", hex::encode(Md5::digest(key_data.as_bytes())))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cache for raw engine result objects.
///
/// `get`/`set` must swallow backend errors (a broken cache degrades to
/// a miss / best-effort write); compute errors in [`get_or_compute`]
/// propagate to the caller.
#[async_trait]
pub trait SearchCache: Send + Sync {
    /// Cached result for the query, or `None` on miss or backend error.
    async fn get(&self, query: &str, parts: &CacheParts<'_>) -> Option<Value>;

    /// Best-effort write of a result.
    async fn set(&self, query: &str, parts: &CacheParts<'_>, value: &Value);

    /// Cache-aside read: a hit (any cached value, including an empty
    /// object) short-circuits; a miss runs `compute` and persists its
    /// result.
    async fn get_or_compute(
        &self,
        query: &str,
        parts: &CacheParts<'_>,
        compute: BoxFuture<'_, Result<Value>>,
    ) -> Result<Value> {
        if let Some(cached) = self.get(query, parts).await {
            TraceEvent::CacheLookup { hit: true }.emit();
            return Ok(cached);
        }
        TraceEvent::CacheLookup { hit: false }.emit();

        let value = compute.await?;
        self.set(query, parts, &value).await;
        Ok(value)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
