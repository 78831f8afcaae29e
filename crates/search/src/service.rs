//! Cache-aside search service.

use std::sync::Arc;

use serde_json::Value;

use ts_cache::SearchCache;
use ts_domain::config::SearchConfig;
use ts_domain::error::Result;
use ts_domain::trace::TraceEvent;
use ts_meili::{SearchEngine, SearchParams};

use crate::parser::parse_query;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Options
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-call search options.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Page size; `None` or a non-positive value falls back to the
    /// configured default, and the configured maximum always caps it.
    pub limit: Option<i64>,
    /// Result offset; negative values clamp to 0.
    pub offset: i64,
    /// Extra engine filter expression, appended after the parsed ones.
    pub filters: Option<String>,
    /// Explicit engine sort, overriding anything parsed from the query.
    pub sort: Option<String>,
    pub use_cache: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: None,
            offset: 0,
            filters: None,
            sort: None,
            use_cache: true,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Service
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Serves paginated queries, consulting the cache before the engine and
/// writing results back on a miss. Returns the engine's raw result
/// object verbatim.
pub struct SearchService {
    engine: Arc<dyn SearchEngine>,
    cache: Arc<dyn SearchCache>,
    config: SearchConfig,
}

impl SearchService {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        cache: Arc<dyn SearchCache>,
        config: SearchConfig,
    ) -> Self {
        Self {
            engine,
            cache,
            config,
        }
    }

    pub async fn search(&self, query: &str, opts: SearchOptions) -> Result<Value> {
        let query = query.trim();

        let mut limit = opts.limit.unwrap_or(self.config.default_limit as i64);
        if limit <= 0 {
            limit = self.config.default_limit as i64;
        }
        let limit = (limit as usize).min(self.config.max_limit);
        let offset = opts.offset.max(0) as usize;

        let parsed = parse_query(query);
        let search_query = parsed.keywords.join(" ");

        // Parsed filters first, then whatever the caller supplied.
        let mut search_filters = parsed.filters;
        if let Some(extra) = opts.filters.filter(|f| !f.is_empty()) {
            search_filters.push(extra);
        }

        // Explicit caller sort wins over the query's `sort:` token.
        let search_sort: Option<Vec<String>> = match opts.sort.filter(|s| !s.is_empty()) {
            Some(sort) => Some(vec![sort]),
            None => match parsed.sort.as_deref() {
                Some("date") => Some(vec!["date:desc".into()]),
                Some("relevance") | None => None,
                Some(other) => Some(vec![other.to_owned()]),
            },
        };

        // Canonical cache key: filters are sorted so equal queries hit
        // the same entry regardless of clause order.
        let mut sorted_filters = search_filters.clone();
        sorted_filters.sort();
        let cache_filters = format!("{sorted_filters:?}:{search_sort:?}");

        let params = SearchParams {
            limit,
            offset,
            filters: (!search_filters.is_empty()).then(|| search_filters.clone()),
            sort: search_sort.clone(),
        };

        TraceEvent::SearchServed {
            query_chars: search_query.chars().count(),
            limit,
            offset,
            cached: opts.use_cache,
        }
        .emit();

        let engine = self.engine.clone();
        let engine_query = search_query.clone();
        let compute = Box::pin(async move { engine.search(&engine_query, params).await });

        if opts.use_cache {
            let parts = [
                ("limit", Some(limit.to_string())),
                ("offset", Some(offset.to_string())),
                ("sort", Some(format!("{search_sort:?}"))),
                ("filters", Some(cache_filters)),
            ];
            self.cache.get_or_compute(&search_query, &parts, compute).await
        } else {
            compute.await
        }
    }
}
