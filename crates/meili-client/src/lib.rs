//! Search engine client: the `SearchEngine` trait and its Meilisearch
//! REST implementation.

mod rest;

pub use rest::MeiliClient;

use async_trait::async_trait;
use serde_json::Value;

use ts_domain::error::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Search parameters forwarded to the engine.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub limit: usize,
    pub offset: usize,
    pub filters: Option<Vec<String>>,
    pub sort: Option<Vec<String>>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
            filters: None,
            sort: None,
        }
    }
}

/// Abstraction over the full-text engine API surface.
///
/// Implementations may talk to the real REST API or a test double. All
/// methods return `ts_domain::error::Result`.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Create the index if it does not exist, with `id` as primary key.
    async fn create_index(&self) -> Result<()>;

    /// Update index settings (searchable / filterable / sortable fields).
    async fn configure_index(&self, settings: Value) -> Result<()>;

    /// Add documents to the index. A no-op when `docs` is empty.
    async fn add_documents(&self, docs: &[Value]) -> Result<()>;

    /// Search documents; returns the engine's raw result object.
    async fn search(&self, query: &str, params: SearchParams) -> Result<Value>;
}
