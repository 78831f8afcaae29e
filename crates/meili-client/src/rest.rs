//! REST implementation of [`SearchEngine`] against the Meilisearch HTTP
//! API, with automatic retry + exponential back-off on transient
//! (5xx / timeout / connection) failures.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Map, Value};

use ts_domain::config::MeiliConfig;
use ts_domain::error::{Error, Result};
use ts_domain::trace::TraceEvent;

use crate::{SearchEngine, SearchParams};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A REST-based Meilisearch client.
///
/// Created once and reused for the lifetime of the process. The
/// underlying `reqwest::Client` maintains a connection pool.
#[derive(Debug, Clone)]
pub struct MeiliClient {
    http: Client,
    base_url: String,
    api_key: String,
    index_name: String,
    max_retries: u32,
}

impl MeiliClient {
    /// Build a new client from the shared [`MeiliConfig`].
    pub fn new(cfg: &MeiliConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        let base_url = cfg.host.trim_end_matches('/').to_owned();

        Ok(Self {
            http,
            base_url,
            api_key: cfg.api_key.clone(),
            index_name: cfg.index_name.clone(),
            max_retries: cfg.max_retries,
        })
    }

    // ── request helpers ──────────────────────────────────────────────

    /// Decorate a `RequestBuilder` with the master-key header.
    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        if self.api_key.is_empty() {
            rb
        } else {
            rb.bearer_auth(&self.api_key)
        }
    }

    /// Build the full URL for a path like `/indexes/foo/search`.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ── retry engine ─────────────────────────────────────────────────

    /// Execute a request with retry + exponential back-off.
    ///
    /// * Retries on 5xx status codes, timeouts, and connection errors,
    ///   sleeping `2^attempt * 100ms` between attempts.
    /// * Does **not** retry on 4xx (client errors are permanent).
    /// * Emits a `TraceEvent::EngineCall` after every attempt.
    async fn execute_with_retry(
        &self,
        endpoint: &str,
        build_request: impl Fn() -> RequestBuilder,
    ) -> Result<Response> {
        let mut last_err: Option<Error> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                tracing::warn!(
                    endpoint,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "engine request retrying"
                );
                tokio::time::sleep(backoff).await;
            }

            let start = Instant::now();
            let rb = self.decorate(build_request());
            let result = rb.send().await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    TraceEvent::EngineCall {
                        endpoint: endpoint.to_owned(),
                        status,
                        duration_ms,
                    }
                    .emit();

                    if resp.status().is_server_error() {
                        let body = resp.text().await.unwrap_or_default();
                        last_err = Some(Error::Engine(format!(
                            "{endpoint} returned {status}: {body}"
                        )));
                        continue;
                    }

                    if resp.status().is_client_error() {
                        let body = resp.text().await.unwrap_or_default();
                        return Err(Error::Engine(format!(
                            "{endpoint} returned {status}: {body}"
                        )));
                    }

                    return Ok(resp);
                }
                Err(e) => {
                    TraceEvent::EngineCall {
                        endpoint: endpoint.to_owned(),
                        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                        duration_ms,
                    }
                    .emit();

                    last_err = Some(from_reqwest(e));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| Error::Engine(format!("{endpoint}: all retries exhausted"))))
    }
}

/// Build the search request body for the engine.
fn search_body(query: &str, params: &SearchParams) -> Value {
    let mut body = Map::new();
    body.insert("q".into(), json!(query));
    body.insert("limit".into(), json!(params.limit));
    body.insert("offset".into(), json!(params.offset));
    if let Some(filters) = params.filters.as_ref().filter(|f| !f.is_empty()) {
        body.insert("filter".into(), json!(filters));
    }
    if let Some(sort) = params.sort.as_ref().filter(|s| !s.is_empty()) {
        body.insert("sort".into(), json!(sort));
    }
    Value::Object(body)
}

fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl SearchEngine for MeiliClient {
    async fn create_index(&self) -> Result<()> {
        let url = self.url("/indexes");
        let body = json!({ "uid": self.index_name, "primaryKey": "id" });
        self.execute_with_retry("POST /indexes", || self.http.post(&url).json(&body))
            .await?;
        Ok(())
    }

    async fn configure_index(&self, settings: Value) -> Result<()> {
        let url = self.url(&format!("/indexes/{}/settings", self.index_name));
        self.execute_with_retry("PATCH /indexes/:uid/settings", || {
            self.http.patch(&url).json(&settings)
        })
        .await?;
        Ok(())
    }

    async fn add_documents(&self, docs: &[Value]) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }
        let url = self.url(&format!("/indexes/{}/documents", self.index_name));
        self.execute_with_retry("POST /indexes/:uid/documents", || {
            self.http.post(&url).json(&docs)
        })
        .await?;
        Ok(())
    }

    async fn search(&self, query: &str, params: SearchParams) -> Result<Value> {
        let url = self.url(&format!("/indexes/{}/search", self.index_name));
        let body = search_body(query, &params);
        let resp = self
            .execute_with_retry("POST /indexes/:uid/search", || {
                self.http.post(&url).json(&body)
            })
            .await?;

        let raw = resp.text().await.map_err(from_reqwest)?;
        serde_json::from_str(&raw).map_err(|e| {
            Error::Engine(format!("failed to parse search response: {e}: {raw}"))
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_body_minimal() {
        let body = search_body("test", &SearchParams::default());
        assert_eq!(body["q"], "test");
        assert_eq!(body["limit"], 20);
        assert_eq!(body["offset"], 0);
        assert!(body.get("filter").is_none());
        assert!(body.get("sort").is_none());
    }

    #[test]
    fn search_body_with_filters_and_sort() {
        let params = SearchParams {
            limit: 5,
            offset: 10,
            filters: Some(vec!["chat_id = 1".into()]),
            sort: Some(vec!["date:desc".into()]),
        };
        let body = search_body("test", &params);
        assert_eq!(body["limit"], 5);
        assert_eq!(body["offset"], 10);
        assert_eq!(body["filter"][0], "chat_id = 1");
        assert_eq!(body["sort"][0], "date:desc");
    }

    #[test]
    fn empty_filter_list_is_omitted() {
        let params = SearchParams {
            filters: Some(vec![]),
            ..SearchParams::default()
        };
        let body = search_body("test", &params);
        assert!(body.get("filter").is_none());
    }
}
