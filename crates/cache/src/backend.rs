//! Shared lazy Redis connection used by the cache and stats services.

use std::time::Duration;

use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;

use ts_domain::config::RedisConfig;
use ts_domain::error::{Error, Result};

/// Lazily connected Redis handle. The first operation establishes the
/// connection; the manager reconnects with exponential back-off after
/// that, so a flaky backend never wedges the caller.
pub(crate) struct RedisBackend {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
    retries: usize,
    op_timeout: Duration,
}

impl RedisBackend {
    pub(crate) fn new(cfg: &RedisConfig) -> Result<Self> {
        let client =
            redis::Client::open(cfg.url()).map_err(|e| Error::Cache(e.to_string()))?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
            retries: cfg.max_retries as usize,
            op_timeout: Duration::from_secs(cfg.socket_timeout),
        })
    }

    pub(crate) async fn connection(&self) -> Result<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                ConnectionManager::new_with_backoff(self.client.clone(), 2, 100, self.retries)
                    .await
                    .map_err(|e| Error::Cache(e.to_string()))
            })
            .await?;
        Ok(conn.clone())
    }

    /// Run a Redis operation under the configured per-op timeout.
    pub(crate) async fn run<T>(
        &self,
        what: &str,
        op: impl std::future::Future<Output = redis::RedisResult<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .map_err(|_| Error::Timeout(format!("redis {what}")))?
            .map_err(|e| Error::Cache(e.to_string()))
    }
}
