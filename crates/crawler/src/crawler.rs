//! The crawler orchestrator: wires producers to the ingest service with
//! batching, one-in-flight ingest serialization, per-channel checkpoint
//! updates, and cooperative shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use ts_domain::config::AppConfig;
use ts_domain::error::Result;
use ts_domain::message::MessageInput;
use ts_domain::trace::TraceEvent;
use ts_indexer::historical::ProgressCallback;
use ts_indexer::realtime::IngestCallback;
use ts_indexer::{
    Channel, ChannelRegistry, ChatClient, HistoricalSync, IngestResult, IngestService,
    RealtimeListener, StateStore,
};
use ts_meili::SearchEngine;
use ts_pipeline::{MessageFilter, DEFAULT_WINDOW_SIZE};

use crate::cli::CrawlMode;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Crawler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Owns the chat client, ingest service, channel registry, and
/// checkpoint store for the lifetime of a crawl.
///
/// The ingest service sits behind a single async mutex: realtime events
/// and historical batches never interleave concurrent engine writes.
pub struct Crawler {
    config: AppConfig,
    client: Arc<dyn ChatClient>,
    engine: Arc<dyn SearchEngine>,
    ingest: Arc<Mutex<IngestService>>,
    registry: ChannelRegistry,
    state: Arc<StateStore>,
    shutdown: Arc<AtomicBool>,
}

impl Crawler {
    pub fn new(
        config: AppConfig,
        client: Arc<dyn ChatClient>,
        engine: Arc<dyn SearchEngine>,
    ) -> Self {
        let ingest = Arc::new(Mutex::new(IngestService::new(
            engine.clone(),
            MessageFilter::new(),
            DEFAULT_WINDOW_SIZE,
        )));
        let registry = ChannelRegistry::load(&config.indexer.channels_path);
        let state = Arc::new(StateStore::open(
            &config.indexer.state_path,
            config.indexer.state_flush_interval,
        ));

        Self {
            config,
            client,
            engine,
            ingest,
            registry,
            state,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Connect the chat client and make sure the index exists with the
    /// expected settings.
    pub async fn setup(&self) -> Result<()> {
        self.client.connect().await?;
        self.engine.create_index().await?;
        self.engine.configure_index(index_settings()).await?;
        tracing::info!("crawler initialized");
        Ok(())
    }

    /// Install SIGINT/SIGTERM handlers that raise the shutdown flag.
    pub fn install_signal_handlers(&self) {
        let flag = self.shutdown.clone();
        tokio::spawn(async move {
            wait_for_termination().await;
            flag.store(true, Ordering::SeqCst);
            tracing::info!("shutdown signal received");
        });
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Run the requested crawl mode to completion.
    pub async fn run(&self, mode: CrawlMode, limit: usize) -> Result<()> {
        match mode {
            CrawlMode::Historical => self.run_historical(limit).await,
            CrawlMode::Realtime => self.run_realtime().await,
            CrawlMode::Both => {
                self.run_historical(limit).await?;
                if !self.shutdown_requested() {
                    self.run_realtime().await?;
                }
                Ok(())
            }
        }
    }

    // ── historical mode ──────────────────────────────────────────────

    /// Backfill every enabled channel, advancing its checkpoint after
    /// each successfully ingested batch. A failed batch stops that
    /// channel without advancing, so the same messages replay next run.
    pub async fn run_historical(&self, limit: usize) -> Result<()> {
        let channels = self.registry.list_channels();
        if channels.is_empty() {
            tracing::warn!("no channels configured");
            return Ok(());
        }

        let sync = HistoricalSync::new(
            self.client.clone(),
            self.state.clone(),
            self.config.indexer.rate_limit_delay,
        );
        let batch_size = self.config.indexer.batch_size.max(1);

        for channel in channels {
            if self.shutdown_requested() {
                tracing::info!("shutdown requested");
                break;
            }
            if !channel.enabled {
                continue;
            }

            tracing::info!(channel = %channel.username, "syncing channel");
            self.sync_one_channel(&sync, &channel, limit, batch_size).await;
        }

        self.state.flush()?;
        Ok(())
    }

    async fn sync_one_channel(
        &self,
        sync: &HistoricalSync,
        channel: &Channel,
        limit: usize,
        batch_size: usize,
    ) {
        let progress_channel = channel.username.clone();
        let progress: ProgressCallback = Box::new(move |current| {
            tracing::debug!(channel = %progress_channel, current, total = limit, "sync progress");
        });

        let mut count = 0usize;
        let mut batch: Vec<MessageInput> = Vec::new();
        let mut last_msg_id: Option<i64> = None;
        let mut failed = false;

        let mut messages = sync.sync_channel(channel.channel_id, limit, Some(progress));
        while let Some(item) = messages.next().await {
            if self.shutdown_requested() {
                tracing::info!("shutdown requested");
                break;
            }

            let msg = match item {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!(
                        channel = %channel.username,
                        error = %e,
                        "history fetch failed, stopping channel"
                    );
                    failed = true;
                    break;
                }
            };

            last_msg_id = Some(last_msg_id.map_or(msg.msg_id, |seen| seen.max(msg.msg_id)));
            batch.push(msg);
            count += 1;

            if batch.len() >= batch_size {
                let ok = self.ingest_batch(channel, &batch, last_msg_id).await;
                batch.clear();
                if !ok {
                    failed = true;
                    break;
                }
            }
        }
        drop(messages);

        if !failed && !self.shutdown_requested() && !batch.is_empty() {
            self.ingest_batch(channel, &batch, last_msg_id).await;
        }

        tracing::info!(channel = %channel.username, messages = count, "channel synced");
    }

    /// Ingest a batch under the ingest lock and advance the checkpoint
    /// on success. Returns false on a fatal (engine) error.
    async fn ingest_batch(
        &self,
        channel: &Channel,
        batch: &[MessageInput],
        last_msg_id: Option<i64>,
    ) -> bool {
        let result = {
            let mut ingest = self.ingest.lock().await;
            ingest.ingest_batch(batch, true).await
        };

        match result {
            Ok(accepted) => {
                TraceEvent::BatchIngested {
                    channel_id: channel.channel_id,
                    submitted: batch.len(),
                    accepted,
                }
                .emit();
                if let Some(last) = last_msg_id {
                    self.state.set(channel.channel_id, last);
                }
                true
            }
            Err(e) => {
                tracing::error!(
                    channel = %channel.username,
                    error = %e,
                    "batch ingest failed, stopping channel"
                );
                false
            }
        }
    }

    // ── realtime mode ────────────────────────────────────────────────

    pub async fn run_realtime(&self) -> Result<()> {
        if self.shutdown_requested() {
            tracing::info!("shutdown requested");
            return Ok(());
        }

        let channels: Vec<i64> = self
            .registry
            .list_channels()
            .into_iter()
            .filter(|c| c.enabled)
            .map(|c| c.channel_id)
            .collect();
        if channels.is_empty() {
            tracing::warn!("no enabled channels configured");
            return Ok(());
        }

        tracing::info!(channels = channels.len(), "starting realtime listener");
        let listener = RealtimeListener::new(self.client.clone(), self.ingest_callback());
        listener.start(&channels).await
    }

    /// Per-event ingest callback; takes the same lock as batch ingest.
    fn ingest_callback(&self) -> IngestCallback {
        let ingest = self.ingest.clone();
        Arc::new(move |msg: MessageInput| {
            let ingest = ingest.clone();
            Box::pin(async move {
                let result = {
                    let mut service = ingest.lock().await;
                    service.ingest_message(&msg).await
                };
                match result {
                    IngestResult::Indexed => {
                        tracing::debug!(msg_id = msg.msg_id, "message indexed")
                    }
                    IngestResult::Skipped => {
                        tracing::debug!(msg_id = msg.msg_id, "message not indexed")
                    }
                    IngestResult::Error => {
                        tracing::warn!(msg_id = msg.msg_id, "message ingest error")
                    }
                }
                Ok(result)
            })
        })
    }

    // ── shutdown ─────────────────────────────────────────────────────

    /// Flush the checkpoint store and disconnect the client. Safe to
    /// call after a failed run; also raises the shutdown flag so any
    /// concurrent loops wind down.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        self.state.flush()?;
        self.client.disconnect().await?;
        tracing::info!("crawler shutdown complete");
        Ok(())
    }

    /// Checkpoint accessor for diagnostics and tests.
    pub fn checkpoint(&self, channel_id: i64) -> i64 {
        self.state.get(channel_id)
    }
}

/// Index settings: what is searchable, filterable, and sortable.
fn index_settings() -> Value {
    json!({
        "searchableAttributes": ["text", "text_norm", "simp", "trad", "pinyin"],
        "filterableAttributes": ["chat_id", "chat_username", "date"],
        "sortableAttributes": ["date"],
    })
}

async fn wait_for_termination() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
