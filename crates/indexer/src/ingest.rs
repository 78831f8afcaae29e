//! Ingest service: transforms, filters, and deduplicates messages
//! before handing them to the search engine.

use std::sync::Arc;

use serde_json::Value;

use ts_domain::error::Result;
use ts_domain::message::MessageInput;
use ts_meili::SearchEngine;
use ts_pipeline::filters::{MessageFilter, DEFAULT_MIN_LEN};
use ts_pipeline::window::DedupWindow;
use ts_pipeline::{is_duplicate, transform, DUPLICATE_THRESHOLD};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-message outcome of an ingest call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestResult {
    Indexed,
    Skipped,
    Error,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Service
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Feeds documents into the search index.
///
/// Not internally synchronized: the orchestrator serializes every
/// `ingest_*` call behind one lock, which is also what keeps realtime
/// events and historical batches from interleaving engine writes.
pub struct IngestService {
    engine: Arc<dyn SearchEngine>,
    filter: MessageFilter,
    window: DedupWindow,
}

impl IngestService {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        filter: MessageFilter,
        dedup_window_size: usize,
    ) -> Self {
        Self {
            engine,
            filter,
            window: DedupWindow::new(dedup_window_size),
        }
    }

    /// Whether the fingerprint near-duplicates a recently accepted one.
    fn is_recent_duplicate(&self, simhash: &str) -> bool {
        self.window.contains(simhash)
    }

    /// Ingest a single message. Never propagates an error; engine
    /// failures become [`IngestResult::Error`].
    pub async fn ingest_message(&mut self, input: &MessageInput) -> IngestResult {
        let text_is_blank = input
            .text
            .as_deref()
            .map(|t| t.trim().is_empty())
            .unwrap_or(true);
        if text_is_blank {
            return IngestResult::Skipped;
        }

        let doc = transform(input);

        if !self.filter.apply_all(&doc, DEFAULT_MIN_LEN) {
            return IngestResult::Skipped;
        }
        if self.is_recent_duplicate(&doc.simhash) {
            tracing::debug!(id = %doc.id, "duplicate message skipped");
            return IngestResult::Skipped;
        }

        match self.engine.add_documents(&[doc.to_index_value()]).await {
            Ok(()) => {
                self.window.push(doc.simhash);
                IngestResult::Indexed
            }
            Err(e) => {
                tracing::error!(id = %doc.id, error = %e, "index error");
                IngestResult::Error
            }
        }
    }

    /// Ingest a batch of messages; returns the number indexed.
    ///
    /// Within a batch the earlier of two near-duplicates wins. The whole
    /// surviving set goes to the engine in one call; fingerprints reach
    /// the dedup window only after that call succeeds, so a failed batch
    /// can be replayed and produce the same accept count. On engine
    /// failure the error propagates when `raise_on_error` is set,
    /// otherwise the batch counts as zero.
    pub async fn ingest_batch(
        &mut self,
        inputs: &[MessageInput],
        raise_on_error: bool,
    ) -> Result<usize> {
        let mut docs: Vec<Value> = Vec::new();
        let mut batch_hashes: Vec<String> = Vec::new();

        for input in inputs {
            let text_is_blank = input
                .text
                .as_deref()
                .map(|t| t.trim().is_empty())
                .unwrap_or(true);
            if text_is_blank {
                continue;
            }

            let doc = transform(input);

            if !self.filter.apply_all(&doc, DEFAULT_MIN_LEN) {
                continue;
            }
            if self.is_recent_duplicate(&doc.simhash) {
                tracing::debug!(id = %doc.id, "duplicate message skipped");
                continue;
            }
            let duplicate_in_batch = batch_hashes
                .iter()
                .any(|seen| is_duplicate(&doc.simhash, seen, DUPLICATE_THRESHOLD));
            if duplicate_in_batch {
                tracing::debug!(id = %doc.id, "duplicate message skipped");
                continue;
            }

            docs.push(doc.to_index_value());
            batch_hashes.push(doc.simhash);
        }

        if docs.is_empty() {
            return Ok(0);
        }

        match self.engine.add_documents(&docs).await {
            Ok(()) => {
                for simhash in batch_hashes {
                    self.window.push(simhash);
                }
                Ok(docs.len())
            }
            Err(e) => {
                tracing::error!(count = docs.len(), error = %e, "batch index error");
                if raise_on_error {
                    Err(e)
                } else {
                    Ok(0)
                }
            }
        }
    }

    /// Number of fingerprints currently held by the dedup window.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}
