//! Realtime listener: forwards live channel messages to the ingest
//! callback.

use std::sync::Arc;

use futures_core::future::BoxFuture;
use futures_util::StreamExt;

use ts_domain::error::Result;
use ts_domain::message::MessageInput;

use crate::client::ChatClient;
use crate::ingest::IngestResult;

/// Async callback invoked for every live message with text.
pub type IngestCallback =
    Arc<dyn Fn(MessageInput) -> BoxFuture<'static, Result<IngestResult>> + Send + Sync>;

/// Subscribes to new-message events and feeds them to the ingest
/// callback. Callback errors are logged and swallowed; one bad message
/// must not end the subscription.
pub struct RealtimeListener {
    client: Arc<dyn ChatClient>,
    callback: IngestCallback,
}

impl RealtimeListener {
    pub fn new(client: Arc<dyn ChatClient>, callback: IngestCallback) -> Self {
        Self { client, callback }
    }

    /// Listen until the client's event stream ends (i.e. it disconnects).
    pub async fn start(&self, channels: &[i64]) -> Result<()> {
        let mut events = self.client.subscribe(channels);
        tracing::info!(channels = channels.len(), "realtime listening started");

        while let Some(msg) = events.next().await {
            let has_text = msg.text.as_deref().is_some_and(|t| !t.is_empty());
            if !has_text {
                continue;
            }

            tracing::debug!(
                chat_id = msg.chat_id,
                msg_id = msg.msg_id,
                "realtime message received"
            );

            if let Err(e) = (self.callback)(msg).await {
                tracing::error!(error = %e, "realtime message error");
            }
        }

        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
