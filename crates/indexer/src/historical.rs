//! Resumable, rate-limited historical message producer.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;

use ts_domain::error::{Error, Result};
use ts_domain::message::MessageInput;
use ts_domain::stream::BoxStream;
use ts_domain::trace::TraceEvent;

use crate::client::ChatClient;
use crate::state::StateStore;

/// Called with the running item count after each yielded message.
pub type ProgressCallback = Box<dyn Fn(usize) + Send + Sync>;

/// Lazily yields a channel's messages starting above its checkpoint.
///
/// Reads the checkpoint but never advances it; the orchestrator does
/// that once a batch has actually been accepted by the engine.
pub struct HistoricalSync {
    client: Arc<dyn ChatClient>,
    state: Arc<StateStore>,
    rate_limit_delay: Duration,
}

impl HistoricalSync {
    pub fn new(client: Arc<dyn ChatClient>, state: Arc<StateStore>, rate_limit_delay: f64) -> Self {
        Self {
            client,
            state,
            rate_limit_delay: Duration::from_secs_f64(rate_limit_delay.max(0.0)),
        }
    }

    /// Stream a channel's messages, oldest first, at most `limit` this
    /// run. Flood-wait signals from the client are absorbed here: sleep
    /// the advised interval, then keep reading the same stream. Any
    /// other client error ends the stream after being yielded.
    pub fn sync_channel(
        &self,
        channel_id: i64,
        limit: usize,
        progress: Option<ProgressCallback>,
    ) -> BoxStream<'_, Result<MessageInput>> {
        Box::pin(async_stream::stream! {
            let min_id = self.state.get(channel_id);
            let mut count = 0usize;

            let mut messages = self.client.fetch_messages(channel_id, limit, min_id);
            while let Some(item) = messages.next().await {
                match item {
                    Ok(msg) => {
                        yield Ok(msg);

                        count += 1;
                        if let Some(callback) = &progress {
                            callback(count);
                        }
                        if !self.rate_limit_delay.is_zero() {
                            tokio::time::sleep(self.rate_limit_delay).await;
                        }
                    }
                    Err(Error::FloodWait { seconds }) => {
                        tracing::warn!(channel_id, seconds, "flood wait from chat service");
                        TraceEvent::FloodWait { channel_id, seconds }.emit();
                        tokio::time::sleep(Duration::from_secs(seconds)).await;
                    }
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
