//! The chat-client boundary: an async message iterator plus an
//! event-subscription facility. The MTProto transport itself lives
//! behind this trait; the bundled implementation replays exported
//! channel dumps so the crawler can run against offline data.

use std::path::PathBuf;

use async_trait::async_trait;
use futures_util::stream;

use ts_domain::error::Result;
use ts_domain::message::MessageInput;
use ts_domain::stream::BoxStream;

use crate::import;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Abstraction over the chat service.
///
/// `fetch_messages` may yield `Error::FloodWait` items; consumers are
/// expected to sleep the advised interval and keep reading the same
/// stream.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn connect(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;

    /// Messages of a channel with ids strictly above `min_id`, oldest
    /// first, at most `limit` items (0 means no limit).
    fn fetch_messages(
        &self,
        channel_id: i64,
        limit: usize,
        min_id: i64,
    ) -> BoxStream<'_, Result<MessageInput>>;

    /// Live new-message events for the given channels. The stream ends
    /// when the client disconnects.
    fn subscribe(&self, channels: &[i64]) -> BoxStream<'_, MessageInput>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Import-backed client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Serves channel history from exported `<channel_id>.json` files in a
/// directory. Emits no realtime events.
pub struct ImportChatClient {
    dir: PathBuf,
}

impl ImportChatClient {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn load_channel(&self, channel_id: i64, limit: usize, min_id: i64) -> Vec<MessageInput> {
        let path = self.dir.join(format!("{channel_id}.json"));
        if !path.exists() {
            tracing::warn!(
                channel_id,
                path = %path.display(),
                "no export file for channel"
            );
            return Vec::new();
        }

        let mut messages = match import::import_file(&path) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!(channel_id, error = %e, "export file unreadable");
                return Vec::new();
            }
        };

        messages.retain(|m| m.msg_id > min_id);
        messages.sort_by_key(|m| m.msg_id);
        if limit > 0 {
            messages.truncate(limit);
        }
        messages
    }
}

#[async_trait]
impl ChatClient for ImportChatClient {
    async fn connect(&self) -> Result<()> {
        tracing::info!(dir = %self.dir.display(), "import client ready");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    fn fetch_messages(
        &self,
        channel_id: i64,
        limit: usize,
        min_id: i64,
    ) -> BoxStream<'_, Result<MessageInput>> {
        let messages = self.load_channel(channel_id, limit, min_id);
        Box::pin(stream::iter(messages.into_iter().map(Ok)))
    }

    fn subscribe(&self, _channels: &[i64]) -> BoxStream<'_, MessageInput> {
        Box::pin(stream::empty())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn write_export(dir: &std::path::Path, channel_id: i64, ids: &[i64]) {
        let items: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| {
                serde_json::json!({
                    "chat_id": channel_id,
                    "msg_id": id,
                    "text": format!("message number {id}"),
                    "date": "2024-03-01T10:00:00Z",
                })
            })
            .collect();
        std::fs::write(
            dir.join(format!("{channel_id}.json")),
            serde_json::to_string(&items).unwrap(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn fetch_respects_min_id_limit_and_order() {
        let dir = tempfile::tempdir().unwrap();
        write_export(dir.path(), 10, &[5, 3, 9, 1, 7]);

        let client = ImportChatClient::new(dir.path());
        let got: Vec<i64> = client
            .fetch_messages(10, 2, 3)
            .map(|r| r.unwrap().msg_id)
            .collect()
            .await;

        // ids above 3, ascending, capped at 2
        assert_eq!(got, vec![5, 7]);
    }

    #[tokio::test]
    async fn missing_export_yields_empty_stream() {
        let dir = tempfile::tempdir().unwrap();
        let client = ImportChatClient::new(dir.path());
        let got: Vec<_> = client.fetch_messages(99, 10, 0).collect().await;
        assert!(got.is_empty());
    }
}
