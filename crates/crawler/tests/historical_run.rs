//! End-to-end historical crawl: export files in, engine batches out,
//! checkpoints advancing only when batches are accepted.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use ts_crawler::crawler::Crawler;
use ts_domain::config::AppConfig;
use ts_domain::error::{Error, Result};
use ts_indexer::{ChannelRegistry, ChatClient, ImportChatClient};
use ts_meili::{SearchEngine, SearchParams};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Fixtures
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
struct MockEngine {
    batches: Mutex<Vec<Vec<Value>>>,
    fail: AtomicBool,
}

impl MockEngine {
    fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    fn total_docs(&self) -> usize {
        self.batches.lock().iter().map(Vec::len).sum()
    }
}

#[async_trait]
impl SearchEngine for MockEngine {
    async fn create_index(&self) -> Result<()> {
        Ok(())
    }

    async fn configure_index(&self, _settings: Value) -> Result<()> {
        Ok(())
    }

    async fn add_documents(&self, docs: &[Value]) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Engine("injected failure".into()));
        }
        self.batches.lock().push(docs.to_vec());
        Ok(())
    }

    async fn search(&self, _query: &str, _params: SearchParams) -> Result<Value> {
        Ok(serde_json::json!({ "hits": [] }))
    }
}

const TEXTS: [&str; 5] = [
    "Rust ships fearless concurrency",
    "Telegram channels move fast today",
    "Search indexes love structured data",
    "Pinyin romanization helps lookup",
    "Checkpoints advance monotonically here",
];

fn write_export(dir: &Path, channel_id: i64) {
    let items: Vec<Value> = TEXTS
        .iter()
        .enumerate()
        .map(|(i, text)| {
            serde_json::json!({
                "chat_id": channel_id,
                "msg_id": (i + 1) as i64,
                "text": text,
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

fn test_config(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.indexer.batch_size = 2;
    config.indexer.rate_limit_delay = 0.0;
    config.indexer.state_flush_interval = 0.0;
    config.indexer.state_path = root.join("state.json");
    config.indexer.channels_path = root.join("channels.json");
    config.indexer.import_dir = Some(root.join("exports"));
    config
}

fn build_crawler(root: &Path, engine: Arc<MockEngine>) -> Crawler {
    let config = test_config(root);
    let client: Arc<dyn ChatClient> =
        Arc::new(ImportChatClient::new(root.join("exports")));
    Crawler::new(config, client, engine)
}

fn register_channel(root: &Path, channel_id: i64) {
    let registry = ChannelRegistry::load(root.join("channels.json"));
    registry.add_channel(channel_id, "news", "News").unwrap();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn historical_run_batches_and_advances_the_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("exports")).unwrap();
    write_export(&dir.path().join("exports"), 1);
    register_channel(dir.path(), 1);

    let engine = Arc::new(MockEngine::default());
    let crawler = build_crawler(dir.path(), engine.clone());
    crawler.setup().await.unwrap();
    crawler.run_historical(100).await.unwrap();

    // 5 messages at batch_size 2: two full batches plus a partial one.
    assert_eq!(engine.batch_count(), 3);
    assert_eq!(engine.total_docs(), 5);
    assert_eq!(crawler.checkpoint(1), 5);

    // The checkpoint survives on disk.
    let raw = std::fs::read_to_string(dir.path().join("state.json")).unwrap();
    let state: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(state["1"]["last_msg_id"], 5);
}

#[tokio::test]
async fn second_run_resumes_above_the_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("exports")).unwrap();
    write_export(&dir.path().join("exports"), 1);
    register_channel(dir.path(), 1);

    let engine = Arc::new(MockEngine::default());
    {
        let crawler = build_crawler(dir.path(), engine.clone());
        crawler.setup().await.unwrap();
        crawler.run_historical(100).await.unwrap();
    }
    assert_eq!(engine.total_docs(), 5);

    // A fresh crawler over the same state sees nothing new.
    let crawler = build_crawler(dir.path(), engine.clone());
    crawler.setup().await.unwrap();
    crawler.run_historical(100).await.unwrap();

    assert_eq!(engine.total_docs(), 5);
    assert_eq!(crawler.checkpoint(1), 5);
}

#[tokio::test]
async fn failed_batch_stops_the_channel_without_advancing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("exports")).unwrap();
    write_export(&dir.path().join("exports"), 1);
    register_channel(dir.path(), 1);

    let engine = Arc::new(MockEngine::default());
    engine.fail.store(true, Ordering::SeqCst);

    let crawler = build_crawler(dir.path(), engine.clone());
    crawler.setup().await.unwrap();
    crawler.run_historical(100).await.unwrap();

    assert_eq!(engine.batch_count(), 0);
    assert_eq!(crawler.checkpoint(1), 0);

    // Engine recovers: the replayed run ingests everything.
    engine.fail.store(false, Ordering::SeqCst);
    let crawler = build_crawler(dir.path(), engine.clone());
    crawler.setup().await.unwrap();
    crawler.run_historical(100).await.unwrap();

    assert_eq!(engine.total_docs(), 5);
    assert_eq!(crawler.checkpoint(1), 5);
}

#[tokio::test]
async fn disabled_channels_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("exports")).unwrap();
    write_export(&dir.path().join("exports"), 1);

    // Register, then disable by rewriting the registry file.
    register_channel(dir.path(), 1);
    let raw = std::fs::read_to_string(dir.path().join("channels.json")).unwrap();
    let mut channels: Vec<Value> = serde_json::from_str(&raw).unwrap();
    channels[0]["enabled"] = Value::Bool(false);
    std::fs::write(
        dir.path().join("channels.json"),
        serde_json::to_string(&channels).unwrap(),
    )
    .unwrap();

    let engine = Arc::new(MockEngine::default());
    let crawler = build_crawler(dir.path(), engine.clone());
    crawler.setup().await.unwrap();
    crawler.run_historical(100).await.unwrap();

    assert_eq!(engine.batch_count(), 0);
    assert_eq!(crawler.checkpoint(1), 0);
}
