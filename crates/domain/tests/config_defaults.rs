use std::collections::HashMap;

use ts_domain::config::AppConfig;

#[test]
fn default_engine_host_is_localhost() {
    let config = AppConfig::default();
    assert_eq!(config.meilisearch.host, "http://localhost:7700");
    assert_eq!(config.meilisearch.index_name, "telegram_messages");
    assert_eq!(config.meilisearch.timeout, 5);
    assert_eq!(config.meilisearch.max_retries, 3);
}

#[test]
fn default_limits_and_indexer() {
    let config = AppConfig::default();
    assert_eq!(config.search.default_limit, 20);
    assert_eq!(config.search.max_limit, 100);
    assert_eq!(config.indexer.batch_size, 100);
    assert_eq!(config.indexer.rate_limit_delay, 1.0);
    assert_eq!(config.indexer.state_flush_interval, 1.0);
    assert_eq!(config.redis.port, 6379);
    assert_eq!(config.redis.cache_ttl, 3600);
}

#[test]
fn toml_overrides_defaults() {
    let raw = r#"
name = "my-search"

[meilisearch]
host = "http://meili.internal:7700"
index_name = "messages"

[search]
default_limit = 10

[indexer]
batch_size = 50
"#;
    let config = AppConfig::from_toml_str(raw).unwrap();
    assert_eq!(config.name, "my-search");
    assert_eq!(config.meilisearch.host, "http://meili.internal:7700");
    assert_eq!(config.meilisearch.index_name, "messages");
    // Untouched sections keep their defaults.
    assert_eq!(config.meilisearch.timeout, 5);
    assert_eq!(config.search.default_limit, 10);
    assert_eq!(config.search.max_limit, 100);
    assert_eq!(config.indexer.batch_size, 50);
}

#[test]
fn env_overlay_wins_over_toml() {
    let raw = r#"
[meilisearch]
host = "http://from-toml:7700"
"#;
    let mut config = AppConfig::from_toml_str(raw).unwrap();

    let env: HashMap<&str, &str> = HashMap::from([
        ("MEILI_HOST", "http://from-env:7700"),
        ("MEILI_MASTER_KEY", "secret"),
        ("MEILI_TIMEOUT", "9"),
        ("REDIS_PORT", "6390"),
        ("REDIS_CACHE_TTL", "120"),
        ("REDIS_CONNECT_TIMEOUT", "2"),
        ("STATE_FLUSH_INTERVAL", "0.5"),
        ("TELEGRAM_API_ID", "12345"),
        ("DEBUG", "true"),
    ]);
    config
        .overlay(|name| env.get(name).map(|v| v.to_string()))
        .unwrap();

    assert_eq!(config.meilisearch.host, "http://from-env:7700");
    assert_eq!(config.meilisearch.api_key, "secret");
    assert_eq!(config.meilisearch.timeout, 9);
    assert_eq!(config.redis.port, 6390);
    assert_eq!(config.redis.cache_ttl, 120);
    assert_eq!(config.redis.socket_connect_timeout, 2);
    assert_eq!(config.indexer.state_flush_interval, 0.5);
    assert_eq!(config.telegram.api_id, 12345);
    assert!(config.debug);
}

#[test]
fn env_overlay_rejects_garbage_numbers() {
    let mut config = AppConfig::default();
    let result = config.overlay(|name| {
        (name == "MEILI_TIMEOUT").then(|| "not-a-number".to_string())
    });
    assert!(result.is_err());
}

#[test]
fn redis_url_includes_db() {
    let mut config = AppConfig::default();
    config.redis.db = 2;
    assert_eq!(config.redis.url(), "redis://localhost:6379/2");
}
