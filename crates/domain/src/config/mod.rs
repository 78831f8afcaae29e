mod indexer;
mod meili;
mod redis;
mod search;
mod telegram;

pub use indexer::*;
pub use meili::*;
pub use redis::*;
pub use search::*;
pub use telegram::*;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Application configuration, layered defaults < TOML file < environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "d_name")]
    pub name: String,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub meilisearch: MeiliConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: d_name(),
            debug: false,
            telegram: TelegramConfig::default(),
            meilisearch: MeiliConfig::default(),
            redis: RedisConfig::default(),
            search: SearchConfig::default(),
            indexer: IndexerConfig::default(),
        }
    }
}

fn d_name() -> String {
    "telegram-search-engine".into()
}

impl AppConfig {
    /// Parse a TOML document into a config, with defaults for every
    /// missing field. The environment is NOT consulted here; call
    /// [`AppConfig::overlay`] afterwards.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("parsing config: {e}")))
    }

    /// Apply environment overrides via the provided lookup. The lookup is
    /// injected so tests can use a map instead of the process environment.
    pub fn overlay(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = get("DEBUG") {
            self.debug = parse_bool("DEBUG", &raw)?;
        }
        self.telegram.overlay(&get)?;
        self.meilisearch.overlay(&get)?;
        self.redis.overlay(&get)?;
        self.indexer.overlay(&get)?;
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn overlay_env(&mut self) -> Result<()> {
        self.overlay(|name| std::env::var(name).ok())
    }
}

// ── env overlay helpers ─────────────────────────────────────────────

pub(super) fn env_set(get: &impl Fn(&str) -> Option<String>, name: &str, slot: &mut String) {
    if let Some(raw) = get(name) {
        *slot = raw;
    }
}

pub(super) fn env_parse<T>(
    get: &impl Fn(&str) -> Option<String>,
    name: &str,
    slot: &mut T,
) -> Result<()>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    if let Some(raw) = get(name) {
        *slot = raw
            .parse()
            .map_err(|e| Error::Config(format!("{name}: invalid value {raw:?}: {e}")))?;
    }
    Ok(())
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!(
            "{name}: invalid boolean {other:?}"
        ))),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl AppConfig {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        // Engine host must be a usable URL.
        if self.meilisearch.host.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "meilisearch.host".into(),
                message: "host must not be empty".into(),
            });
        }
        if !self.meilisearch.host.is_empty()
            && !self.meilisearch.host.starts_with("http://")
            && !self.meilisearch.host.starts_with("https://")
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "meilisearch.host".into(),
                message: format!(
                    "host must start with http:// or https:// (got \"{}\")",
                    self.meilisearch.host
                ),
            });
        }
        if self.meilisearch.index_name.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "meilisearch.index_name".into(),
                message: "index_name must not be empty".into(),
            });
        }
        if self.meilisearch.api_key.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "meilisearch.api_key".into(),
                message: "no API key configured — engine requests are unauthenticated".into(),
            });
        }

        // Search limits.
        if self.search.default_limit == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "search.default_limit".into(),
                message: "default_limit must be greater than 0".into(),
            });
        }
        if self.search.max_limit < self.search.default_limit {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "search.max_limit".into(),
                message: "max_limit must be >= default_limit".into(),
            });
        }

        // Indexer.
        if self.indexer.batch_size == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "indexer.batch_size".into(),
                message: "batch_size must be at least 1".into(),
            });
        }
        if self.indexer.rate_limit_delay < 0.0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "indexer.rate_limit_delay".into(),
                message: "rate_limit_delay must not be negative".into(),
            });
        }
        if self.indexer.state_flush_interval < 0.0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "indexer.state_flush_interval".into(),
                message: "state_flush_interval must not be negative".into(),
            });
        }

        // Redis.
        if self.redis.port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "redis.port".into(),
                message: "port must be greater than 0".into(),
            });
        }

        // Crawling needs MTProto credentials unless running from exports.
        if self.indexer.import_dir.is_none()
            && (self.telegram.api_id == 0 || self.telegram.api_hash.is_empty())
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "telegram".into(),
                message: "api_id/api_hash not configured — live crawling is unavailable".into(),
            });
        }

        errors
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: find the first issue matching a field prefix.
    fn find_issue<'a>(issues: &'a [ConfigError], field_prefix: &str) -> Option<&'a ConfigError> {
        issues.iter().find(|e| e.field.starts_with(field_prefix))
    }

    #[test]
    fn default_config_has_no_errors() {
        let issues = AppConfig::default().validate();
        let errors: Vec<_> = issues
            .iter()
            .filter(|e| e.severity == ConfigSeverity::Error)
            .collect();
        assert!(errors.is_empty(), "expected no errors, got: {errors:?}");
    }

    #[test]
    fn empty_engine_host_is_error() {
        let mut cfg = AppConfig::default();
        cfg.meilisearch.host = String::new();
        let issues = cfg.validate();
        let issue = find_issue(&issues, "meilisearch.host")
            .expect("expected meilisearch.host error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn non_http_engine_host_is_error() {
        let mut cfg = AppConfig::default();
        cfg.meilisearch.host = "localhost:7700".into();
        let issues = cfg.validate();
        let issue = find_issue(&issues, "meilisearch.host")
            .expect("expected meilisearch.host error");
        assert!(issue.message.contains("http://"));
    }

    #[test]
    fn zero_batch_size_is_error() {
        let mut cfg = AppConfig::default();
        cfg.indexer.batch_size = 0;
        let issues = cfg.validate();
        let issue = find_issue(&issues, "indexer.batch_size")
            .expect("expected indexer.batch_size error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn max_limit_below_default_is_error() {
        let mut cfg = AppConfig::default();
        cfg.search.max_limit = 10;
        let issues = cfg.validate();
        let issue = find_issue(&issues, "search.max_limit")
            .expect("expected search.max_limit error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn missing_api_key_is_warning() {
        let cfg = AppConfig::default();
        let issues = cfg.validate();
        let issue = find_issue(&issues, "meilisearch.api_key")
            .expect("expected api_key warning");
        assert_eq!(issue.severity, ConfigSeverity::Warning);
    }

    #[test]
    fn config_error_display_format() {
        let err = ConfigError {
            severity: ConfigSeverity::Error,
            field: "indexer.batch_size".into(),
            message: "batch_size must be at least 1".into(),
        };
        assert_eq!(
            format!("{err}"),
            "[ERROR] indexer.batch_size: batch_size must be at least 1"
        );
    }
}
