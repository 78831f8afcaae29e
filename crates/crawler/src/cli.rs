use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use ts_domain::config::AppConfig;

/// telsearch: Chinese-aware full-text search over Telegram channels.
#[derive(Debug, Parser)]
#[command(name = "telsearch", version, about)]
pub struct Cli {
    /// Path to the TOML config file (default: configs/app.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Crawl channels into the search index.
    Crawl {
        #[arg(long, value_enum, default_value = "realtime")]
        mode: CrawlMode,
        /// Maximum messages per channel for historical sync.
        #[arg(long, default_value_t = 1000)]
        limit: usize,
        /// Enable debug logging.
        #[arg(long)]
        debug: bool,
    },
    /// Manage the channel registry.
    #[command(subcommand)]
    Channels(ChannelsCommand),
    /// Run a query against the index and print the raw result.
    Search {
        query: String,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        /// Bypass the result cache.
        #[arg(long)]
        no_cache: bool,
    },
    /// Print version information.
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CrawlMode {
    Realtime,
    Historical,
    Both,
}

#[derive(Debug, Subcommand)]
pub enum ChannelsCommand {
    /// Add a channel (or update an existing one).
    Add {
        channel_id: i64,
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long, default_value = "")]
        title: String,
    },
    /// Remove a channel.
    Remove { channel_id: i64 },
    /// List registered channels.
    List,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Default config file consulted when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "configs/app.toml";

/// Load the layered configuration: defaults < TOML file < environment.
///
/// An explicitly passed path must exist; the default path is optional.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)
                .map_err(|e| anyhow::anyhow!("reading {}: {e}", p.display()))?;
            AppConfig::from_toml_str(&raw)?
        }
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                let raw = std::fs::read_to_string(default)
                    .map_err(|e| anyhow::anyhow!("reading {DEFAULT_CONFIG_PATH}: {e}"))?;
                AppConfig::from_toml_str(&raw)?
            } else {
                AppConfig::default()
            }
        }
    };

    config.overlay_env()?;
    Ok(config)
}
