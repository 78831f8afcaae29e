use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ts_cache::{RedisCache, StatsService};
use ts_crawler::cli::{ChannelsCommand, Cli, Command, CrawlMode};
use ts_crawler::crawler::Crawler;
use ts_domain::config::{AppConfig, ConfigSeverity};
use ts_indexer::{ChannelRegistry, ChatClient, ImportChatClient};
use ts_meili::{MeiliClient, SearchEngine};
use ts_search::{SearchOptions, SearchService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Crawl { mode, limit, debug } => {
            let mut config = ts_crawler::cli::load_config(cli.config.as_deref())?;
            if debug {
                config.debug = true;
            }
            init_tracing(config.debug);
            run_crawl(config, mode, limit).await
        }
        Command::Channels(cmd) => {
            let config = ts_crawler::cli::load_config(cli.config.as_deref())?;
            run_channels(&config, cmd)
        }
        Command::Search {
            query,
            limit,
            offset,
            no_cache,
        } => {
            let config = ts_crawler::cli::load_config(cli.config.as_deref())?;
            init_tracing(config.debug);
            run_search(config, &query, limit, offset, !no_cache).await
        }
        Command::Version => {
            println!("telsearch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Structured tracing: JSON by default, human-readable in debug mode.
fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));

    if debug {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    }
}

/// Log validation issues; fail on hard errors.
fn check_config(config: &AppConfig) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let error_count = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if error_count > 0 {
        anyhow::bail!("config validation failed with {error_count} error(s)");
    }
    Ok(())
}

async fn run_crawl(config: AppConfig, mode: CrawlMode, limit: usize) -> anyhow::Result<()> {
    tracing::info!(name = %config.name, ?mode, "telsearch crawler starting");
    check_config(&config)?;

    let engine: Arc<dyn SearchEngine> =
        Arc::new(MeiliClient::new(&config.meilisearch).context("initializing engine client")?);

    // The MTProto transport is an external collaborator; the bundled
    // producer replays exported channel dumps.
    let client: Arc<dyn ChatClient> = match &config.indexer.import_dir {
        Some(dir) => Arc::new(ImportChatClient::new(dir)),
        None => anyhow::bail!(
            "no chat transport configured: set [indexer] import_dir to crawl from exports"
        ),
    };

    let crawler = Crawler::new(config, client, engine);
    crawler.install_signal_handlers();
    crawler.setup().await.context("initializing crawler")?;

    let run_result = crawler.run(mode, limit).await;
    let shutdown_result = crawler.shutdown().await;

    run_result.context("crawl failed")?;
    shutdown_result.context("shutdown failed")?;
    Ok(())
}

fn run_channels(config: &AppConfig, cmd: ChannelsCommand) -> anyhow::Result<()> {
    let registry = ChannelRegistry::load(&config.indexer.channels_path);

    match cmd {
        ChannelsCommand::Add {
            channel_id,
            username,
            title,
        } => {
            registry.add_channel(channel_id, &username, &title)?;
            println!("Added: {channel_id}");
        }
        ChannelsCommand::Remove { channel_id } => {
            if registry.remove_channel(channel_id)? {
                println!("Removed: {channel_id}");
            } else {
                println!("Not found: {channel_id}");
            }
        }
        ChannelsCommand::List => {
            for channel in registry.list_channels() {
                let status = if channel.enabled { "✓" } else { "✗" };
                println!(
                    "[{status}] {} @{} - {}",
                    channel.channel_id, channel.username, channel.title
                );
            }
        }
    }
    Ok(())
}

async fn run_search(
    config: AppConfig,
    query: &str,
    limit: Option<i64>,
    offset: i64,
    use_cache: bool,
) -> anyhow::Result<()> {
    check_config(&config)?;

    let engine: Arc<dyn SearchEngine> =
        Arc::new(MeiliClient::new(&config.meilisearch).context("initializing engine client")?);
    let cache =
        Arc::new(RedisCache::new(&config.redis).context("initializing result cache")?);
    let stats = StatsService::new(&config.redis).context("initializing stats service")?;
    let service = SearchService::new(engine, cache, config.search.clone());

    stats.record_search(query).await;

    let opts = SearchOptions {
        limit,
        offset,
        use_cache,
        ..SearchOptions::default()
    };
    let result = service
        .search(query, opts)
        .await
        .context("search failed, please retry")?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
