use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use url::Url;

use feed_digest::config::{Config, Overrides};
use feed_digest::digest::DigestWriter;
use feed_digest::feed::{FeedFetcher, HttpTransport};
use feed_digest::notify::ConsoleNotifier;
use feed_digest::run::fetch_feeds;
use feed_digest::storage::LocalStorage;

/// Get the default config file path (~/.config/feed-digest/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("feed-digest")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "feed-digest",
    about = "Fetch RSS feeds into a markdown checklist digest"
)]
struct Args {
    /// Config file (default: ~/.config/feed-digest/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory the output folder is resolved against
    #[arg(long, value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Override the configured output folder
    #[arg(long, value_name = "FOLDER")]
    output_folder: Option<String>,

    /// Fetch feeds directly instead of through the proxy
    #[arg(long, conflicts_with = "proxy_url")]
    direct: bool,

    /// Route requests through this proxy endpoint
    #[arg(long, value_name = "URL")]
    proxy_url: Option<Url>,

    /// Override the pause between feed requests
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Print the configured feeds and exit
    #[arg(long)]
    list_feeds: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            output_folder: self.output_folder.clone(),
            direct: self.direct,
            proxy_url: self.proxy_url.as_ref().map(Url::to_string),
            delay_ms: self.delay_ms,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;
    config.apply_overrides(&args.overrides());

    if args.list_feeds {
        if config.feeds.is_empty() {
            println!("No feeds configured in {}", config_path.display());
        }
        for (index, feed) in config.feeds.iter().enumerate() {
            println!("{:>3}. {} <{}>", index + 1, feed.name, feed.url);
        }
        return Ok(());
    }

    let route = config.fetch.route().context("Invalid fetch settings")?;
    let transport = HttpTransport::new(config.fetch.connect_timeout_secs)
        .context("Failed to create HTTP client")?;
    let fetcher = FeedFetcher::new(transport, route, config.fetch.delay());
    let writer = DigestWriter::new(
        LocalStorage::new(&args.root),
        ConsoleNotifier,
        config.output_folder.clone(),
    );

    let report = fetch_feeds(&config.feeds, &fetcher, &writer).await;

    if report.skipped() > 0 {
        eprintln!(
            "Warning: {} of {} feeds could not be fetched (run with RUST_LOG=warn for details)",
            report.skipped(),
            report.requested
        );
    }
    if report.path.is_none() {
        eprintln!("Error: the digest could not be saved");
        std::process::exit(1);
    }

    Ok(())
}
