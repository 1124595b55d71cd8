//! Configuration file parser for ~/.config/feed-digest/config.toml.
//!
//! The config file is optional, a missing file yields `Config::default()`
//! (no feeds, output into `rss-feeds`). Unknown keys are ignored by serde,
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::feed::{FeedSource, FetchRoute, DEFAULT_FETCH_DELAY, DEFAULT_PROXY_URL};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid proxy URL '{url}': {source}")]
    InvalidProxyUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration, read once at the start of each run.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder (relative to the storage root) receiving one digest per run.
    pub output_folder: String,

    /// Request routing and pacing.
    pub fetch: FetchSettings,

    /// Feeds in the order their sections appear in the digest.
    pub feeds: Vec<FeedSource>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_folder: "rss-feeds".to_string(),
            fetch: FetchSettings::default(),
            feeds: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// Wrap every request through `proxy_url`.
    #[default]
    Proxy,
    /// Request feed URLs directly.
    Direct,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub route: RouteKind,

    /// Proxy base; the feed URL is appended as the `url` query parameter.
    pub proxy_url: String,

    /// Pause between consecutive feed requests, in milliseconds.
    pub delay_ms: u64,

    pub connect_timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            route: RouteKind::Proxy,
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            delay_ms: DEFAULT_FETCH_DELAY.as_millis() as u64,
            connect_timeout_secs: 10,
        }
    }
}

impl FetchSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn route(&self) -> Result<FetchRoute, ConfigError> {
        match self.route {
            RouteKind::Direct => Ok(FetchRoute::Direct),
            RouteKind::Proxy => {
                let base =
                    Url::parse(&self.proxy_url).map_err(|source| ConfigError::InvalidProxyUrl {
                        url: self.proxy_url.clone(),
                        source,
                    })?;
                Ok(FetchRoute::Proxy { base })
            }
        }
    }
}

/// Command-line overrides layered on top of the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output_folder: Option<String>,
    /// Fetch directly, ignoring any configured proxy.
    pub direct: bool,
    /// Route through this proxy, even if the file says `direct`.
    pub proxy_url: Option<String>,
    pub delay_ms: Option<u64>,
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 3] = ["output_folder", "fetch", "feeds"];

    /// Load configuration from a TOML file.
    ///
    /// A missing, empty or whitespace-only file yields the defaults. The
    /// proxy URL is not checked here; call [`FetchSettings::route`] once
    /// overrides are applied, since `--direct` never needs it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(content) = read_capped(path, Self::MAX_FILE_SIZE)? else {
            tracing::debug!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config = Self::from_toml(&content)?;
        tracing::info!(
            path = %path.display(),
            feeds = config.feeds.len(),
            output_folder = %config.output_folder,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parses TOML text, warning about top-level keys nothing reads.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = content.parse()?;
        for key in table
            .keys()
            .filter(|key| !Self::KNOWN_KEYS.contains(&key.as_str()))
        {
            tracing::warn!(key = %key, "Unknown key in config file, ignoring");
        }
        Ok(toml::Value::Table(table).try_into()?)
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(folder) = &overrides.output_folder {
            self.output_folder = folder.clone();
        }
        if overrides.direct {
            self.fetch.route = RouteKind::Direct;
        }
        if let Some(url) = &overrides.proxy_url {
            self.fetch.route = RouteKind::Proxy;
            self.fetch.proxy_url = url.clone();
        }
        if let Some(delay_ms) = overrides.delay_ms {
            self.fetch.delay_ms = delay_ms;
        }
    }
}

/// Reads at most `limit` bytes of UTF-8; `None` when the file does not exist.
fn read_capped(path: &Path, limit: u64) -> Result<Option<String>, ConfigError> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfigError::Io(e)),
    };

    // SEC-014: one byte past the limit is enough to reject the file
    let mut bytes = Vec::new();
    file.take(limit + 1).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limit {
        return Err(ConfigError::TooLarge(format!(
            "{} exceeds {} bytes",
            path.display(),
            limit
        )));
    }

    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| ConfigError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

// ============================================================================
// Tests
// ============================================================================
