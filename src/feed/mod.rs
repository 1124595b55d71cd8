//! Feed retrieval and item extraction.
//!
//! - [`route`] - how a feed URL becomes a request URL (direct or proxied)
//! - [`transport`] - the network seam and its reqwest implementation
//! - [`fetcher`] - sequential, paced retrieval of every configured feed
//! - [`parser`] - best-effort `<item>` extraction from a feed document
//!
//! # Example
//!
//! ```ignore
//! use feed_digest::feed::{FeedFetcher, FetchRoute, HttpTransport};
//!
//! let fetcher = FeedFetcher::new(HttpTransport::new(10)?, FetchRoute::default(), delay);
//! let fetched = fetcher.fetch_all(&config.feeds).await;
//! let items = parse_items(&fetched[0].content);
//! ```

mod fetcher;
mod parser;
mod route;
mod transport;

pub use fetcher::{FeedFetcher, FetchError, FetchedFeed, DEFAULT_FETCH_DELAY};
pub use parser::{parse_items, FeedItem};
pub use route::{FetchRoute, DEFAULT_PROXY_URL};
pub use transport::{HttpTransport, Transport, TransportResponse};

use serde::Deserialize;

/// A named feed endpoint, in configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedSource {
    /// Display label used as the digest section heading. May be empty.
    pub name: String,
    /// Feed document URL.
    pub url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}
