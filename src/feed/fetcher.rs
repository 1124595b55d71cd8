use std::time::Duration;
use thiserror::Error;

use super::route::FetchRoute;
use super::transport::Transport;
use super::FeedSource;

/// Pause between consecutive feed requests.
pub const DEFAULT_FETCH_DELAY: Duration = Duration::from_millis(2000);

/// Errors that can occur while retrieving a single feed.
///
/// None of these abort a run; the affected feed is skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Proxy response body was not the expected JSON envelope
    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// Raw document of one successfully retrieved feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFeed {
    pub name: String,
    pub content: String,
}

/// Retrieves feeds one at a time, pausing between requests.
pub struct FeedFetcher<T> {
    transport: T,
    route: FetchRoute,
    delay: Duration,
}

impl<T: Transport> FeedFetcher<T> {
    pub fn new(transport: T, route: FetchRoute, delay: Duration) -> Self {
        Self {
            transport,
            route,
            delay,
        }
    }

    /// Fetches every feed in configured order.
    ///
    /// Failed feeds are logged and left out of the result, so the output is
    /// never longer than `feeds`. The delay elapses between every pair of
    /// consecutive requests whatever the previous outcome was; requests are
    /// never overlapped.
    pub async fn fetch_all(&self, feeds: &[FeedSource]) -> Vec<FetchedFeed> {
        let mut fetched = Vec::with_capacity(feeds.len());

        for (index, feed) in feeds.iter().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self.fetch_one(feed).await {
                Ok(content) => {
                    tracing::debug!(
                        feed = %feed.url,
                        bytes = content.len(),
                        "Fetched feed"
                    );
                    fetched.push(FetchedFeed {
                        name: feed.name.clone(),
                        content,
                    });
                }
                Err(e) => {
                    tracing::warn!(feed = %feed.url, error = %e, "Error fetching feed, skipping");
                }
            }
        }

        fetched
    }

    /// Single attempt, no retry.
    pub async fn fetch_one(&self, feed: &FeedSource) -> Result<String, FetchError> {
        let request_url = self.route.request_url(&feed.url);
        let response = self.transport.get(&request_url).await?;

        if !response.is_success() {
            return Err(FetchError::HttpStatus(response.status));
        }

        self.route.extract_document(&feed.url, &response)
    }
}
