//! The "Fetch RSS Feeds" action.
//!
//! One run reads a configuration snapshot, fetches every feed in order,
//! renders the digest and hands it to the writer. Failures are absorbed at
//! the smallest scope: a bad feed is skipped, a failed write is logged.
use chrono::Utc;

use crate::digest::{render_digest, DigestWriter, FeedSection};
use crate::feed::{FeedFetcher, FeedSource, Transport};
use crate::notify::Notifier;
use crate::storage::Storage;

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Feeds in the configuration snapshot.
    pub requested: usize,
    /// Feeds retrieved successfully (each got a digest section).
    pub fetched: usize,
    /// Items across all sections.
    pub items: usize,
    /// Path of the digest written, `None` when persisting failed.
    pub path: Option<String>,
}

impl RunReport {
    pub fn skipped(&self) -> usize {
        self.requested - self.fetched
    }
}

/// Runs one fetch over `feeds` and writes the digest.
///
/// Never returns an error: per-feed failures shrink the digest, and a
/// persistence failure is logged and reported as `path: None`.
pub async fn fetch_feeds<T, S, N>(
    feeds: &[FeedSource],
    fetcher: &FeedFetcher<T>,
    writer: &DigestWriter<S, N>,
) -> RunReport
where
    T: Transport,
    S: Storage,
    N: Notifier,
{
    let started = Utc::now();
    tracing::info!(feeds = feeds.len(), "Fetching RSS feeds");

    let fetched = fetcher.fetch_all(feeds).await;
    let sections: Vec<FeedSection> = fetched.iter().map(FeedSection::from).collect();
    let items = sections.iter().map(|s| s.items.len()).sum();
    let markdown = render_digest(&sections);

    let path = match writer.write(&markdown, started).await {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::error!(error = %e, "Error saving feeds");
            None
        }
    };

    let report = RunReport {
        requested: feeds.len(),
        fetched: fetched.len(),
        items,
        path,
    };
    tracing::info!(
        fetched = report.fetched,
        skipped = report.skipped(),
        items = report.items,
        "RSS fetch finished"
    );
    report
}
