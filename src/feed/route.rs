use serde::Deserialize;
use url::Url;

use super::fetcher::FetchError;
use super::transport::TransportResponse;

/// Public relay that wraps a feed document in a JSON envelope.
pub const DEFAULT_PROXY_URL: &str = "https://api.allorigins.win/get";

/// How a feed URL is turned into a request, and how the response body is
/// turned back into the feed document.
///
/// `Proxy` exists for hosts that block cross-origin fetches; everywhere else
/// `Direct` avoids the third-party hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRoute {
    /// Request the feed URL as-is; the body is the document.
    Direct,
    /// Request `<base>?url=<percent-encoded feed URL>`; the document is the
    /// `contents` field of the JSON response.
    Proxy { base: Url },
}

impl Default for FetchRoute {
    fn default() -> Self {
        Self::Proxy {
            base: Url::parse(DEFAULT_PROXY_URL).expect("default proxy URL is valid"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProxyEnvelope {
    contents: Option<String>,
}

impl FetchRoute {
    pub fn request_url(&self, feed_url: &str) -> String {
        match self {
            Self::Direct => feed_url.to_string(),
            Self::Proxy { base } => {
                let mut url = base.clone();
                url.set_fragment(None);
                let param = format!("url={}", urlencoding::encode(feed_url));
                let query = match url.query() {
                    Some(existing) if !existing.is_empty() => format!("{}&{}", existing, param),
                    _ => param,
                };
                url.set_query(Some(&query));
                url.into()
            }
        }
    }

    /// Extracts the feed document from a successful response.
    ///
    /// A proxy envelope without `contents` yields an empty document, which
    /// parses to zero items.
    pub fn extract_document(
        &self,
        feed_url: &str,
        response: &TransportResponse,
    ) -> Result<String, FetchError> {
        match self {
            Self::Direct => Ok(response.text()),
            Self::Proxy { .. } => {
                let envelope: ProxyEnvelope = response.json()?;
                Ok(envelope.contents.unwrap_or_else(|| {
                    tracing::warn!(feed = %feed_url, "Proxy envelope has no contents");
                    String::new()
                }))
            }
        }
    }
}
