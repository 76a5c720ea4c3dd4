//! Best-effort page fetching for the remote search probe.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// A failed candidate fetch.
///
/// The probe skips the candidate and moves on; a fetch failure never aborts
/// the probe.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The href did not resolve against the base URL.
    #[error("invalid candidate href {href:?}: {source}")]
    InvalidHref {
        href: String,
        #[source]
        source: url::ParseError,
    },
    /// Transport-level failure (DNS, connect, timeout).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),
}

/// Fetches candidate pages for the remote probe.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the text of the page at `href`.
    async fn fetch(&self, href: &str) -> Result<String, FetchError>;
}

/// `reqwest`-backed fetcher resolving hrefs against the storefront base URL.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpFetcher {
    /// Create a fetcher for same-origin pages under `base_url`.
    #[must_use]
    pub fn new(base_url: Url, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build probe HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self { client, base_url }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, href: &str) -> Result<String, FetchError> {
        let url = self.base_url.join(href).map_err(|source| FetchError::InvalidHref {
            href: href.to_string(),
            source,
        })?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}
