//! HTTP client for rebate listing pages.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::{user_agent::get_user_agent, Error};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can turn a page URL into an HTML body.
///
/// The scrape pipeline only depends on this trait, so tests can hand it
/// canned pages instead of a live client.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, Error>;
}

/// HTTP client for rebate listing pages.
///
/// Sends browser-like headers and a randomized desktop user agent. Any
/// non-success status is turned into [`Error::HttpStatus`].
pub struct Client {
    http: reqwest::Client,
}

impl Client {
    /// Creates a client with the default 30-second request timeout.
    pub fn new() -> Result<Self, Error> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    /// Fetches a page and returns its body as text.
    pub async fn fetch_html(&self, url: &str) -> Result<String, Error> {
        let parsed = Url::parse(url).map_err(|source| Error::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let resp = self
            .http
            .get(parsed)
            .header("user-agent", get_user_agent())
            .header("accept", "text/html,application/xhtml+xml")
            .header("accept-language", "en-CA,en;q=0.9")
            .header("upgrade-insecure-requests", "1")
            .header("cache-control", "no-cache")
            .header("pragma", "no-cache")
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("GET {} failed with status {}: {}", url, status, snippet);
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl PageFetcher for Client {
    async fn fetch_page(&self, url: &str) -> Result<String, Error> {
        self.fetch_html(url).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 500;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}
