//! Protocol traits for crawl components.
//!
//! These traits define the seams between the extractor and the network, so
//! the extractor can be driven by a real HTTP client or by a test double.

use async_trait::async_trait;

use super::config::FetchConfig;
use crate::errors::FetchError;

/// Result of a fetch operation.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    /// HTTP status code.
    pub status_code: u16,
    /// Response body as text.
    pub text: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// Content type from headers.
    pub content_type: Option<String>,
    /// Time taken to fetch in milliseconds.
    pub duration_ms: f64,
}

impl FetchResult {
    /// Creates a 200 response carrying an HTML body.
    #[must_use]
    pub fn html(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            text: body.into(),
            final_url: url.into(),
            content_type: Some("text/html; charset=utf-8".to_string()),
            duration_ms: 0.0,
        }
    }

    /// Sets the status code.
    #[must_use]
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    /// Whether the response is HTML.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_ref()
            .is_some_and(|ct| ct.contains("text/html") || ct.contains("application/xhtml"))
    }

    /// Whether the fetch was successful (2xx status).
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Protocol for HTTP fetching.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches a URL with the given user agent.
    ///
    /// Non-2xx responses are returned as `Ok`; only transport-level failures
    /// are errors.
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<FetchResult, FetchError>;

    /// Gets the configuration.
    fn config(&self) -> &FetchConfig;
}

/// Observability callbacks for crawl operations.
pub trait CrawlObserver: Send + Sync {
    /// Called when a fetch starts.
    fn on_fetch_start(&self, url: &str);

    /// Called when a fetch returns a response.
    fn on_fetch_complete(&self, url: &str, duration_ms: f64, status_code: u16);

    /// Called when a fetch fails at the transport level.
    fn on_fetch_error(&self, url: &str, error: &FetchError);

    /// Called when a followed link is skipped after a failure.
    fn on_link_skipped(&self, url: &str, reason: &str);

    /// Called when a crawl finishes.
    fn on_crawl_complete(&self, seed_url: &str, pages_fetched: usize, emails_found: usize);
}

/// No-op implementation of `CrawlObserver`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCrawlObserver;

impl CrawlObserver for NoOpCrawlObserver {
    fn on_fetch_start(&self, _url: &str) {}
    fn on_fetch_complete(&self, _url: &str, _duration_ms: f64, _status_code: u16) {}
    fn on_fetch_error(&self, _url: &str, _error: &FetchError) {}
    fn on_link_skipped(&self, _url: &str, _reason: &str) {}
    fn on_crawl_complete(&self, _seed_url: &str, _pages_fetched: usize, _emails_found: usize) {}
}

/// Observer that reports crawl progress through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingCrawlObserver;

impl CrawlObserver for LoggingCrawlObserver {
    fn on_fetch_start(&self, url: &str) {
        tracing::debug!(url, "Fetch started");
    }

    fn on_fetch_complete(&self, url: &str, duration_ms: f64, status_code: u16) {
        tracing::debug!(url, duration_ms, status_code, "Fetch completed");
    }

    fn on_fetch_error(&self, url: &str, error: &FetchError) {
        tracing::debug!(url, kind = error.kind(), error = %error, "Fetch failed");
    }

    fn on_link_skipped(&self, url: &str, reason: &str) {
        tracing::debug!(url, reason, "Skipping linked page");
    }

    fn on_crawl_complete(&self, seed_url: &str, pages_fetched: usize, emails_found: usize) {
        tracing::info!(seed_url, pages_fetched, emails_found, "Crawl complete");
    }
}
