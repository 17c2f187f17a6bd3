//! Hand-written doubles with call tracking.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

use crate::crawl::{CrawlObserver, FetchConfig, FetchResult, Fetcher};
use crate::enrichment::ChatClient;
use crate::errors::{EnrichmentError, FetchError, LeadscoutError};
use crate::model::SearchHit;
use crate::pipeline::SearchSource;

/// A fetcher that serves canned responses keyed by URL.
///
/// URLs without a canned response fail with a network error.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Result<FetchResult, FetchError>>,
    config: FetchConfig,
    calls: Mutex<Vec<(String, String)>>,
}

impl StaticFetcher {
    /// Creates a fetcher with no pages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` as a 200 HTML page at `url`.
    #[must_use]
    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        let url = url.into();
        let page = FetchResult::html(url.clone(), body);
        self.with_result(url, page)
    }

    /// Serves an explicit response at `url`.
    #[must_use]
    pub fn with_result(mut self, url: impl Into<String>, result: FetchResult) -> Self {
        self.responses.insert(url.into(), Ok(result));
        self
    }

    /// Fails every fetch of `url` with `error`.
    #[must_use]
    pub fn with_error(mut self, url: impl Into<String>, error: FetchError) -> Self {
        self.responses.insert(url.into(), Err(error));
        self
    }

    /// Sets the fetch configuration.
    #[must_use]
    pub fn with_config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    /// Total fetches made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Fetches made for one URL.
    #[must_use]
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|(u, _)| u == url).count()
    }

    /// URLs requested, in order.
    #[must_use]
    pub fn requested_urls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(u, _)| u.clone()).collect()
    }

    /// User agents sent, in order.
    #[must_use]
    pub fn user_agents(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, ua)| ua.clone()).collect()
    }

    /// Clears call tracking.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<FetchResult, FetchError> {
        self.calls
            .lock()
            .push((url.to_string(), user_agent.to_string()));

        self.responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::network(url, "no canned response")))
    }

    fn config(&self) -> &FetchConfig {
        &self.config
    }
}

/// A chat client that replays a script of responses, one per call.
///
/// Once the script runs out, the fallback is returned on every call.
#[derive(Debug)]
pub struct ScriptedChatClient {
    model: String,
    script: Mutex<VecDeque<Result<String, EnrichmentError>>>,
    fallback: Result<String, EnrichmentError>,
    prompts: Mutex<Vec<String>>,
}

impl Default for ScriptedChatClient {
    fn default() -> Self {
        Self {
            model: "scripted".to_string(),
            script: Mutex::new(VecDeque::new()),
            fallback: Err(EnrichmentError::Network("script exhausted".to_string())),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedChatClient {
    /// Creates a client with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a successful response.
    #[must_use]
    pub fn then_ok(mut self, text: impl Into<String>) -> Self {
        self.script.get_mut().push_back(Ok(text.into()));
        self
    }

    /// Appends a failure.
    #[must_use]
    pub fn then_err(mut self, error: EnrichmentError) -> Self {
        self.script.get_mut().push_back(Err(error));
        self
    }

    /// Sets the response used after the script is exhausted.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Result<String, EnrichmentError>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Number of completions requested.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    /// Prompts received, in order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    async fn complete(&self, prompt: &str) -> Result<String, EnrichmentError> {
        self.prompts.lock().push(prompt.to_string());
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// A crawl observer that records every callback.
#[derive(Debug, Default)]
pub struct RecordingCrawlObserver {
    started: Mutex<Vec<String>>,
    errors: Mutex<Vec<(String, String)>>,
    skipped: Mutex<Vec<String>>,
    completed: Mutex<Vec<(String, usize, usize)>>,
}

impl RecordingCrawlObserver {
    /// URLs whose fetch started.
    #[must_use]
    pub fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }

    /// Transport errors as `(url, kind)`.
    #[must_use]
    pub fn errors(&self) -> Vec<(String, String)> {
        self.errors.lock().clone()
    }

    /// Links skipped after a failure.
    #[must_use]
    pub fn skipped(&self) -> Vec<String> {
        self.skipped.lock().clone()
    }

    /// Completed crawls as `(seed, pages_fetched, emails_found)`.
    #[must_use]
    pub fn completed(&self) -> Vec<(String, usize, usize)> {
        self.completed.lock().clone()
    }
}

impl CrawlObserver for RecordingCrawlObserver {
    fn on_fetch_start(&self, url: &str) {
        self.started.lock().push(url.to_string());
    }

    fn on_fetch_complete(&self, _url: &str, _duration_ms: f64, _status_code: u16) {}

    fn on_fetch_error(&self, url: &str, error: &FetchError) {
        self.errors
            .lock()
            .push((url.to_string(), error.kind().to_string()));
    }

    fn on_link_skipped(&self, url: &str, _reason: &str) {
        self.skipped.lock().push(url.to_string());
    }

    fn on_crawl_complete(&self, seed_url: &str, pages_fetched: usize, emails_found: usize) {
        self.completed
            .lock()
            .push((seed_url.to_string(), pages_fetched, emails_found));
    }
}

/// A search source returning the same hits for every query.
#[derive(Debug, Default)]
pub struct StaticSearchSource {
    hits: Vec<SearchHit>,
    queries: Mutex<Vec<String>>,
}

impl StaticSearchSource {
    /// Creates a source returning `hits`.
    #[must_use]
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queries received, in order.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl SearchSource for StaticSearchSource {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, LeadscoutError> {
        self.queries.lock().push(query.to_string());
        Ok(self.hits.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_fetcher_tracks_calls() {
        let fetcher = StaticFetcher::new().with_page("https://a.test", "body");

        let page = fetcher.fetch("https://a.test", "ua-1").await.unwrap();
        assert_eq!(page.text, "body");
        assert!(fetcher.fetch("https://missing.test", "ua-1").await.is_err());

        assert_eq!(fetcher.call_count(), 2);
        assert_eq!(fetcher.calls_for("https://a.test"), 1);
        assert_eq!(fetcher.user_agents(), vec!["ua-1", "ua-1"]);

        fetcher.reset();
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_scripted_client_replays_then_falls_back() {
        let client = ScriptedChatClient::new()
            .then_err(EnrichmentError::EmptyResponse)
            .then_ok("hello")
            .with_fallback(Ok("again".to_string()));

        assert_eq!(client.complete("p1").await, Err(EnrichmentError::EmptyResponse));
        assert_eq!(client.complete("p2").await, Ok("hello".to_string()));
        assert_eq!(client.complete("p3").await, Ok("again".to_string()));
        assert_eq!(client.prompts(), vec!["p1", "p2", "p3"]);
        assert_eq!(client.model(), "scripted");
    }

    #[test]
    fn test_static_search_source() {
        let source = StaticSearchSource::new(vec![SearchHit::new("https://a.test")]);
        let hits = tokio_test::block_on(source.search("cafes")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(source.queries(), vec!["cafes"]);
    }

    #[test]
    fn test_recording_observer() {
        let observer = RecordingCrawlObserver::default();
        observer.on_fetch_start("https://a.test");
        observer.on_fetch_error("https://a.test", &FetchError::timeout("https://a.test"));
        observer.on_link_skipped("https://a.test", "timeout");
        observer.on_crawl_complete("https://seed.test", 1, 0);

        assert_eq!(observer.started(), vec!["https://a.test"]);
        assert_eq!(observer.errors()[0].1, FetchError::timeout("x").kind());
        assert_eq!(observer.skipped(), vec!["https://a.test"]);
        assert_eq!(observer.completed(), vec![("https://seed.test".to_string(), 1, 0)]);
    }
}
