//! Configuration types for fetching and email extraction.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// User agent used when the configured pool is empty.
pub const FALLBACK_USER_AGENT: &str = "leadscout/0.1";

/// Configuration for HTTP fetching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// Pool of user agents; one is picked at random per crawl.
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
    /// Additional headers to include.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_timeout() -> f64 {
    10.0
}

fn default_user_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
    ]
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agents: default_user_agents(),
            headers: HashMap::new(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Replaces the user agent pool.
    #[must_use]
    pub fn with_user_agents<I, S>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_agents = agents.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Gets timeout as Duration. An unusable value falls back to the default.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        timeout_from_secs(self.timeout_seconds).unwrap_or_else(|| {
            tracing::warn!(
                timeout_seconds = self.timeout_seconds,
                "Invalid fetch timeout, using default"
            );
            Duration::from_secs_f64(default_timeout())
        })
    }

    /// Picks a user agent uniformly at random from the pool.
    #[must_use]
    pub fn pick_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map_or(FALLBACK_USER_AGENT, String::as_str)
    }
}

/// Converts a timeout in seconds. Returns `None` unless the value is positive
/// and fits in a `Duration`.
#[must_use]
pub fn timeout_from_secs(seconds: f64) -> Option<Duration> {
    if seconds > 0.0 {
        Duration::try_from_secs_f64(seconds).ok()
    } else {
        None
    }
}

/// Configuration for email extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Maximum number of outbound links followed from the seed page.
    #[serde(default = "default_max_links")]
    pub max_links: usize,
    /// Drop repeated link targets before applying `max_links`.
    #[serde(default)]
    pub dedup_links: bool,
}

fn default_max_links() -> usize {
    10
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_links: default_max_links(),
            dedup_links: false,
        }
    }
}

impl ExtractionConfig {
    /// Creates a new extraction configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the link budget.
    #[must_use]
    pub fn with_max_links(mut self, max_links: usize) -> Self {
        self.max_links = max_links;
        self
    }

    /// Enables dedup of link targets.
    #[must_use]
    pub fn with_dedup_links(mut self) -> Self {
        self.dedup_links = true;
        self
    }
}

/// Combined configuration for crawling.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CrawlConfig {
    /// Fetch configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Extraction configuration.
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

impl CrawlConfig {
    /// Creates a new crawl configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout_seconds, 10.0);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.user_agents.len(), 3);
    }

    #[test]
    fn test_fetch_config_builder() {
        let config = FetchConfig::new()
            .with_timeout(2.5)
            .with_user_agents(["agent-a"])
            .with_header("Accept-Language", "en");

        assert_eq!(config.timeout(), Duration::from_millis(2500));
        assert_eq!(config.pick_user_agent(), "agent-a");
        assert_eq!(config.headers.get("Accept-Language"), Some(&"en".to_string()));
    }

    #[test]
    fn test_timeout_from_secs_bounds() {
        assert_eq!(timeout_from_secs(0.5), Some(Duration::from_millis(500)));
        assert_eq!(timeout_from_secs(0.0), None);
        assert_eq!(timeout_from_secs(-1.0), None);
        assert_eq!(timeout_from_secs(f64::NAN), None);
        assert_eq!(timeout_from_secs(f64::INFINITY), None);
        assert_eq!(timeout_from_secs(1e20), None);
    }

    #[test]
    fn test_out_of_range_timeout_falls_back_without_panic() {
        assert_eq!(FetchConfig::new().with_timeout(1e20).timeout(), Duration::from_secs(10));
        assert_eq!(FetchConfig::new().with_timeout(-1.0).timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_pick_user_agent_from_pool() {
        let config = FetchConfig::default();
        for _ in 0..20 {
            let agent = config.pick_user_agent();
            assert!(config.user_agents.iter().any(|a| a == agent));
        }
    }

    #[test]
    fn test_pick_user_agent_empty_pool() {
        let config = FetchConfig::new().with_user_agents(Vec::<String>::new());
        assert_eq!(config.pick_user_agent(), FALLBACK_USER_AGENT);
    }

    #[test]
    fn test_extraction_config_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.max_links, 10);
        assert!(!config.dedup_links);

        let config = ExtractionConfig::new().with_max_links(0).with_dedup_links();
        assert_eq!(config.max_links, 0);
        assert!(config.dedup_links);
    }

    #[test]
    fn test_crawl_config_partial_json() {
        let config: CrawlConfig =
            serde_json::from_str(r#"{"extraction": {"max_links": 3}}"#).unwrap();
        assert_eq!(config.extraction.max_links, 3);
        assert_eq!(config.fetch.timeout_seconds, 10.0);
    }
}
