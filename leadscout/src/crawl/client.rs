//! `reqwest`-backed fetcher.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use std::time::Instant;

use super::config::FetchConfig;
use super::protocols::{FetchResult, Fetcher};
use crate::errors::FetchError;

/// Fetches pages over HTTP with a bounded timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Builds a fetcher from configuration.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(extra_headers(&config))
            .build()
            .map_err(|e| FetchError::network("<client>", e.to_string()))?;

        Ok(Self { client, config })
    }
}

fn extra_headers(config: &FetchConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (key, value) in &config.headers {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %key, "Ignoring invalid header"),
        }
    }
    headers
}

fn classify(url: &str, err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::timeout(url)
    } else if err.is_builder() {
        FetchError::InvalidUrl(url.to_string())
    } else {
        FetchError::network(url, err.to_string())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<FetchResult, FetchError> {
        let start = Instant::now();

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| classify(url, &e))?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        Ok(FetchResult {
            status_code,
            text,
            final_url,
            content_type,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }

    fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_fetcher_builds() {
        let fetcher = HttpFetcher::new(FetchConfig::default().with_header("Accept", "text/html"));
        assert!(fetcher.is_ok());
        assert_eq!(fetcher.unwrap().config().timeout_seconds, 10.0);
    }

    #[test]
    fn test_invalid_headers_are_dropped() {
        let config = FetchConfig::default()
            .with_header("bad header", "x")
            .with_header("X-Ok", "yes");
        let headers = extra_headers(&config);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("x-ok").unwrap(), "yes");
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_is_error() {
        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let result = fetcher.fetch("not a url", "agent").await;
        assert!(result.is_err());
    }
}
