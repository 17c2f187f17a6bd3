//! Seed-page plus depth-1 link crawl for email addresses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use super::config::ExtractionConfig;
use super::emails::collect_emails;
use super::links::{absolute_links, select_links};
use super::protocols::{CrawlObserver, FetchResult, Fetcher, NoOpCrawlObserver};
use crate::errors::FetchError;

/// Outcome of one crawl.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlReport {
    /// The seed page URL.
    pub seed_url: String,
    /// Unique emails across every fetched page.
    pub emails: BTreeSet<String>,
    /// Absolute links found on the seed page, before the budget.
    pub links_discovered: usize,
    /// Links that were attempted, in order.
    pub links_followed: Vec<String>,
    /// Links that failed and were skipped.
    pub links_failed: Vec<String>,
    /// Pages fetched successfully, seed included.
    pub pages_fetched: usize,
    /// Wall time of the crawl in milliseconds.
    pub duration_ms: f64,
}

impl CrawlReport {
    /// Creates an empty report for a seed.
    #[must_use]
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            ..Default::default()
        }
    }
}

/// Extracts emails from a seed page and a bounded number of its outbound links.
pub struct EmailExtractor<F> {
    fetcher: F,
    config: ExtractionConfig,
    observer: Arc<dyn CrawlObserver>,
}

impl<F: Fetcher> EmailExtractor<F> {
    /// Creates an extractor with default extraction settings.
    #[must_use]
    pub fn new(fetcher: F) -> Self {
        Self::with_config(fetcher, ExtractionConfig::default())
    }

    /// Creates an extractor with explicit extraction settings.
    #[must_use]
    pub fn with_config(fetcher: F, config: ExtractionConfig) -> Self {
        Self {
            fetcher,
            config,
            observer: Arc::new(NoOpCrawlObserver),
        }
    }

    /// Sets the crawl observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The underlying fetcher.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// The extraction settings.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Returns the unique emails reachable from `seed_url`.
    ///
    /// A failed seed fetch is logged and yields an empty set. Failed link
    /// fetches are skipped.
    pub async fn extract_emails(&self, seed_url: &str, max_links: usize) -> BTreeSet<String> {
        match self.crawl(seed_url, max_links).await {
            Ok(report) => report.emails,
            Err(err) => {
                tracing::warn!(url = %seed_url, error = %err, "Error extracting emails");
                BTreeSet::new()
            }
        }
    }

    /// Same as `extract_emails` with the configured link budget.
    pub async fn extract_emails_default(&self, seed_url: &str) -> BTreeSet<String> {
        self.extract_emails(seed_url, self.config.max_links).await
    }

    /// Crawls the seed page and up to `max_links` of its absolute links.
    ///
    /// Links are followed one at a time in document order. Only the seed
    /// fetch can fail the crawl.
    pub async fn crawl(&self, seed_url: &str, max_links: usize) -> Result<CrawlReport, FetchError> {
        let start = Instant::now();
        let user_agent = self.fetcher.config().pick_user_agent().to_string();

        let seed = self.fetch_page(seed_url, &user_agent).await?;

        let mut report = CrawlReport::new(seed_url);
        report.pages_fetched = 1;
        collect_emails(&seed.text, &mut report.emails);

        let discovered = absolute_links(&seed.text);
        report.links_discovered = discovered.len();
        let targets = select_links(discovered, max_links, self.config.dedup_links);

        for link in targets {
            match self.fetch_page(&link, &user_agent).await {
                Ok(page) => {
                    report.pages_fetched += 1;
                    collect_emails(&page.text, &mut report.emails);
                }
                Err(err) => {
                    self.observer.on_link_skipped(&link, err.kind());
                    report.links_failed.push(link.clone());
                }
            }
            report.links_followed.push(link);
        }

        report.duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.observer
            .on_crawl_complete(seed_url, report.pages_fetched, report.emails.len());

        Ok(report)
    }

    async fn fetch_page(&self, url: &str, user_agent: &str) -> Result<FetchResult, FetchError> {
        self.observer.on_fetch_start(url);

        match self.fetcher.fetch(url, user_agent).await {
            Ok(page) => {
                self.observer
                    .on_fetch_complete(url, page.duration_ms, page.status_code);
                if page.is_success() {
                    Ok(page)
                } else {
                    Err(FetchError::status(url, page.status_code))
                }
            }
            Err(err) => {
                self.observer.on_fetch_error(url, &err);
                Err(err)
            }
        }
    }
}
