//! Email discovery from a seed page and its outbound links.
//!
//! This module provides:
//! - Fetch and extraction configuration
//! - Protocol traits for pluggable fetchers and observers
//! - Email pattern matching and absolute link discovery
//! - The bounded depth-1 crawler

mod config;
mod emails;
mod extractor;
mod links;
mod protocols;

#[cfg(feature = "http")]
mod client;

#[cfg(feature = "http")]
pub use client::HttpFetcher;
pub use config::{
    timeout_from_secs, CrawlConfig, ExtractionConfig, FetchConfig, FALLBACK_USER_AGENT,
};
pub use emails::{collect_emails, email_regex, find_emails, EMAIL_PATTERN};
pub use extractor::{CrawlReport, EmailExtractor};
pub use links::{absolute_links, is_absolute_link, select_links};
#[cfg(test)]
pub use protocols::MockFetcher;
pub use protocols::{
    CrawlObserver, FetchResult, Fetcher, LoggingCrawlObserver, NoOpCrawlObserver,
};
