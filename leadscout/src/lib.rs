//! # Leadscout
//!
//! Lead discovery from the web: crawl a page and its outbound links for email
//! addresses, enrich each lead through a text-generation endpoint, and keep
//! the results in a local SQLite store.
//!
//! Leadscout provides:
//!
//! - **Bounded crawling**: a seed page plus at most `max_links` of its
//!   absolute links, fetched one at a time
//! - **Retrying enrichment**: a fixed attempt budget with a flat delay and a
//!   sentinel value when every attempt fails
//! - **Lead storage**: append-only SQLite persistence with id lookup and deletion
//! - **Pluggable seams**: fetcher, chat client and search source are traits
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use leadscout::prelude::*;
//!
//! let extractor = EmailExtractor::new(HttpFetcher::new(FetchConfig::default())?);
//! let retrier = EnrichmentRetrier::with_default_policy(GroqChatClient::new(api_key)?);
//! let pipeline = LeadPipeline::new(extractor, retrier);
//!
//! let mut store = LeadStore::open("leads.db")?;
//! let summary = pipeline.run("https://example.com", &mut store).await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod crawl;
pub mod enrichment;
pub mod errors;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod store;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{EnrichmentConfig, LeadscoutConfig, LoggingConfig, StoreConfig};
    #[cfg(feature = "http")]
    pub use crate::crawl::HttpFetcher;
    pub use crate::crawl::{
        CrawlConfig, CrawlObserver, CrawlReport, EmailExtractor, ExtractionConfig, FetchConfig,
        FetchResult, Fetcher, LoggingCrawlObserver, NoOpCrawlObserver,
    };
    #[cfg(feature = "http")]
    pub use crate::enrichment::GroqChatClient;
    pub use crate::enrichment::{
        BackoffStrategy, ChatClient, EnrichmentReport, EnrichmentRetrier, RetryPolicy,
        FAILURE_SENTINEL,
    };
    pub use crate::errors::{
        ConfigError, EnrichmentError, FetchError, LeadscoutError, StoreError,
    };
    pub use crate::model::{InputKind, LeadRecord, SearchHit};
    pub use crate::observability::init_tracing;
    pub use crate::pipeline::{LeadPipeline, NoSearchSource, PipelineSummary, SearchSource};
    pub use crate::store::LeadStore;
}
