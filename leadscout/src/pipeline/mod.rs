//! End-to-end lead run: scrape, enrich, save.
//!
//! Every step runs sequentially. Failures in one record, link or search never
//! abort the run; they are logged and counted in the [`PipelineSummary`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::crawl::{EmailExtractor, Fetcher};
use crate::enrichment::{ChatClient, EnrichmentRetrier};
use crate::errors::LeadscoutError;
use crate::model::{InputKind, LeadRecord, SearchHit};
use crate::observability::SpanTimer;
use crate::store::LeadStore;


/// Turns a free-text query into result hits.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Runs the search.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, LeadscoutError>;
}

/// Search source used when none is configured. Always returns no hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSearchSource;

#[async_trait]
impl SearchSource for NoSearchSource {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, LeadscoutError> {
        tracing::warn!(query = %query, "No search source configured; query input yields no leads");
        Ok(Vec::new())
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// How the input was interpreted.
    pub input_kind: InputKind,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Records produced by scraping.
    pub records_scraped: usize,
    /// Records that received a real insight.
    pub records_enriched: usize,
    /// Records that fell back to the failure sentinel.
    pub enrichment_failures: usize,
    /// Store ids of saved records, in scrape order.
    pub saved_ids: Vec<i64>,
    /// Store failure, if saving did not succeed.
    pub store_error: Option<String>,
    /// Wall time of the run in milliseconds.
    pub duration_ms: f64,
}

impl PipelineSummary {
    fn start(input_kind: InputKind) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            input_kind,
            started_at: Utc::now(),
            records_scraped: 0,
            records_enriched: 0,
            enrichment_failures: 0,
            saved_ids: Vec::new(),
            store_error: None,
            duration_ms: 0.0,
        }
    }

    /// Whether every scraped record made it into the store.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.store_error.is_none() && self.saved_ids.len() == self.records_scraped
    }
}

/// Ties extraction, enrichment and storage together.
pub struct LeadPipeline<F, C> {
    extractor: EmailExtractor<F>,
    retrier: Option<EnrichmentRetrier<C>>,
    search: Arc<dyn SearchSource>,
}

impl<F: Fetcher, C: ChatClient> LeadPipeline<F, C> {
    /// Creates a pipeline that enriches every scraped record.
    #[must_use]
    pub fn new(extractor: EmailExtractor<F>, retrier: EnrichmentRetrier<C>) -> Self {
        Self {
            extractor,
            retrier: Some(retrier),
            search: Arc::new(NoSearchSource),
        }
    }

    /// Creates a pipeline that saves records without enrichment.
    #[must_use]
    pub fn without_enrichment(extractor: EmailExtractor<F>) -> Self {
        Self {
            extractor,
            retrier: None,
            search: Arc::new(NoSearchSource),
        }
    }

    /// Sets the search source used for query input.
    #[must_use]
    pub fn with_search_source(mut self, search: Arc<dyn SearchSource>) -> Self {
        self.search = search;
        self
    }

    /// The email extractor.
    pub fn extractor(&self) -> &EmailExtractor<F> {
        &self.extractor
    }

    /// The enrichment retrier, if enrichment is enabled.
    pub fn retrier(&self) -> Option<&EnrichmentRetrier<C>> {
        self.retrier.as_ref()
    }

    /// Produces lead records for a URL or a search query.
    pub async fn scrape(&self, input: &str) -> Vec<LeadRecord> {
        let query = input.trim();

        match InputKind::classify(query) {
            InputKind::Url => {
                tracing::info!(url = %query, "Scraping URL");
                let emails = self.extractor.extract_emails_default(query).await;
                vec![LeadRecord::from_url(query, query, emails)]
            }
            InputKind::Query => {
                tracing::info!(query = %query, "Scraping search results");
                let hits = match self.search.search(query).await {
                    Ok(hits) => hits,
                    Err(err) => {
                        tracing::warn!(query = %query, error = %err, "Search failed");
                        return Vec::new();
                    }
                };

                let mut records = Vec::with_capacity(hits.len());
                for hit in hits {
                    let emails = match hit.url.as_deref() {
                        Some(url) => self.extractor.extract_emails_default(url).await,
                        None => BTreeSet::new(),
                    };
                    records.push(LeadRecord::from_hit(query, hit, emails));
                }
                records
            }
        }
    }

    /// Scrapes, enriches and saves. Store failures are reported in the
    /// summary, never raised.
    pub async fn run(&self, input: &str, store: &mut LeadStore) -> PipelineSummary {
        let summary = PipelineSummary::start(InputKind::classify(input));
        let span = tracing::info_span!("run", run_id = %summary.run_id, kind = %summary.input_kind);
        self.run_inner(input, store, summary).instrument(span).await
    }

    async fn run_inner(
        &self,
        input: &str,
        store: &mut LeadStore,
        mut summary: PipelineSummary,
    ) -> PipelineSummary {
        let timer = SpanTimer::start("pipeline.run");

        let records = self.scrape(input).await;
        summary.records_scraped = records.len();

        let records = match &self.retrier {
            Some(retrier) => {
                let mut enriched = Vec::with_capacity(records.len());
                for record in records {
                    let (record, report) = retrier.enrich_with_report(record).await;
                    if report.success {
                        summary.records_enriched += 1;
                    } else {
                        summary.enrichment_failures += 1;
                    }
                    enriched.push(record);
                }
                enriched
            }
            None => records,
        };

        match store.save(&records) {
            Ok(ids) => summary.saved_ids = ids,
            Err(err) => {
                tracing::error!(error = %err, count = records.len(), "Failed to save leads");
                summary.store_error = Some(err.to_string());
            }
        }

        summary.duration_ms = timer.finish();
        tracing::info!(
            scraped = summary.records_scraped,
            enriched = summary.records_enriched,
            failures = summary.enrichment_failures,
            saved = summary.saved_ids.len(),
            "Pipeline run complete"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{RetryPolicy, FAILURE_SENTINEL};
    use crate::errors::FetchError;
    use crate::model::URL_RECORD_TITLE;
    use crate::testing::{ScriptedChatClient, StaticFetcher, StaticSearchSource};
    use pretty_assertions::assert_eq;

    fn quick_policy() -> RetryPolicy {
        RetryPolicy::new().with_delay_ms(0)
    }

    #[tokio::test]
    async fn test_scrape_url_input() {
        let fetcher = StaticFetcher::new().with_page("https://acme.test", "hello@acme.test");
        let pipeline: LeadPipeline<_, ScriptedChatClient> =
            LeadPipeline::without_enrichment(EmailExtractor::new(fetcher));

        let records = pipeline.scrape("  https://acme.test ").await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].query, "https://acme.test");
        assert_eq!(records[0].title.as_deref(), Some(URL_RECORD_TITLE));
        assert_eq!(records[0].description.as_deref(), Some("Emails: hello@acme.test"));
    }

    #[tokio::test]
    async fn test_scrape_url_seed_failure_keeps_record() {
        let fetcher = StaticFetcher::new()
            .with_error("https://down.test", FetchError::timeout("https://down.test"));
        let pipeline: LeadPipeline<_, ScriptedChatClient> =
            LeadPipeline::without_enrichment(EmailExtractor::new(fetcher));

        let records = pipeline.scrape("https://down.test").await;

        assert_eq!(records.len(), 1);
        assert!(records[0].emails.is_empty());
        assert_eq!(records[0].description.as_deref(), Some("Emails: "));
    }

    #[tokio::test]
    async fn test_scrape_query_uses_search_source() {
        let fetcher = StaticFetcher::new()
            .with_page("https://one.test", "one@one.test")
            .with_page("https://two.test", "two@two.test");
        let search = StaticSearchSource::new(vec![
            SearchHit::new("https://one.test").with_title("One"),
            SearchHit::new("https://two.test").with_description("Second"),
            SearchHit::default().with_title("No link"),
        ]);
        let pipeline: LeadPipeline<_, ScriptedChatClient> =
            LeadPipeline::without_enrichment(EmailExtractor::new(fetcher))
                .with_search_source(Arc::new(search));

        let records = pipeline.scrape("plumbers leeds").await;

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.query == "plumbers leeds"));
        assert!(records[0].emails.contains("one@one.test"));
        assert_eq!(records[1].description.as_deref(), Some("Second"));
        assert!(records[2].emails.is_empty());
        assert_eq!(pipeline.extractor().fetcher().call_count(), 2);
    }

    #[tokio::test]
    async fn test_scrape_query_search_failure_is_empty() {
        let mut search = MockSearchSource::new();
        search
            .expect_search()
            .times(1)
            .returning(|_| Err(LeadscoutError::Search("blocked".to_string())));
        let pipeline: LeadPipeline<_, ScriptedChatClient> =
            LeadPipeline::without_enrichment(EmailExtractor::new(StaticFetcher::new()))
                .with_search_source(Arc::new(search));

        assert!(pipeline.scrape("dentists").await.is_empty());
    }

    #[tokio::test]
    async fn test_scrape_query_without_search_source() {
        let pipeline: LeadPipeline<_, ScriptedChatClient> =
            LeadPipeline::without_enrichment(EmailExtractor::new(StaticFetcher::new()));
        assert!(pipeline.scrape("dentists").await.is_empty());
    }

    #[tokio::test]
    async fn test_run_enriches_and_saves() {
        let fetcher = StaticFetcher::new().with_page("https://acme.test", "sales@acme.test");
        let client = ScriptedChatClient::new().then_ok("Busy regional supplier");
        let pipeline = LeadPipeline::new(
            EmailExtractor::new(fetcher),
            EnrichmentRetrier::new(client, quick_policy()),
        );
        let mut store = LeadStore::open_in_memory().unwrap();

        let summary = pipeline.run("https://acme.test", &mut store).await;

        assert_eq!(summary.input_kind, InputKind::Url);
        assert_eq!(summary.records_scraped, 1);
        assert_eq!(summary.records_enriched, 1);
        assert_eq!(summary.enrichment_failures, 0);
        assert!(summary.is_saved());

        let saved = store.get(summary.saved_ids[0]).unwrap().unwrap();
        assert_eq!(saved.ai_insights.as_deref(), Some("Busy regional supplier"));
        assert!(saved.emails.contains("sales@acme.test"));
    }

    #[tokio::test]
    async fn test_run_counts_enrichment_failures() {
        let fetcher = StaticFetcher::new().with_page("https://acme.test", "");
        let client = ScriptedChatClient::new()
            .with_fallback(Err(crate::errors::EnrichmentError::EmptyResponse));
        let pipeline = LeadPipeline::new(
            EmailExtractor::new(fetcher),
            EnrichmentRetrier::new(client, quick_policy()),
        );
        let mut store = LeadStore::open_in_memory().unwrap();

        let summary = pipeline.run("https://acme.test", &mut store).await;

        assert_eq!(summary.enrichment_failures, 1);
        assert_eq!(summary.saved_ids.len(), 1);
        let saved = store.get(summary.saved_ids[0]).unwrap().unwrap();
        assert_eq!(saved.ai_insights.as_deref(), Some(FAILURE_SENTINEL));
    }

    #[tokio::test]
    async fn test_run_without_enrichment() {
        let fetcher = StaticFetcher::new().with_page("https://acme.test", "a@acme.test");
        let pipeline: LeadPipeline<_, ScriptedChatClient> =
            LeadPipeline::without_enrichment(EmailExtractor::new(fetcher));
        let mut store = LeadStore::open_in_memory().unwrap();

        let summary = pipeline.run("https://acme.test", &mut store).await;

        assert!(pipeline.retrier().is_none());
        assert_eq!(summary.records_enriched, 0);
        let saved = store.fetch_all().unwrap();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].ai_insights.is_none());
    }

    #[test]
    fn test_summary_serialization() {
        let mut summary = PipelineSummary::start(InputKind::Query);
        summary.saved_ids = vec![4, 5];
        summary.records_scraped = 2;
        assert!(summary.is_saved());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["input_kind"], "query");
        assert_eq!(json["saved_ids"], serde_json::json!([4, 5]));

        summary.store_error = Some("disk full".to_string());
        assert!(!summary.is_saved());
    }
}
