//! Per-record enrichment with a bounded retry budget.

use serde::{Deserialize, Serialize};

use super::client::ChatClient;
use super::prompt::{build_prompt, first_line};
use super::retry::{retry_async, RetryPolicy};
use crate::errors::EnrichmentError;
use crate::model::LeadRecord;

/// Value stored in `ai_insights` when every attempt fails.
pub const FAILURE_SENTINEL: &str = "Unable to generate insights.";

/// How enrichment of one record went.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentReport {
    /// Attempts made, including the successful one.
    pub attempts: u32,
    /// Whether a real insight was produced.
    pub success: bool,
    /// Last error message when every attempt failed.
    pub last_error: Option<String>,
    /// Whether the description was backfilled from the insight.
    pub description_backfilled: bool,
}

/// Wraps a chat client with the retry policy and the sentinel fallback.
#[derive(Debug, Clone)]
pub struct EnrichmentRetrier<C> {
    client: C,
    policy: RetryPolicy,
}

impl<C: ChatClient> EnrichmentRetrier<C> {
    /// Creates a retrier with an explicit policy.
    #[must_use]
    pub fn new(client: C, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Creates a retrier with the default policy (3 attempts, 5s flat).
    #[must_use]
    pub fn with_default_policy(client: C) -> Self {
        Self::new(client, RetryPolicy::default())
    }

    /// The underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Enriches one record. Never fails; exhaustion yields the sentinel.
    pub async fn enrich(&self, record: LeadRecord) -> LeadRecord {
        self.enrich_with_report(record).await.0
    }

    /// Enriches one record and reports how it went.
    pub async fn enrich_with_report(&self, mut record: LeadRecord) -> (LeadRecord, EnrichmentReport) {
        let prompt = build_prompt(&record);
        let prompt = prompt.as_str();
        let client = &self.client;

        let outcome = retry_async(&self.policy, move |attempt| async move {
            tracing::debug!(attempt, model = %client.model(), "Requesting insights");
            let text = client.complete(prompt).await?;
            Ok::<_, EnrichmentError>(text.trim().to_string())
        })
        .await;

        let mut report = EnrichmentReport {
            attempts: outcome.attempts,
            ..Default::default()
        };

        match outcome.result {
            Ok(insight) => {
                if record.has_placeholder_description() {
                    record.description = Some(first_line(&insight).to_string());
                    report.description_backfilled = true;
                }
                record.ai_insights = Some(insight);
                report.success = true;
            }
            Err(err) => {
                tracing::warn!(
                    url = %record.url_or_placeholder(),
                    attempts = outcome.attempts,
                    error = %err,
                    "Enrichment failed, using sentinel"
                );
                record.ai_insights = Some(FAILURE_SENTINEL.to_string());
                report.last_error = Some(err.to_string());
            }
        }

        (record, report)
    }

    /// Enriches records one after another. A failed record never stops the batch.
    pub async fn enrich_all(&self, records: Vec<LeadRecord>) -> Vec<LeadRecord> {
        let mut enriched = Vec::with_capacity(records.len());
        for record in records {
            enriched.push(self.enrich(record).await);
        }
        enriched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::client::MockChatClient;
    use crate::model::DESCRIPTION_PLACEHOLDER;
    use crate::testing::ScriptedChatClient;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn network_error() -> EnrichmentError {
        EnrichmentError::Network("connection reset".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds() {
        let client = ScriptedChatClient::new()
            .then_err(network_error())
            .then_err(network_error())
            .then_ok("  Strong local brand\nMore detail  ")
            .then_ok("never requested");
        let retrier = EnrichmentRetrier::with_default_policy(client);
        let start = tokio::time::Instant::now();

        let (record, report) = retrier
            .enrich_with_report(LeadRecord::new("q").with_title("Acme"))
            .await;

        assert_eq!(retrier.client().call_count(), 3);
        assert_eq!(report.attempts, 3);
        assert!(report.success);
        assert_eq!(
            record.ai_insights.as_deref(),
            Some("Strong local brand\nMore detail")
        );
        assert_eq!(record.description.as_deref(), Some("Strong local brand"));
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_fails_sets_sentinel() {
        let client = ScriptedChatClient::new().with_fallback(Err(network_error()));
        let retrier = EnrichmentRetrier::with_default_policy(client);
        let start = tokio::time::Instant::now();

        let original = LeadRecord::new("q").with_url("https://acme.test");
        let (record, report) = retrier.enrich_with_report(original.clone()).await;

        assert_eq!(retrier.client().call_count(), 3);
        assert_eq!(record.ai_insights.as_deref(), Some(FAILURE_SENTINEL));
        assert_eq!(record.description, original.description);
        assert!(!report.success);
        assert_eq!(report.last_error, Some(network_error().to_string()));
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let client = ScriptedChatClient::new().then_ok("first").then_ok("second");
        let retrier = EnrichmentRetrier::with_default_policy(client);

        let record = retrier.enrich(LeadRecord::new("q")).await;

        assert_eq!(retrier.client().call_count(), 1);
        assert_eq!(record.ai_insights.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_existing_description_kept() {
        let client = ScriptedChatClient::new().then_ok("Insight line\nrest");
        let retrier = EnrichmentRetrier::with_default_policy(client);

        let record = retrier
            .enrich(LeadRecord::new("q").with_description("Family bakery"))
            .await;
        assert_eq!(record.description.as_deref(), Some("Family bakery"));

        let client = ScriptedChatClient::new().then_ok("Insight line\nrest");
        let retrier = EnrichmentRetrier::with_default_policy(client);
        let record = retrier
            .enrich(LeadRecord::new("q").with_description(DESCRIPTION_PLACEHOLDER))
            .await;
        assert_eq!(record.description.as_deref(), Some("Insight line"));
    }

    #[tokio::test]
    async fn test_prompt_sent_to_client() {
        let client = ScriptedChatClient::new().then_ok("ok");
        let retrier = EnrichmentRetrier::with_default_policy(client);
        let record = LeadRecord::new("q")
            .with_title("Acme")
            .with_url("https://acme.test");

        retrier.enrich(record.clone()).await;

        assert_eq!(retrier.client().prompts(), vec![build_prompt(&record)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_response_is_stored_without_retry() {
        let client = ScriptedChatClient::new().then_ok("   ").then_ok("real");
        let retrier = EnrichmentRetrier::with_default_policy(client);
        let start = tokio::time::Instant::now();

        let (record, report) = retrier.enrich_with_report(LeadRecord::new("q")).await;

        assert_eq!(retrier.client().call_count(), 1);
        assert_eq!(report.attempts, 1);
        assert!(report.success);
        assert_eq!(record.ai_insights.as_deref(), Some(""));
        assert_eq!(record.description.as_deref(), Some(""));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrich_all_continues_after_failure() {
        let client = ScriptedChatClient::new()
            .then_err(network_error())
            .then_err(network_error())
            .then_err(network_error())
            .then_ok("second record insight");
        let retrier = EnrichmentRetrier::with_default_policy(client);

        let records = retrier
            .enrich_all(vec![LeadRecord::new("a"), LeadRecord::new("b")])
            .await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ai_insights.as_deref(), Some(FAILURE_SENTINEL));
        assert_eq!(records[1].ai_insights.as_deref(), Some("second record insight"));
    }

    #[tokio::test]
    async fn test_with_mock_client() {
        let mut mock = MockChatClient::new();
        mock.expect_model().return_const("mock-model".to_string());
        mock.expect_complete()
            .times(1)
            .returning(|_| Ok("Mocked insight".to_string()));

        let retrier = EnrichmentRetrier::new(mock, RetryPolicy::new().with_delay_ms(0));
        let record = retrier.enrich(LeadRecord::new("q")).await;

        assert_eq!(record.ai_insights.as_deref(), Some("Mocked insight"));
    }
}
