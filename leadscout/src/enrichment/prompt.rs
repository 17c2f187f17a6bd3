//! Prompt construction for lead enrichment.

use crate::model::LeadRecord;

/// Instruction line that opens every enrichment prompt.
pub const PROMPT_PREAMBLE: &str = "Analyze the following data and provide actionable insights:";

/// Builds the single user prompt sent for a record.
#[must_use]
pub fn build_prompt(record: &LeadRecord) -> String {
    format!(
        "{PROMPT_PREAMBLE}\nTitle: {}\nDescription: {}\nURL: {}",
        record.title_or_placeholder(),
        record.description_or_placeholder(),
        record.url_or_placeholder(),
    )
}

/// First line of an insight, used to backfill a missing description.
#[must_use]
pub fn first_line(insight: &str) -> &str {
    // CRLF responses keep no trailing '\r' in the stored description.
    insight.split('\n').next().unwrap_or_default().trim_end_matches('\r')
}
