//! Lead records and the values that flow between extractor, enrichment and store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Placeholder substituted for a missing title when building prompts.
pub const TITLE_PLACEHOLDER: &str = "No title available";

/// Placeholder substituted for a missing description when building prompts.
pub const DESCRIPTION_PLACEHOLDER: &str = "No description available";

/// Placeholder substituted for a missing URL when building prompts.
pub const URL_PLACEHOLDER: &str = "N/A";

/// Title given to records produced from a URL input.
pub const URL_RECORD_TITLE: &str = "Scraped from URL";

/// Separator used when emails are flattened to a single string.
pub const EMAIL_SEPARATOR: &str = ", ";

/// One discovered lead.
///
/// A record is a plain value owned by the caller until it is saved; the store
/// assigns `id` on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    /// Store-assigned id; `None` until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Original search or input string.
    pub query: String,
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// Primary source URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Free text summary.
    #[serde(default)]
    pub description: Option<String>,
    /// Unique email addresses found for this lead.
    #[serde(default)]
    pub emails: BTreeSet<String>,
    /// Enrichment output or the failure sentinel.
    #[serde(default)]
    pub ai_insights: Option<String>,
}

impl LeadRecord {
    /// Creates an empty record for a query.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Creates the record produced when the input itself is a URL.
    #[must_use]
    pub fn from_url(
        query: impl Into<String>,
        url: impl Into<String>,
        emails: BTreeSet<String>,
    ) -> Self {
        let description = format!("Emails: {}", join_emails(&emails));
        Self {
            id: None,
            query: query.into(),
            title: Some(URL_RECORD_TITLE.to_string()),
            url: Some(url.into()),
            description: Some(description),
            emails,
            ai_insights: None,
        }
    }

    /// Creates a record from a search hit and the emails found at its URL.
    #[must_use]
    pub fn from_hit(query: impl Into<String>, hit: SearchHit, emails: BTreeSet<String>) -> Self {
        Self {
            id: None,
            query: query.into(),
            title: hit.title,
            url: hit.url,
            description: hit.description,
            emails,
            ai_insights: None,
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds emails.
    #[must_use]
    pub fn with_emails<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emails.extend(emails.into_iter().map(Into::into));
        self
    }

    /// Title, or the placeholder when absent.
    #[must_use]
    pub fn title_or_placeholder(&self) -> &str {
        self.title.as_deref().unwrap_or(TITLE_PLACEHOLDER)
    }

    /// Description, or the placeholder when absent.
    #[must_use]
    pub fn description_or_placeholder(&self) -> &str {
        self.description.as_deref().unwrap_or(DESCRIPTION_PLACEHOLDER)
    }

    /// URL, or the placeholder when absent.
    #[must_use]
    pub fn url_or_placeholder(&self) -> &str {
        self.url.as_deref().unwrap_or(URL_PLACEHOLDER)
    }

    /// Whether the description still needs a real value.
    #[must_use]
    pub fn has_placeholder_description(&self) -> bool {
        self.description_or_placeholder() == DESCRIPTION_PLACEHOLDER
    }

    /// Emails joined with `", "`.
    #[must_use]
    pub fn emails_joined(&self) -> String {
        join_emails(&self.emails)
    }
}

fn join_emails(emails: &BTreeSet<String>) -> String {
    emails
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(EMAIL_SEPARATOR)
}

/// Splits a joined email string back into a set, dropping empty segments.
#[must_use]
pub fn parse_emails(joined: &str) -> BTreeSet<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// A single result returned by a search collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result title.
    pub title: Option<String>,
    /// Result URL.
    pub url: Option<String>,
    /// Result snippet.
    pub description: Option<String>,
}

impl SearchHit {
    /// Creates a hit pointing at a URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// How a raw input string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// The input is a URL to crawl directly.
    Url,
    /// The input is a search query for the search collaborator.
    Query,
}

impl InputKind {
    /// Classifies trimmed input by its scheme prefix.
    #[must_use]
    pub fn classify(input: &str) -> Self {
        if input.trim().starts_with("http") {
            Self::Url
        } else {
            Self::Query
        }
    }

    /// Returns the kind as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Query => "query",
        }
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
