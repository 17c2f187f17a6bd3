//! Error types for leadscout.
//!
//! Each component has its own error enum; `LeadscoutError` is the umbrella
//! type used where several components meet (pipeline, configuration loading).

use thiserror::Error;

/// The main error type for leadscout operations.
#[derive(Debug, Error)]
pub enum LeadscoutError {
    /// A page fetch failed.
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// The enrichment endpoint failed.
    #[error("{0}")]
    Enrichment(#[from] EnrichmentError),

    /// The lead store failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The search collaborator failed.
    #[error("Search error: {0}")]
    Search(String),

    /// Logging could not be initialised.
    #[error("Logging setup error: {0}")]
    Logging(String),
}

/// Errors raised while fetching a page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// DNS, connection or protocol failure.
    #[error("Network error fetching {url}: {message}")]
    Network {
        /// The requested URL.
        url: String,
        /// Underlying error text.
        message: String,
    },

    /// The request did not finish within the configured timeout.
    #[error("Timed out fetching {url}")]
    Timeout {
        /// The requested URL.
        url: String,
    },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} fetching {url}")]
    Status {
        /// The requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The response body could not be read as text.
    #[error("Failed to read body of {url}: {message}")]
    Body {
        /// The requested URL.
        url: String,
        /// Underlying error text.
        message: String,
    },

    /// The URL is not an absolute http(s) URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Creates a network error.
    #[must_use]
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a status error.
    #[must_use]
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Short machine-readable kind, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::Status { .. } => "status",
            Self::Body { .. } => "body",
            Self::InvalidUrl(_) => "invalid_url",
        }
    }
}

/// Errors raised by the text-generation endpoint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnrichmentError {
    /// Transport failure talking to the endpoint.
    #[error("Enrichment request failed: {0}")]
    Network(String),

    /// The endpoint answered with an error status.
    #[error("Enrichment API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error body returned by the endpoint.
        message: String,
    },

    /// The response body was not the expected shape.
    #[error("Failed to parse enrichment response: {0}")]
    Parse(String),

    /// The endpoint returned no choices.
    #[error("Enrichment endpoint returned no content")]
    EmptyResponse,

    /// The client is missing required configuration.
    #[error("Enrichment client misconfigured: {0}")]
    Config(String),
}

/// Errors raised by the lead store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite reported an error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database directory could not be created.
    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value is missing.
    #[error("Missing configuration value: {0}")]
    Missing(String),

    /// A value could not be interpreted.
    #[error("Invalid value for {key}: {value}")]
    Invalid {
        /// The configuration key.
        key: String,
        /// The offending value.
        value: String,
    },

    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates an invalid-value error.
    #[must_use]
    pub fn invalid(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            value: value.into(),
        }
    }
}
