//! Application configuration.
//!
//! Values come from built-in defaults, an optional JSON file, and environment
//! variables (a `.env` file is honoured), applied in that order.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::crawl::{timeout_from_secs, CrawlConfig};
use crate::enrichment::{BackoffStrategy, RetryPolicy, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::errors::ConfigError;

/// Environment variable holding the enrichment API key.
pub const ENV_API_KEY: &str = "GROQ_API_KEY";
/// Environment variable overriding the enrichment model.
pub const ENV_MODEL: &str = "LEADSCOUT_MODEL";
/// Environment variable overriding the database path.
pub const ENV_DB_PATH: &str = "LEADSCOUT_DB_PATH";
/// Environment variable overriding the link budget.
pub const ENV_MAX_LINKS: &str = "LEADSCOUT_MAX_LINKS";
/// Environment variable overriding the fetch timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "LEADSCOUT_TIMEOUT_SECS";
/// Environment variable overriding the enrichment attempt budget.
pub const ENV_RETRY_ATTEMPTS: &str = "LEADSCOUT_RETRY_ATTEMPTS";
/// Environment variable overriding the delay between enrichment attempts.
pub const ENV_RETRY_DELAY_MS: &str = "LEADSCOUT_RETRY_DELAY_MS";
/// Environment variable selecting the backoff between enrichment attempts.
pub const ENV_RETRY_BACKOFF: &str = "LEADSCOUT_RETRY_BACKOFF";
/// Environment variable overriding the log filter.
pub const ENV_LOG: &str = "LEADSCOUT_LOG";
/// Environment variable switching on JSON logs.
pub const ENV_LOG_JSON: &str = "LEADSCOUT_LOG_JSON";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadscoutConfig {
    /// Crawl settings.
    #[serde(default)]
    pub crawl: CrawlConfig,
    /// Enrichment settings.
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    /// Store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Enrichment endpoint and retry settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// API key for the chat endpoint.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Endpoint base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Total attempts per record.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Flat delay between attempts in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// How the delay grows between attempts.
    #[serde(default)]
    pub backoff: BackoffStrategy,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5000
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            backoff: BackoffStrategy::Constant,
        }
    }
}

impl std::fmt::Debug for EnrichmentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl EnrichmentConfig {
    /// Retry policy built from the attempt budget, delay and backoff.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_attempts(self.max_attempts)
            .with_delay_ms(self.retry_delay_ms)
            .with_backoff(self.backoff)
    }

    /// The API key, or `ConfigError::Missing` when unset or blank.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing(ENV_API_KEY.to_string()))
    }
}

/// Store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("leads.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    "leadscout=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

impl LeadscoutConfig {
    /// Reads configuration from a JSON file. Missing sections use defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make the crawler or retrier unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let seconds = self.crawl.fetch.timeout_seconds;
        if timeout_from_secs(seconds).is_none() {
            return Err(ConfigError::invalid(
                "crawl.fetch.timeout_seconds",
                seconds.to_string(),
            ));
        }
        if self.enrichment.max_attempts == 0 {
            return Err(ConfigError::invalid("enrichment.max_attempts", "0"));
        }
        Ok(())
    }

    /// Defaults overlaid with the process environment and any `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_process_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Loads an optional JSON file, then applies the environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_process_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_process_env(&mut self) -> Result<(), ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Ignoring unreadable .env file");
            }
        }
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env<L>(&mut self, lookup: L) -> Result<(), ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.enrichment.api_key = Some(key);
        }
        if let Some(model) = get(ENV_MODEL) {
            self.enrichment.model = model;
        }
        if let Some(path) = get(ENV_DB_PATH) {
            self.store.path = PathBuf::from(path);
        }
        if let Some(value) = get(ENV_MAX_LINKS) {
            self.crawl.extraction.max_links = parse_value(ENV_MAX_LINKS, &value)?;
        }
        if let Some(value) = get(ENV_TIMEOUT_SECS) {
            let seconds: f64 = parse_value(ENV_TIMEOUT_SECS, &value)?;
            if timeout_from_secs(seconds).is_none() {
                return Err(ConfigError::invalid(ENV_TIMEOUT_SECS, value));
            }
            self.crawl.fetch.timeout_seconds = seconds;
        }
        if let Some(value) = get(ENV_RETRY_ATTEMPTS) {
            let attempts: u32 = parse_value(ENV_RETRY_ATTEMPTS, &value)?;
            if attempts == 0 {
                return Err(ConfigError::invalid(ENV_RETRY_ATTEMPTS, value));
            }
            self.enrichment.max_attempts = attempts;
        }
        if let Some(value) = get(ENV_RETRY_DELAY_MS) {
            self.enrichment.retry_delay_ms = parse_value(ENV_RETRY_DELAY_MS, &value)?;
        }
        if let Some(value) = get(ENV_RETRY_BACKOFF) {
            self.enrichment.backoff = parse_value(ENV_RETRY_BACKOFF, &value)?;
        }
        if let Some(filter) = get(ENV_LOG) {
            self.logging.filter = filter;
        }
        if let Some(value) = get(ENV_LOG_JSON) {
            self.logging.json = parse_flag(ENV_LOG_JSON, &value)?;
        }

        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, value))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, value)),
    }
}
