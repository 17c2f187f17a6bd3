//! Global `tracing` subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::errors::LeadscoutError;

/// Builds the event filter. `RUST_LOG` wins over the configured directive.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LeadscoutError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| LeadscoutError::Logging(format!("invalid filter {:?}: {e}", config.filter))),
    }
}

/// Installs the global subscriber.
///
/// Returns an error rather than panicking when a subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), LeadscoutError> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| LeadscoutError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_error() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            filter: "leadscout=notalevel".to_string(),
            json: false,
        };
        assert!(matches!(build_filter(&config), Err(LeadscoutError::Logging(_))));
    }

    #[test]
    fn test_second_init_is_error_not_panic() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
