//! Bounded retry with a configurable delay between attempts.
//!
//! Every error is treated the same way; there is no transient/permanent
//! split. The delay is only slept between attempts, never after the last.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Backoff strategy for retry delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// delay = base (flat)
    #[default]
    Constant,
    /// delay = base * attempt
    Linear,
    /// delay = base * 2^(attempt - 1)
    Exponential,
}

impl std::str::FromStr for BackoffStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "constant" => Ok(Self::Constant),
            "linear" => Ok(Self::Linear),
            "exponential" => Ok(Self::Exponential),
            other => Err(format!("unknown backoff strategy: {other}")),
        }
    }
}

/// Retry budget and delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay between attempts in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Backoff strategy.
    #[serde(default)]
    pub backoff: BackoffStrategy,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    5000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
            backoff: BackoffStrategy::Constant,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the default budget (3 attempts, 5s flat).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total attempts. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the base delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Sets the backoff strategy.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay to sleep after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let millis = match self.backoff {
            BackoffStrategy::Constant => self.delay_ms,
            BackoffStrategy::Linear => self.delay_ms.saturating_mul(u64::from(attempt)),
            BackoffStrategy::Exponential => self
                .delay_ms
                .saturating_mul(2u64.saturating_pow(attempt - 1)),
        };
        Duration::from_millis(millis)
    }

    /// Sum of the delays slept when every attempt fails.
    #[must_use]
    pub fn total_delay_on_exhaustion(&self) -> Duration {
        (1..self.max_attempts.max(1)).map(|a| self.delay_for(a)).sum()
    }
}

/// Result of a retried operation and how many attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome<T, E> {
    /// Final result: the first success, or the last error.
    pub result: Result<T, E>,
    /// Attempts made.
    pub attempts: u32,
}

/// Runs `operation` until it succeeds or the policy's attempts are spent.
pub async fn retry_async<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt,
                }
            }
            Err(e) if attempt >= max_attempts => {
                tracing::debug!(attempt, error = %e, "Retry budget exhausted");
                return RetryOutcome {
                    result: Err(e),
                    attempts: attempt,
                };
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                tracing::debug!(
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "Retrying after error"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_ms, 5000);
        assert_eq!(policy.backoff, BackoffStrategy::Constant);
        assert_eq!(policy.total_delay_on_exhaustion(), Duration::from_secs(10));
    }

    #[test]
    fn test_policy_builder() {
        let policy = RetryPolicy::new()
            .with_max_attempts(0)
            .with_delay(Duration::from_millis(250))
            .with_backoff(BackoffStrategy::Linear);

        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay_ms, 250);
        assert_eq!(policy.total_delay_on_exhaustion(), Duration::ZERO);
    }

    #[test]
    fn test_constant_delay() {
        let policy = RetryPolicy::new().with_delay_ms(100);
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(5), Duration::from_millis(100));
    }

    #[test]
    fn test_linear_and_exponential_delay() {
        let linear = RetryPolicy::new()
            .with_delay_ms(100)
            .with_backoff(BackoffStrategy::Linear);
        assert_eq!(linear.delay_for(1), Duration::from_millis(100));
        assert_eq!(linear.delay_for(3), Duration::from_millis(300));

        let exponential = RetryPolicy::new()
            .with_delay_ms(100)
            .with_backoff(BackoffStrategy::Exponential);
        assert_eq!(exponential.delay_for(1), Duration::from_millis(100));
        assert_eq!(exponential.delay_for(2), Duration::from_millis(200));
        assert_eq!(exponential.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_from_str() {
        let parse = |s: &str| s.parse::<BackoffStrategy>();
        assert_eq!(parse("Linear"), Ok(BackoffStrategy::Linear));
        assert_eq!(parse(" exponential "), Ok(BackoffStrategy::Exponential));
        assert_eq!(parse("constant"), Ok(BackoffStrategy::Constant));
        assert!("jitter".parse::<BackoffStrategy>().is_err());
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let policy = RetryPolicy::new();
        let outcome: RetryOutcome<i32, String> = retry_async(&policy, |_| async { Ok(42) }).await;

        assert_eq!(outcome.result, Ok(42));
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_failures() {
        let policy = RetryPolicy::new();
        let start = tokio::time::Instant::now();

        let outcome: RetryOutcome<&str, String> = retry_async(&policy, |attempt| async move {
            if attempt < 3 {
                Err(format!("attempt {attempt}"))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(outcome.result, Ok("done"));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_failures_stop_at_budget() {
        let policy = RetryPolicy::new().with_max_attempts(3);
        let calls = Arc::new(AtomicU32::new(0));
        let start = tokio::time::Instant::now();

        let outcome: RetryOutcome<(), String> = retry_async(&policy, |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("always fails".to_string())
            }
        })
        .await;

        assert_eq!(outcome.result, Err("always fails".to_string()));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }
}
