//! Bounded retry policy for provider calls

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use super::error::GenerationError;

/// Exponential backoff applied to retryable provider failures only
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first call
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay_ms: u64,
    /// Maximum delay between retries
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 250,
            max_delay_ms: 4000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn with_initial_delay(mut self, ms: u64) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    pub fn with_max_delay(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Delay before retry number `attempt` (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(self.initial_delay_ms.min(self.max_delay_ms));
        }

        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay_ms = delay.min(self.max_delay_ms as f64) as u64;

        Duration::from_millis(delay_ms)
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or the retry budget is spent.
    pub async fn run<T, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, GenerationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let delay = self.delay_for_attempt(attempt);

                    warn!(
                        operation = %operation_name,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error_kind = %err.kind(),
                        "Provider call failed, retrying"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_retry_delay_calculation() {
        let policy = RetryPolicy::new(3)
            .with_initial_delay(100)
            .with_backoff_multiplier(2.0)
            .with_max_delay(500);

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(2);

        let result = policy
            .run("test", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(GenerationError::status("openai", 503, "busy"))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_budget() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(1);

        let result: Result<(), _> = policy
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GenerationError::transport("openai", "connection reset"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_does_not_retry_malformed() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(5);

        let result: Result<(), _> = policy
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GenerationError::malformed("not json"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
