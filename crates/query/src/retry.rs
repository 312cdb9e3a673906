use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::GeneratorConfig;

/// Bounded exponential backoff for calls to the generation service.
pub struct RetryPolicy {
    max_retries: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.max_retries, config.initial_backoff_ms, config.max_backoff_ms)
    }

    /// Delay before the retry that follows `failures` failed attempts.
    fn backoff(&self, failures: usize) -> Duration {
        let factor = u32::try_from(failures)
            .ok()
            .and_then(|n| 1u32.checked_shl(n))
            .unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }

    /// Run `call` until it succeeds, fails with an error `is_retryable`
    /// rejects, or `max_retries` retries are spent.
    pub async fn retry<F, Fut, T, E, P>(
        &self,
        operation: &str,
        mut call: F,
        is_retryable: P,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let mut failures = 0;

        loop {
            let error = match call().await {
                Ok(value) => {
                    if failures > 0 {
                        info!(operation, attempts = failures + 1, "Operation recovered after retries");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !is_retryable(&error) {
                warn!(operation, error = %error, "Operation failed permanently, not retrying");
                return Err(error);
            }
            if failures >= self.max_retries {
                warn!(operation, attempts = failures + 1, error = %error, "Operation failed after max retries");
                return Err(error);
            }

            let delay = self.backoff(failures);
            failures += 1;
            warn!(
                operation,
                attempt = failures,
                max_retries = self.max_retries,
                backoff_ms = delay.as_millis() as u64,
                error = %error,
                "Operation failed, retrying"
            );
            sleep(delay).await;
        }
    }
}
