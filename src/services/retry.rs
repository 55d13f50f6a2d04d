//! Retry policy
//!
//! One bounded loop shared by every orchestrator operation.

use crate::config::{EventHooks, RetryConfig};
use crate::utils::error::AppResult;
use crate::utils::metrics::Metrics;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry discipline applied around a single logical call
///
/// - content and generic API errors: up to `max_retries` more attempts with
///   exponential backoff, then the original error;
/// - upstream rate limits: wait and try again without spending an attempt;
/// - everything else: returned immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Total attempts allowed for content and API errors
    pub fn max_attempts(&self) -> u32 {
        self.config.max_retries + 1
    }

    /// Run `call` until it succeeds or fails terminally
    ///
    /// `call` receives the 0-based attempt number.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        hooks: &dyn EventHooks,
        metrics: &Metrics,
        mut call: F,
    ) -> AppResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt: u32 = 0;

        loop {
            let error = match call(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("{} succeeded after {} retries", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if error.is_rate_limit() {
                let wait = self.rate_limit_wait(error.retry_after());
                warn!("{} hit the upstream rate limit, waiting {}ms", operation, wait.as_millis());
                hooks.on_rate_limit(wait);
                metrics.record_rate_limit();
                tokio::time::sleep(wait).await;
                continue;
            }

            if !error.is_retryable() || attempt >= self.config.max_retries {
                return Err(error);
            }

            let delay = self.config.delay_for(attempt);
            warn!(
                "{} failed: {}. Retrying after {}ms (attempt {}/{})",
                operation,
                error.error_type(),
                delay.as_millis(),
                attempt + 1,
                self.config.max_retries
            );
            metrics.record_retry();
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn rate_limit_wait(&self, suggested: Option<Duration>) -> Duration {
        let cap = Duration::from_millis(self.config.max_delay_ms);
        suggested.unwrap_or_else(|| self.config.rate_limit_delay()).min(cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoopHooks;
    use crate::utils::error::{helpers, AppError};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_retries,
            base_delay_ms: 1,
            delays_ms: Vec::new(),
            max_delay_ms: 10,
            rate_limit_delay_ms: 1,
        })
    }

    #[tokio::test]
    async fn test_validation_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = fast_policy(3)
            .run("test", &NoopHooks, &Metrics::default(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(helpers::validation_error("bad input")) }
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limits_do_not_spend_attempts() {
        let calls = AtomicU32::new(0);
        let metrics = Metrics::default();
        let result = fast_policy(0)
            .run("test", &NoopHooks, &metrics, |attempt| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 3 {
                        Err(AppError::RateLimit { retry_after: None })
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(metrics.snapshot().rate_limit_waits, 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_original_error() {
        let result: AppResult<()> = fast_policy(2)
            .run("test", &NoopHooks, &Metrics::default(), |_| async {
                Err(AppError::EmptySummary { raw: "{}".to_string() })
            })
            .await;

        assert!(matches!(result, Err(AppError::EmptySummary { .. })));
    }
}
