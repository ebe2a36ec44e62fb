//! Rate-limited retry boundary around generation calls.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use pagepilot_protocols::{GenerationError, ProviderError};

use crate::rate_limit::RateLimiter;

/// Attempt ceiling and backoff shape for one provider.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Extra attempts after the first.
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Ceiling for both computed backoff and server `retry-after` waits.
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Spread each delay by up to 10% either way.
    pub jitter: bool,
    /// Deadline for a single attempt; `None` waits on the provider alone.
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
            attempt_timeout: Some(Duration::from_secs(90)),
        }
    }
}

impl RetryConfig {
    /// `base_delay * multiplier^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let capped_ms = (base_ms * self.backoff_multiplier.powi(attempt as i32))
            .min(self.max_delay.as_millis() as f64);

        let spread = if self.jitter { jitter(capped_ms * 0.1) } else { 0.0 };
        Duration::from_millis((capped_ms + spread).max(0.0) as u64)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Uniform-ish value in `[-max, max]` from the clock's sub-second nanos.
fn jitter(max: f64) -> f64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos as f64 / u32::MAX as f64) * max * 2.0 - max
}

/// Transient failures worth another attempt. Auth and request errors are
/// final.
pub fn is_retryable(error: &ProviderError) -> bool {
    match error {
        ProviderError::RateLimited { .. }
        | ProviderError::Network(_)
        | ProviderError::Timeout(_) => true,
        ProviderError::ApiError { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
        _ => false,
    }
}

/// Every generation call passes through here.
///
/// The limiter is shared by all providers and requests. Each attempt first
/// takes one request from the budget; a denied attempt counts against the
/// retry ceiling like a 429 would.
pub struct CallGate {
    limiter: Arc<RateLimiter>,
    retry: RetryConfig,
}

impl CallGate {
    pub fn new(limiter: Arc<RateLimiter>, retry: RetryConfig) -> Self {
        Self { limiter, retry }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Run `operation` for `provider` with rate limiting and retry.
    ///
    /// Fails with [`GenerationError::RateLimitExceeded`] when the last failed
    /// attempt was a rate limit (local budget or remote 429), otherwise with
    /// [`GenerationError::GenerationFailed`].
    pub async fn call<F, Fut, T>(&self, provider: &str, operation: F) -> Result<T, GenerationError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.retry.max_retries {
            let error = match self.limiter.try_acquire() {
                Err(wait) => {
                    debug!("Rate limit budget exhausted for {}, window resets in {:?}", provider, wait);
                    ProviderError::RateLimited {
                        retry_after_seconds: wait.as_secs(),
                    }
                }
                Ok(()) => match self.attempt(&operation).await {
                    Ok(result) => return Ok(result),
                    Err(e) if !is_retryable(&e) => {
                        return Err(GenerationError::GenerationFailed {
                            provider: provider.to_string(),
                            source: e,
                        });
                    }
                    Err(e) => e,
                },
            };

            if attempt == self.retry.max_retries {
                last_error = Some(error);
                break;
            }

            let delay = self.backoff(attempt, &error);
            warn!(
                "Provider {} error (attempt {}/{}): {}, retrying in {:?}",
                provider,
                attempt + 1,
                self.retry.max_attempts(),
                error,
                delay
            );
            last_error = Some(error);
            sleep(delay).await;
        }

        match last_error {
            Some(e) if e.is_rate_limit() => Err(GenerationError::RateLimitExceeded {
                provider: provider.to_string(),
                attempts: self.retry.max_attempts(),
            }),
            Some(e) => Err(GenerationError::GenerationFailed {
                provider: provider.to_string(),
                source: e,
            }),
            None => Err(GenerationError::GenerationFailed {
                provider: provider.to_string(),
                source: ProviderError::Network("Unknown error".to_string()),
            }),
        }
    }

    async fn attempt<F, Fut, T>(&self, operation: &F) -> Result<T, ProviderError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        match self.retry.attempt_timeout {
            Some(limit) => timeout(limit, operation())
                .await
                .unwrap_or_else(|_| Err(ProviderError::Timeout(limit.as_secs()))),
            None => operation().await,
        }
    }

    /// Server-provided wait when present, exponential backoff otherwise.
    fn backoff(&self, attempt: u32, error: &ProviderError) -> Duration {
        match error {
            ProviderError::RateLimited {
                retry_after_seconds,
            } if *retry_after_seconds > 0 => {
                Duration::from_secs(*retry_after_seconds).min(self.retry.max_delay)
            }
            _ => self.retry.delay_for_attempt(attempt),
        }
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
