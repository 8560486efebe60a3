//! Retry with bounded exponential backoff.
//!
//! [`RetryPolicy`] turns the configured values into a `backon` exponential
//! schedule and plugs the [`FetchError`] classification into it. A
//! `Retry-After` from the server replaces the computed delay.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::error::{AppError, FailureKind, FetchError, Result};
use crate::models::RetryConfig;

/// Backoff policy for a single page fetch.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Retry non-429 4xx responses too
    pub retry_client_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            retry_client_errors: config.retry_client_errors,
        }
    }

    /// Delay after failed attempt `n` is `base * 2^(n-1)`, capped at `max_delay`.
    ///
    /// The first attempt is not a retry, so the schedule holds
    /// `max_attempts - 1` delays.
    #[must_use]
    pub fn backoff(&self) -> ExponentialBuilder {
        let retries = self.max_attempts.max(1) - 1;
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_factor(2.0)
            .with_max_delay(self.max_delay)
            .with_max_times(retries as usize)
    }

    pub fn should_retry(&self, error: &FetchError) -> bool {
        match error.kind() {
            FailureKind::Transient | FailureKind::RateLimited | FailureKind::ServerError => true,
            FailureKind::ClientError => {
                self.retry_client_errors && !matches!(error, FetchError::InvalidRequest(_))
            }
            FailureKind::Decode => false,
        }
    }

    /// Run one fetch under this policy, converting exhaustion into an [`AppError`].
    pub async fn run<T, F, Fut>(&self, context: impl fmt::Display, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, FetchError>>,
    {
        let attempts = AtomicU32::new(0);
        let context = context.to_string();

        let attempt = || {
            attempts.fetch_add(1, Ordering::SeqCst);
            operation()
        };

        attempt
            .retry(self.backoff())
            .sleep(tokio::time::sleep)
            .when(|e| self.should_retry(e))
            // Only while budget remains; a `None` here ends the retries.
            .adjust(|e, delay| delay.map(|d| e.retry_after().unwrap_or(d)))
            .notify(|err, delay| {
                log::warn!(
                    "{}: attempt {}/{} failed: {}. Retrying in {:?}",
                    context,
                    attempts.load(Ordering::SeqCst),
                    self.max_attempts,
                    err,
                    delay
                );
            })
            .await
            .map_err(|error| AppError::fetch(&context, attempts.load(Ordering::SeqCst), error))
    }
}
