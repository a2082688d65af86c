//! Retry policy and the retry-with-backoff combinator.
//!
//! Every provider call goes through [`retry_with_backoff`]. The policy
//! decides which errors are worth repeating and how long to wait between
//! attempts; the combinator knows nothing about providers.

use std::future::Future;
use std::time::Duration;

use log::debug;

use crate::errors::RateError;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Default ceiling for a single backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// How a failing call is repeated.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: u32,
    /// Delay before retry `n` is `base_delay * 2^(n-1)`.
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Which errors are repeated. Everything else is returned immediately.
    pub is_retryable: fn(&RateError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            is_retryable: RateError::is_retryable,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once.
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff before retry number `retry` (1-based), capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        2u32.checked_pow(retry.saturating_sub(1))
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// The final result of a retried call and how many retries it took.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T, RateError>,
    pub retries: u32,
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy runs out of retries.
///
/// `op` receives the 1-based attempt number. `label` only appears in logs.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, RateError>>,
{
    let mut retries = 0;
    loop {
        match op(retries + 1).await {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    retries,
                }
            }
            Err(e) if retries < policy.max_retries && (policy.is_retryable)(&e) => {
                retries += 1;
                let delay = policy.delay_for(retries);
                debug!(
                    "{} failed: {}. Retry {}/{} in {:?}",
                    label, e, retries, policy.max_retries, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return RetryOutcome {
                    result: Err(e),
                    retries,
                }
            }
        }
    }
}
