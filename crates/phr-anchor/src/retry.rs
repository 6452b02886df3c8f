//! Caller-side retry with exponential backoff.
//!
//! The anchoring core never retries. Callers that want to can wrap a whole
//! anchor attempt in [`retry_connectivity()`]: each retry re-runs the full
//! live path, so it picks up a fresh nonce and gas price. Only
//! `Connectivity` errors are retried; configuration, serialization and
//! fatal errors are returned on first occurrence, and so is
//! `ConnectivityError::Unconfirmed`, since the node may already hold the
//! transaction.

use std::future::Future;
use std::time::Duration;

use crate::error::AnchorError;

/// Retry schedule. Delays double on each attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first. Zero disables retrying.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    /// 3 retries at 200ms, 400ms, 800ms.
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retry number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy is exhausted.
pub async fn retry_connectivity<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, AnchorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AnchorError>>,
{
    for attempt in 0..policy.max_retries {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    "anchor attempt failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
    // Final attempt, no more retries.
    op().await
}
