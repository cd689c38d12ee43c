//! Retry for transient provider failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{ParleyError, Result};

/// Exponential backoff with jitter, used around model calls.
///
/// Only errors reporting [`ParleyError::is_retryable`] are retried. A rate
/// limit that names its own delay overrides the computed backoff (capped at
/// `max_backoff`).
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;

        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if attempt >= attempts || !err.is_retryable() {
                return Err(err);
            }

            let delay = match &err {
                ParleyError::RateLimited {
                    retry_after_ms: Some(ms),
                } => Duration::from_millis(*ms).min(self.max_backoff),
                _ => jittered(backoff),
            };
            warn!(
                attempt,
                max_attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying model call"
            );
            tokio::time::sleep(delay).await;

            backoff = Duration::from_secs_f64(
                (backoff.as_secs_f64() * self.multiplier).min(self.max_backoff.as_secs_f64()),
            );
            attempt += 1;
        }
    }
}

/// 75% to 125% of `base`.
fn jittered(base: Duration) -> Duration {
    let seed = uuid::Uuid::new_v4().as_u128();
    let factor = 0.75 + (seed % 10_000) as f64 / 20_000.0;
    Duration::from_secs_f64(base.as_secs_f64() * factor)
}
