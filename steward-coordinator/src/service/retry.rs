//! Conflict retry policy
//!
//! Read-modify-write cycles against the pod are retried when the API server
//! reports that the pod changed underneath them. Every other failure is
//! returned immediately.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{CoordinatorError, Result};

/// Bounded backoff for conflicting updates
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry
    pub factor: f64,
    /// Upper bound for a single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(10),
            factor: 1.0,
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0 = first retry), never more
    /// than `max_delay`
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let scale = self.factor.max(1.0).powi(exponent);

        Duration::try_from_secs_f64(self.initial_delay.as_secs_f64() * scale)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Runs `op` until it succeeds, fails with a non-conflict error, or the
/// attempt budget is spent.
///
/// Each call to `op` must perform the whole read-modify-write cycle so that
/// a retry starts from fresh state. When attempts run out the last conflict
/// error is returned.
pub async fn retry_on_conflict<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_conflict() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt - 1);
                warn!(
                    "Conflict on attempt {}/{}: {}; retrying in {:?}",
                    attempt, max_attempts, e, delay
                );

                tokio::select! {
                    _ = cancel.cancelled() => return Err(CoordinatorError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) => return Err(e),
        }
    }
}
