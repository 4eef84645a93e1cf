//! Bounded exponential-backoff retry for transient platform failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{PlatformError, PlatformResult};

/// Retry bounds for a platform call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// Run `call` until it succeeds, retrying only `Transient` errors.
///
/// `Conflict`, `Fatal`, and `NotFound` propagate immediately. When the
/// attempt bound is exhausted the last transient error propagates.
pub async fn retry_transient<T, F, Fut>(
    op: &str,
    policy: RetryPolicy,
    mut call: F,
) -> PlatformResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PlatformResult<T>>,
{
    let mut delay = policy.base_delay;
    let mut attempt = 1u32;

    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                warn!(
                    op,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient platform failure, retrying"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
