//! Health evaluator — polls the metrics provider and applies the
//! error threshold.

use std::sync::Arc;

use tracing::{debug, warn};

use switchyard_core::{HealthSample, Version};
use switchyard_platform::{retry_transient, MetricsProvider, PlatformResult, RetryPolicy};

/// Outcome of a health evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

/// A verdict plus the sample that produced it.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub sample: HealthSample,
}

/// Applies the threshold rule to candidate error counts.
///
/// The boundary is strict: a count equal to the threshold passes, one
/// above it fails. A metrics outage is not a failed evaluation — the
/// query is retried under the evaluator's policy and, if still
/// unreachable, the error surfaces to the caller as an error rather
/// than a `Fail` verdict.
pub struct HealthEvaluator<M> {
    metrics: Arc<M>,
    retry: RetryPolicy,
}

impl<M: MetricsProvider> HealthEvaluator<M> {
    pub fn new(metrics: Arc<M>) -> Self {
        Self {
            metrics,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Evaluate `version` over the trailing window.
    pub async fn evaluate(
        &self,
        version: &Version,
        window_seconds: u64,
        error_threshold: u64,
    ) -> PlatformResult<Evaluation> {
        let sample = retry_transient("health.query", self.retry, || {
            self.metrics.error_count(version, window_seconds)
        })
        .await?;

        let verdict = if sample.error_count > error_threshold {
            warn!(
                %version,
                errors = sample.error_count,
                threshold = error_threshold,
                window_seconds,
                "health check failed"
            );
            Verdict::Fail
        } else {
            debug!(
                %version,
                errors = sample.error_count,
                threshold = error_threshold,
                window_seconds,
                "health check passed"
            );
            Verdict::Pass
        };

        Ok(Evaluation { verdict, sample })
    }
}
