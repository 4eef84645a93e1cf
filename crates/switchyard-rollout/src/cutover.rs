//! Rollback and promotion controllers.
//!
//! Both are single-write compensating actions on top of the alias
//! store: rollback forces the live alias back to 100% baseline,
//! promotion redefines the baseline alias as the candidate after a
//! fully successful cutover.

use std::sync::Arc;

use tracing::{info, warn};

use switchyard_core::{Deployment, BASELINE_ALIAS, LIVE_ALIAS};
use switchyard_platform::{retry_transient, AliasStore, PlatformResult, RetryPolicy};

/// Forces live traffic back to the baseline version.
///
/// Idempotent: every invocation writes the same single-version
/// routing, so repeating a rollback converges to the same end state.
/// A failure here is fatal to the run — an unresolved rollback leaves
/// production traffic in an undefined mixed state.
pub struct RollbackController<A> {
    alias: Arc<A>,
    retry: RetryPolicy,
}

impl<A: AliasStore> RollbackController<A> {
    pub fn new(alias: Arc<A>) -> Self {
        Self {
            alias,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn rollback(&self, dep: &Deployment) -> PlatformResult<()> {
        warn!(
            service = %dep.service_id,
            baseline = %dep.baseline_version,
            "rolling back live traffic to baseline"
        );
        retry_transient("rollback", self.retry, || {
            self.alias.set_single(LIVE_ALIAS, &dep.baseline_version)
        })
        .await?;
        info!(service = %dep.service_id, "live traffic restored to baseline");
        Ok(())
    }
}

/// Redefines the baseline alias as the candidate version.
///
/// Only invoked after the live alias is fully cut over; a failure
/// leaves live traffic untouched (live is already correct) and is
/// reported distinctly from a rollout failure.
pub struct PromotionController<A> {
    alias: Arc<A>,
    retry: RetryPolicy,
}

impl<A: AliasStore> PromotionController<A> {
    pub fn new(alias: Arc<A>) -> Self {
        Self {
            alias,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn promote(&self, dep: &Deployment) -> PlatformResult<()> {
        retry_transient("promote", self.retry, || {
            self.alias.set_single(BASELINE_ALIAS, &dep.candidate_version)
        })
        .await?;
        info!(
            service = %dep.service_id,
            baseline = %dep.candidate_version,
            "candidate promoted to baseline"
        );
        Ok(())
    }
}
