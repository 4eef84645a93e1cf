//! Traffic shifter — translates a stage percentage into an alias write.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use switchyard_core::{Deployment, LIVE_ALIAS};
use switchyard_platform::{retry_transient, AliasStore, PlatformResult, RetryPolicy};

/// Applies a canary percentage to the live alias.
///
/// A 100% stage is written as a plain single-version cutover rather
/// than a weighted config, so a completed rollout leaves no stale
/// routing state behind. Anything lower becomes a weighted write with
/// the baseline as primary and the candidate carrying
/// `percentage / 100` of the traffic.
pub struct TrafficShifter<A> {
    alias: Arc<A>,
    retry: RetryPolicy,
}

impl<A: AliasStore> TrafficShifter<A> {
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

    /// Route `percentage` of live traffic to the deployment's
    /// candidate version. Transient write failures are retried under
    /// the shifter's policy before the error propagates.
    pub async fn shift(&self, dep: &Deployment, percentage: u8) -> PlatformResult<()> {
        debug_assert!((1..=100).contains(&percentage));

        if percentage == 100 {
            retry_transient("shift.cutover", self.retry, || {
                self.alias.set_single(LIVE_ALIAS, &dep.candidate_version)
            })
            .await?;
        } else {
            let mut weights = HashMap::new();
            weights.insert(dep.candidate_version.clone(), f64::from(percentage) / 100.0);
            retry_transient("shift.weighted", self.retry, || {
                self.alias
                    .set_weighted(LIVE_ALIAS, &dep.baseline_version, &weights)
            })
            .await?;
        }

        info!(
            service = %dep.service_id,
            candidate = %dep.candidate_version,
            percentage,
            "live traffic shifted"
        );
        Ok(())
    }
}
