//! Stage runner — drives a deployment through its rollout plan.
//!
//! One logical control loop per deployment: shift traffic for the
//! current stage, wait out the dwell interval, evaluate health, then
//! advance, promote, or roll back. The loop is an explicit match over
//! `RolloutStatus`, so every transition in the run is a visible state
//! change on the deployment record.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use switchyard_core::{Deployment, DeploymentResult, FailureReason, RolloutStatus};
use switchyard_platform::{AliasStore, MetricsProvider};

use crate::cutover::{PromotionController, RollbackController};
use crate::health::{HealthEvaluator, Verdict};
use crate::shifter::TrafficShifter;

/// What an observation window concluded.
enum Observation {
    Pass,
    Breached { error_count: u64 },
    MetricsUnavailable { detail: String },
    Cancelled,
}

/// Executes one rollout run over injected collaborators.
///
/// The runner owns the traffic shifter, health evaluator, and the
/// rollback/promotion controllers; it is the only component that
/// mutates the deployment record. Once `RollingBack` is entered the
/// runner issues no further non-baseline routing writes — a late
/// health result cannot interrupt a rollback.
pub struct StageRunner<A, M> {
    shifter: TrafficShifter<A>,
    evaluator: HealthEvaluator<M>,
    rollback: RollbackController<A>,
    promotion: PromotionController<A>,
    cancel: watch::Receiver<bool>,
}

impl<A: AliasStore, M: MetricsProvider> StageRunner<A, M> {
    pub fn new(alias: Arc<A>, metrics: Arc<M>, cancel: watch::Receiver<bool>) -> Self {
        Self {
            shifter: TrafficShifter::new(alias.clone()),
            evaluator: HealthEvaluator::new(metrics),
            rollback: RollbackController::new(alias.clone()),
            promotion: PromotionController::new(alias),
            cancel,
        }
    }

    /// Run the deployment to a terminal status.
    pub async fn run(&self, dep: &mut Deployment) -> DeploymentResult {
        let mut failure: Option<FailureReason> = None;
        let mut stages_completed = 0usize;

        info!(
            service = %dep.service_id,
            baseline = %dep.baseline_version,
            candidate = %dep.candidate_version,
            stages = dep.plan.len(),
            auto_rollback = dep.auto_rollback,
            "rollout starting"
        );
        dep.status = RolloutStatus::Shifting;

        while !dep.status.is_terminal() {
            match dep.status {
                RolloutStatus::Shifting => {
                    let percentage = dep.current_stage().percentage;
                    match self.shifter.shift(dep, percentage).await {
                        Ok(()) => dep.status = RolloutStatus::Observing,
                        Err(err) => {
                            warn!(
                                service = %dep.service_id,
                                stage = dep.current_stage_index,
                                error = %err,
                                "traffic shift failed"
                            );
                            failure = Some(FailureReason::ShiftFailed {
                                stage: dep.current_stage_index,
                                detail: err.to_string(),
                            });
                            dep.status = self.failure_transition(dep);
                        }
                    }
                }

                RolloutStatus::Observing => match self.observe(dep).await {
                    Observation::Pass => {
                        stages_completed += 1;
                        dep.status = if dep.on_last_stage() {
                            RolloutStatus::Promoting
                        } else {
                            RolloutStatus::Advancing
                        };
                    }
                    Observation::Breached { error_count } => {
                        failure = Some(FailureReason::HealthBreached {
                            stage: dep.current_stage_index,
                            error_count,
                            threshold: dep.error_threshold,
                        });
                        dep.status = self.failure_transition(dep);
                    }
                    Observation::MetricsUnavailable { detail } => {
                        warn!(
                            service = %dep.service_id,
                            stage = dep.current_stage_index,
                            %detail,
                            "metrics provider unreachable through retry bound"
                        );
                        failure = Some(FailureReason::MetricsUnavailable {
                            stage: dep.current_stage_index,
                            detail,
                        });
                        dep.status = self.failure_transition(dep);
                    }
                    Observation::Cancelled => {
                        info!(
                            service = %dep.service_id,
                            stage = dep.current_stage_index,
                            "cancellation received during observation"
                        );
                        failure = Some(FailureReason::Cancelled {
                            stage: dep.current_stage_index,
                        });
                        dep.status = self.failure_transition(dep);
                    }
                },

                RolloutStatus::Advancing => {
                    dep.current_stage_index += 1;
                    debug!(
                        service = %dep.service_id,
                        stage = dep.current_stage_index,
                        percentage = dep.current_stage().percentage,
                        "advancing to next stage"
                    );
                    dep.status = RolloutStatus::Shifting;
                }

                RolloutStatus::Promoting => match self.promotion.promote(dep).await {
                    Ok(()) => {
                        info!(service = %dep.service_id, "rollout completed");
                        dep.status = RolloutStatus::Completed;
                    }
                    Err(err) => {
                        // Live traffic is already fully on the candidate
                        // and healthy; leave it in place.
                        warn!(
                            service = %dep.service_id,
                            error = %err,
                            "promotion failed, baseline alias left stale"
                        );
                        failure = Some(FailureReason::PromotionFailed {
                            detail: err.to_string(),
                        });
                        dep.status = RolloutStatus::Failed;
                    }
                },

                RolloutStatus::RollingBack => match self.rollback.rollback(dep).await {
                    Ok(()) => dep.status = RolloutStatus::RolledBack,
                    Err(err) => {
                        error!(
                            service = %dep.service_id,
                            error = %err,
                            "rollback failed, live traffic state undefined"
                        );
                        failure = Some(FailureReason::RollbackFailed {
                            detail: err.to_string(),
                        });
                        dep.status = RolloutStatus::Failed;
                    }
                },

                RolloutStatus::Pending
                | RolloutStatus::Completed
                | RolloutStatus::RolledBack
                | RolloutStatus::Failed => break,
            }
        }

        info!(
            service = %dep.service_id,
            status = ?dep.status,
            stages_completed,
            "rollout finished"
        );
        DeploymentResult {
            final_status: dep.status,
            stages_completed,
            failure_reason: failure,
        }
    }

    /// Where a failed stage goes: rollback when enabled, otherwise a
    /// terminal `Failed` awaiting an operator decision.
    fn failure_transition(&self, dep: &Deployment) -> RolloutStatus {
        if dep.auto_rollback {
            RolloutStatus::RollingBack
        } else {
            RolloutStatus::Failed
        }
    }

    /// Dwell, then evaluate health once.
    ///
    /// Cancellation is honored at any point in this window — during
    /// the dwell sleep or while the evaluation is in flight — and is
    /// treated exactly like a failed health check. A zero dwell skips
    /// the sleep but never the evaluation.
    async fn observe(&self, dep: &Deployment) -> Observation {
        let stage = dep.current_stage();
        let mut cancel = self.cancel.clone();

        debug!(
            service = %dep.service_id,
            stage = dep.current_stage_index,
            dwell_seconds = stage.dwell_seconds,
            "observing stage"
        );

        tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => return Observation::Cancelled,
            _ = tokio::time::sleep(Duration::from_secs(stage.dwell_seconds)) => {}
        }

        tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => Observation::Cancelled,
            result = self.evaluator.evaluate(
                &dep.candidate_version,
                dep.window_seconds,
                dep.error_threshold,
            ) => match result {
                Ok(eval) if eval.verdict == Verdict::Pass => Observation::Pass,
                Ok(eval) => Observation::Breached {
                    error_count: eval.sample.error_count,
                },
                Err(err) => Observation::MetricsUnavailable {
                    detail: err.to_string(),
                },
            },
        }
    }
}

/// Resolves once the cancellation flag is raised; never resolves if
/// the sender is dropped without cancelling.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use switchyard_core::{HealthSample, RolloutPlan, Stage, Version};
    use switchyard_platform::{MemoryAliasStore, PlatformResult};

    struct ScriptedMetrics {
        script: Mutex<VecDeque<PlatformResult<u64>>>,
        calls: Mutex<u64>,
    }

    impl ScriptedMetrics {
        fn always(count: u64) -> Self {
            Self::script(vec![Ok(count)])
        }

        fn script(script: Vec<PlatformResult<u64>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u64 {
            *self.calls.lock().unwrap()
        }
    }

    impl MetricsProvider for ScriptedMetrics {
        async fn error_count(
            &self,
            version: &Version,
            window_seconds: u64,
        ) -> PlatformResult<HealthSample> {
            *self.calls.lock().unwrap() += 1;
            let count = match self.script.lock().unwrap().pop_front() {
                Some(Ok(count)) => count,
                Some(Err(err)) => return Err(err),
                None => 0,
            };
            Ok(HealthSample {
                version: version.clone(),
                window_start: 0,
                window_end: window_seconds,
                error_count: count,
            })
        }
    }

    fn runner(
        store: &Arc<MemoryAliasStore>,
        metrics: &Arc<ScriptedMetrics>,
    ) -> (StageRunner<MemoryAliasStore, ScriptedMetrics>, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        (StageRunner::new(store.clone(), metrics.clone(), rx), tx)
    }

    fn deployment(stages: Vec<Stage>, auto_rollback: bool) -> Deployment {
        let plan = RolloutPlan::new(stages).unwrap();
        Deployment::new("checkout-api", "v41", "v42", plan, 5, 300, auto_rollback)
    }

    #[tokio::test(start_paused = true)]
    async fn zero_dwell_still_evaluates_health() {
        let store = Arc::new(MemoryAliasStore::new().with_alias("live", "v41"));
        let metrics = Arc::new(ScriptedMetrics::always(0));
        let (runner, _tx) = runner(&store, &metrics);
        let mut dep = deployment(vec![Stage::new(100, 0)], true);

        let result = runner.run(&mut dep).await;

        assert_eq!(result.final_status, RolloutStatus::Completed);
        assert_eq!(metrics.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shift_failure_without_auto_rollback_fails_in_place() {
        let store = Arc::new(MemoryAliasStore::new().with_alias("live", "v41"));
        store.fail_nth_write(
            1,
            switchyard_platform::PlatformError::Fatal("denied".into()),
        );
        let metrics = Arc::new(ScriptedMetrics::always(0));
        let (runner, _tx) = runner(&store, &metrics);
        let mut dep = deployment(vec![Stage::new(10, 60), Stage::new(100, 0)], false);

        let result = runner.run(&mut dep).await;

        assert_eq!(result.final_status, RolloutStatus::Failed);
        assert!(matches!(
            result.failure_reason,
            Some(FailureReason::ShiftFailed { stage: 0, .. })
        ));
        // No rollback write: the live alias is untouched.
        assert_eq!(store.target("live").unwrap().version, "v41");
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn metrics_outage_escalates_to_rollback() {
        let store = Arc::new(MemoryAliasStore::new().with_alias("live", "v41"));
        let metrics = Arc::new(ScriptedMetrics::script(vec![
            Err(switchyard_platform::PlatformError::Transient("down".into())),
            Err(switchyard_platform::PlatformError::Transient("down".into())),
            Err(switchyard_platform::PlatformError::Transient("down".into())),
        ]));
        let (runner, _tx) = runner(&store, &metrics);
        let mut dep = deployment(vec![Stage::new(10, 60), Stage::new(100, 0)], true);

        let result = runner.run(&mut dep).await;

        assert_eq!(result.final_status, RolloutStatus::RolledBack);
        assert!(matches!(
            result.failure_reason,
            Some(FailureReason::MetricsUnavailable { stage: 0, .. })
        ));
        assert_eq!(metrics.calls(), 3);
        let target = store.target("live").unwrap();
        assert_eq!(target.version, "v41");
        assert!(target.weights.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stage_indices_and_completion_counts() {
        let store = Arc::new(MemoryAliasStore::new().with_alias("live", "v41"));
        // Stage 0 passes, stage 1 breaches.
        let metrics = Arc::new(ScriptedMetrics::script(vec![Ok(0), Ok(9)]));
        let (runner, _tx) = runner(&store, &metrics);
        let mut dep = deployment(
            vec![Stage::new(10, 30), Stage::new(50, 30), Stage::new(100, 0)],
            true,
        );

        let result = runner.run(&mut dep).await;

        assert_eq!(result.final_status, RolloutStatus::RolledBack);
        assert_eq!(result.stages_completed, 1);
        assert_eq!(dep.current_stage_index, 1);
        assert!(matches!(
            result.failure_reason,
            Some(FailureReason::HealthBreached {
                stage: 1,
                error_count: 9,
                threshold: 5
            })
        ));
    }
}
