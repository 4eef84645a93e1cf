//! Switchyard rollout orchestrator — staged traffic shifts, health
//! gates, rollback and promotion.
//!
//! This crate drives one canary/blue-green release: traffic moves from
//! the baseline version to the candidate through an ordered list of
//! percentage stages, each followed by an observation window and a
//! health verdict. A failed stage rolls live traffic back to the
//! baseline (when auto-rollback is on) or halts for an operator
//! decision.
//!
//! # Components
//!
//! - **`shifter`** — Turns a stage percentage into a live-alias write
//! - **`health`** — Error-threshold verdicts over metrics windows
//! - **`cutover`** — Rollback and promotion controllers
//! - **`runner`** — The stage state machine
//!
//! The [`Orchestrator`] ties them together behind a single
//! `start_rollout` call.

pub mod cutover;
pub mod health;
pub mod runner;
pub mod shifter;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use switchyard_core::{
    Deployment, DeploymentResult, PlanError, RolloutPlan, Stage, Version, BASELINE_ALIAS,
};
use switchyard_platform::{AliasStore, MetricsProvider, PlatformError};

pub use cutover::{PromotionController, RollbackController};
pub use health::{Evaluation, HealthEvaluator, Verdict};
pub use runner::StageRunner;
pub use shifter::TrafficShifter;

/// Errors rejected before any routing mutation.
#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("invalid rollout plan: {0}")]
    Plan(#[from] PlanError),

    #[error("failed to resolve baseline version: {0}")]
    Baseline(#[source] PlatformError),
}

/// Everything needed to start one rollout run.
///
/// Serializable so an embedding host (API handler, queue worker, CLI)
/// can carry it as a message.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RolloutRequest {
    pub service_id: String,
    pub candidate_version: Version,
    pub stages: Vec<Stage>,
    pub error_threshold: u64,
    pub window_seconds: u64,
    pub auto_rollback: bool,
}

/// Raises the cancellation flag for an orchestrator's running
/// rollouts. Cancellation is observed during observation windows and
/// treated as a failed health check; a shift already in flight
/// completes first.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Entry point for running rollouts against a pair of platform
/// collaborators.
pub struct Orchestrator<A, M> {
    alias: Arc<A>,
    metrics: Arc<M>,
    cancel_tx: watch::Sender<bool>,
}

impl<A: AliasStore, M: MetricsProvider> Orchestrator<A, M> {
    pub fn new(alias: Arc<A>, metrics: Arc<M>) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            alias,
            metrics,
            cancel_tx,
        }
    }

    /// Handle for cancelling rollouts started by this orchestrator.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: self.cancel_tx.clone(),
        }
    }

    /// Validate the request, freeze the baseline version, and run the
    /// rollout to a terminal status.
    ///
    /// Plan validation and the baseline lookup happen before any
    /// routing mutation; failures there are errors to the caller
    /// rather than a deployment outcome.
    pub async fn start_rollout(
        &self,
        request: RolloutRequest,
    ) -> Result<DeploymentResult, RolloutError> {
        let plan = RolloutPlan::new(request.stages)?;

        let baseline = self
            .alias
            .get_version(BASELINE_ALIAS)
            .await
            .map_err(RolloutError::Baseline)?;

        let mut dep = Deployment::new(
            &request.service_id,
            &baseline,
            &request.candidate_version,
            plan,
            request.error_threshold,
            request.window_seconds,
            request.auto_rollback,
        );

        let runner = StageRunner::new(
            self.alias.clone(),
            self.metrics.clone(),
            self.cancel_tx.subscribe(),
        );
        Ok(runner.run(&mut dep).await)
    }
}
