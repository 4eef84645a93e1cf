//! Domain types for the switchyard orchestrator.
//!
//! These types describe one rollout run: the versions involved, the
//! run-time deployment record, and the terminal result handed back to
//! the caller. Deployment records are transient — they live for the
//! duration of a single run and are never persisted.

use serde::{Deserialize, Serialize};

use crate::plan::RolloutPlan;

/// Opaque, immutable identifier for a deployable artifact.
pub type Version = String;

/// Identifier for the service whose aliases a rollout manipulates.
pub type ServiceId = String;

/// Alias receiving production traffic, split across versions by weight.
pub const LIVE_ALIAS: &str = "live";

/// Alias pointing at the known-good version; the rollback target.
pub const BASELINE_ALIAS: &str = "baseline";

/// Alias pointing at the version under rollout.
pub const CANDIDATE_ALIAS: &str = "candidate";

// ── Deployment ─────────────────────────────────────────────────────

/// State of a rollout run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloutStatus {
    /// Created, not yet started.
    Pending,
    /// Writing the current stage's traffic split to the live alias.
    Shifting,
    /// Waiting out the dwell interval, then evaluating health.
    Observing,
    /// Health passed with stages remaining; selecting the next stage.
    Advancing,
    /// Final stage passed; redefining the baseline alias.
    Promoting,
    /// Rollout finished and the candidate is the new baseline.
    Completed,
    /// Forcing the live alias back to 100% baseline.
    RollingBack,
    /// Live traffic restored to the baseline version.
    RolledBack,
    /// Terminal failure requiring an operator decision.
    Failed,
}

impl RolloutStatus {
    /// Whether this status ends the run.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::RolledBack | Self::Failed)
    }
}

/// The mutable record of one rollout attempt.
///
/// `baseline_version` and `candidate_version` are frozen at creation;
/// alias state is never re-read mid-run (the routing platform may be
/// eventually consistent, so the record is the source of truth for
/// which versions the run is operating on).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub service_id: ServiceId,
    pub baseline_version: Version,
    pub candidate_version: Version,
    pub plan: RolloutPlan,
    pub current_stage_index: usize,
    pub status: RolloutStatus,
    /// Error-count ceiling per observation window; a count strictly
    /// above this fails the stage.
    pub error_threshold: u64,
    /// Length of the metrics window consulted at each stage, seconds.
    pub window_seconds: u64,
    /// Whether a failed stage triggers automatic rollback.
    pub auto_rollback: bool,
    /// Unix timestamp (seconds) when the run was created.
    pub started_at: u64,
}

impl Deployment {
    /// Create a deployment record in `Pending` state.
    pub fn new(
        service_id: &str,
        baseline_version: &str,
        candidate_version: &str,
        plan: RolloutPlan,
        error_threshold: u64,
        window_seconds: u64,
        auto_rollback: bool,
    ) -> Self {
        Self {
            service_id: service_id.to_string(),
            baseline_version: baseline_version.to_string(),
            candidate_version: candidate_version.to_string(),
            plan,
            current_stage_index: 0,
            status: RolloutStatus::Pending,
            error_threshold,
            window_seconds,
            auto_rollback,
            started_at: epoch_secs(),
        }
    }

    /// The stage currently being executed.
    pub fn current_stage(&self) -> &crate::plan::Stage {
        &self.plan.stages()[self.current_stage_index]
    }

    /// Whether the current stage is the final (100%) stage.
    pub fn on_last_stage(&self) -> bool {
        self.current_stage_index + 1 == self.plan.stages().len()
    }
}

// ── Health ─────────────────────────────────────────────────────────

/// A read-only snapshot from the metrics provider: how many failures
/// `version` produced over `[window_start, window_end]`.
///
/// A provider with no recorded data for the version reports
/// `error_count = 0` — absence of data is not a failure signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSample {
    pub version: Version,
    /// Unix timestamp (seconds), start of the measured window.
    pub window_start: u64,
    /// Unix timestamp (seconds), end of the measured window.
    pub window_end: u64,
    pub error_count: u64,
}

// ── Results ────────────────────────────────────────────────────────

/// Why a run ended in `RolledBack` or `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The candidate's error count breached the threshold.
    HealthBreached {
        stage: usize,
        error_count: u64,
        threshold: u64,
    },
    /// The traffic shift for a stage could not be applied.
    ShiftFailed { stage: usize, detail: String },
    /// The metrics provider stayed unreachable through the retry bound.
    MetricsUnavailable { stage: usize, detail: String },
    /// An external cancellation arrived during observation.
    Cancelled { stage: usize },
    /// Rollback itself failed — live traffic is in an undefined mixed
    /// state and needs operator intervention.
    RollbackFailed { detail: String },
    /// Live traffic is fully on the candidate, but the baseline alias
    /// could not be updated to match.
    PromotionFailed { detail: String },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HealthBreached {
                stage,
                error_count,
                threshold,
            } => write!(
                f,
                "health check failed at stage {stage}: {error_count} errors (threshold {threshold})"
            ),
            Self::ShiftFailed { stage, detail } => {
                write!(f, "traffic shift failed at stage {stage}: {detail}")
            }
            Self::MetricsUnavailable { stage, detail } => {
                write!(f, "metrics unavailable at stage {stage}: {detail}")
            }
            Self::Cancelled { stage } => {
                write!(f, "rollout cancelled at stage {stage}")
            }
            Self::RollbackFailed { detail } => {
                write!(f, "rollback failed, live traffic state undefined: {detail}")
            }
            Self::PromotionFailed { detail } => {
                write!(
                    f,
                    "promotion failed, live traffic unaffected but baseline alias is stale: {detail}"
                )
            }
        }
    }
}

/// Terminal outcome of one rollout run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub final_status: RolloutStatus,
    /// Stages whose health evaluation passed.
    pub stages_completed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
}

/// Current Unix time in seconds.
pub fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
