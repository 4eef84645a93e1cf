//! rollout.toml plan-file parser.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::plan::{PlanError, RolloutPlan, Stage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanFile {
    pub service: ServiceConfig,
    pub health: HealthConfig,
    pub rollout: RolloutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service identifier scoping the aliases this rollout touches.
    pub id: String,
    /// Control-plane endpoint, e.g. "http://127.0.0.1:9800".
    pub control_plane: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Error counts strictly above this fail a stage.
    pub error_threshold: u64,
    /// Metrics window consulted at each stage, seconds.
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloutConfig {
    #[serde(default = "default_auto_rollback")]
    pub auto_rollback: bool,
    pub stages: Vec<StageConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    pub percentage: u8,
    #[serde(default)]
    pub dwell_seconds: u64,
}

fn default_auto_rollback() -> bool {
    true
}

impl PlanFile {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PlanFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configured stages into an executable plan.
    pub fn plan(&self) -> Result<RolloutPlan, PlanError> {
        RolloutPlan::new(
            self.rollout
                .stages
                .iter()
                .map(|s| Stage::new(s.percentage, s.dwell_seconds))
                .collect(),
        )
    }
}
