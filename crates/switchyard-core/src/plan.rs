//! Canary stage plans and their validation rules.
//!
//! A plan is an ordered list of stages, each a traffic percentage and
//! a dwell interval. Plans are validated at construction, before the
//! orchestrator touches any routing state: percentages must be
//! non-decreasing and the final stage must cut over to 100%.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a stage list was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("plan has no stages")]
    Empty,

    #[error("stage {index} percentage {percentage} is outside 1..=100")]
    PercentageOutOfRange { index: usize, percentage: u8 },

    #[error("stage {index} percentage {percentage} decreases from {previous}")]
    NotMonotonic {
        index: usize,
        percentage: u8,
        previous: u8,
    },

    #[error("final stage is {percentage}%, must be 100%")]
    MissingFullCutover { percentage: u8 },
}

/// One canary step: route `percentage` of live traffic to the
/// candidate, then observe for `dwell_seconds` before evaluating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub percentage: u8,
    pub dwell_seconds: u64,
}

impl Stage {
    pub fn new(percentage: u8, dwell_seconds: u64) -> Self {
        Self {
            percentage,
            dwell_seconds,
        }
    }
}

/// A validated, ordered stage list.
///
/// Construction is the only way to obtain one, so any plan held by a
/// deployment is known to be non-empty, monotonic, and terminated by a
/// 100% stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Stage>", into = "Vec<Stage>")]
pub struct RolloutPlan {
    stages: Vec<Stage>,
}

impl RolloutPlan {
    /// Validate a stage list into a plan.
    pub fn new(stages: Vec<Stage>) -> Result<Self, PlanError> {
        if stages.is_empty() {
            return Err(PlanError::Empty);
        }

        let mut previous = 0u8;
        for (index, stage) in stages.iter().enumerate() {
            if stage.percentage < 1 || stage.percentage > 100 {
                return Err(PlanError::PercentageOutOfRange {
                    index,
                    percentage: stage.percentage,
                });
            }
            if stage.percentage < previous {
                return Err(PlanError::NotMonotonic {
                    index,
                    percentage: stage.percentage,
                    previous,
                });
            }
            previous = stage.percentage;
        }

        let last = stages[stages.len() - 1];
        if last.percentage != 100 {
            return Err(PlanError::MissingFullCutover {
                percentage: last.percentage,
            });
        }

        Ok(Self { stages })
    }

    /// The validated stages, in execution order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl TryFrom<Vec<Stage>> for RolloutPlan {
    type Error = PlanError;

    fn try_from(stages: Vec<Stage>) -> Result<Self, Self::Error> {
        Self::new(stages)
    }
}

impl From<RolloutPlan> for Vec<Stage> {
    fn from(plan: RolloutPlan) -> Self {
        plan.stages
    }
}
