//! Switchyard core types — versions, stages, rollout plans, and the
//! per-run deployment record.
//!
//! # Components
//!
//! - **`types`** — Domain types (versions, aliases, statuses, results)
//! - **`plan`** — Canary stage plans and their validation rules
//! - **`config`** — The `rollout.toml` plan-file format

pub mod config;
pub mod plan;
pub mod types;

pub use config::PlanFile;
pub use plan::{PlanError, RolloutPlan, Stage};
pub use types::*;
