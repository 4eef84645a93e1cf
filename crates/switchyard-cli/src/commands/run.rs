use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::info;

use switchyard_core::{PlanFile, RolloutStatus};
use switchyard_http::{HttpAliasStore, HttpMetricsProvider};
use switchyard_rollout::{Orchestrator, RolloutRequest};

/// Live traffic was restored to the baseline.
const EXIT_ROLLED_BACK: u8 = 2;
/// The run needs operator intervention.
const EXIT_FAILED: u8 = 3;

pub async fn run(plan_path: &str, candidate: &str, no_rollback: bool) -> anyhow::Result<ExitCode> {
    let file = PlanFile::from_file(Path::new(plan_path))?;
    let plan = file.plan()?;

    let alias = Arc::new(HttpAliasStore::new(
        &file.service.control_plane,
        &file.service.id,
    ));
    let metrics = Arc::new(HttpMetricsProvider::new(
        &file.service.control_plane,
        &file.service.id,
    ));
    let orchestrator = Orchestrator::new(alias, metrics);

    // Ctrl-C raises the cooperative cancel, which the runner treats
    // as a failed health check.
    let handle = orchestrator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    let auto_rollback = !no_rollback && file.rollout.auto_rollback;
    info!(
        service = %file.service.id,
        candidate,
        stages = plan.len(),
        auto_rollback,
        "starting rollout"
    );

    let result = orchestrator
        .start_rollout(RolloutRequest {
            service_id: file.service.id.clone(),
            candidate_version: candidate.to_string(),
            stages: plan.stages().to_vec(),
            error_threshold: file.health.error_threshold,
            window_seconds: file.health.window_seconds,
            auto_rollback,
        })
        .await?;

    match result.final_status {
        RolloutStatus::Completed => {
            println!(
                "✓ Rollout completed: {candidate} is the new baseline for {} ({} stages)",
                file.service.id, result.stages_completed
            );
            Ok(ExitCode::SUCCESS)
        }
        RolloutStatus::RolledBack => {
            let reason = result
                .failure_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            eprintln!("✗ Rolled back after {} stages: {reason}", result.stages_completed);
            Ok(ExitCode::from(EXIT_ROLLED_BACK))
        }
        _ => {
            let reason = result
                .failure_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            eprintln!("✗ Rollout failed: {reason}");
            Ok(ExitCode::from(EXIT_FAILED))
        }
    }
}
