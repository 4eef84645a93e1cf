use std::path::Path;
use std::process::ExitCode;

use switchyard_core::PlanFile;

pub fn validate(plan_path: &str) -> anyhow::Result<ExitCode> {
    let file = PlanFile::from_file(Path::new(plan_path))?;
    let plan = file.plan()?;

    println!(
        "✓ {}: {} stages, dwell {}s total, threshold {} errors over {}s windows",
        file.service.id,
        plan.len(),
        plan.stages().iter().map(|s| s.dwell_seconds).sum::<u64>(),
        file.health.error_threshold,
        file.health.window_seconds,
    );
    Ok(ExitCode::SUCCESS)
}
