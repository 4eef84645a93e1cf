use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "switchyard",
    about = "Switchyard — staged traffic-shift release orchestrator",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the rollout described by a plan file.
    ///
    /// Shifts live traffic to the candidate version stage by stage,
    /// evaluating error counts after each dwell interval. Exit codes:
    /// 0 completed, 2 rolled back, 3 failed (operator intervention
    /// required), 1 usage or plan error.
    Run {
        /// Path to the rollout plan.
        #[arg(short, long, default_value = "rollout.toml")]
        plan: String,
        /// Candidate version to roll out.
        #[arg(short, long)]
        candidate: String,
        /// Disable automatic rollback for this run, regardless of the
        /// plan file.
        #[arg(long)]
        no_rollback: bool,
    },
    /// Parse and validate a plan file without touching the platform.
    Validate {
        #[arg(short, long, default_value = "rollout.toml")]
        plan: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,switchyard=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run {
            plan,
            candidate,
            no_rollback,
        } => commands::run::run(&plan, &candidate, no_rollback).await,
        Commands::Validate { plan } => commands::validate::validate(&plan),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
