//! Event deadlock sample
//!
//! Runs a scenario of event-gated copies against a simulated runtime with the
//! validation layer in between.

use anyhow::Context;
use clap::Parser;
use eventlock_core::{AbortTerminator, LogOnlyTerminator, Terminator};
use eventlock_layer::{LayerConfig, ValidationLayer};
use eventlock_sample::{Scenario, SimulatedDriver};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eventlock-sample")]
#[command(about = "Drive event-gated operations through the event deadlock checker")]
#[command(version)]
struct Cli {
    /// Enable the checker regardless of ZEL_ENABLE_EVENTSDEADLOCK_CHECKER
    #[arg(long)]
    enable_checker: bool,

    /// Built-in scenario to run (chain, deadlock, undeclared-wait)
    #[arg(long, default_value = "deadlock", conflicts_with = "scenario_file")]
    scenario: String,

    /// Run a scenario from a TOML file instead
    #[arg(long)]
    scenario_file: Option<PathBuf>,

    /// Maximum number of operations shown in a deadlock report
    #[arg(long)]
    max_path_len: Option<usize>,

    /// Log violations and exit with status 1 instead of aborting
    #[arg(long)]
    no_abort: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let scenario = match &cli.scenario_file {
        Some(path) => Scenario::from_file(path)
            .with_context(|| format!("loading scenario from {}", path.display()))?,
        None => Scenario::builtin(&cli.scenario)?,
    };

    let mut config = LayerConfig::from_env();
    if cli.enable_checker {
        config = config.with_events_deadlock(true);
    }
    if let Some(max_path_len) = cli.max_path_len {
        config.checker = config.checker.with_max_path_len(max_path_len);
    }
    if !config.events_deadlock {
        tracing::warn!("Event deadlock checker is disabled; pass --enable-checker to turn it on");
    }

    let terminator: Arc<dyn Terminator> = if cli.no_abort {
        Arc::new(LogOnlyTerminator)
    } else {
        Arc::new(AbortTerminator)
    };

    let mut driver = SimulatedDriver::new(ValidationLayer::new(config, terminator));
    match driver.run(&scenario) {
        Ok(summary) => {
            println!(
                "{}: {} steps, {} events, {} operations",
                scenario.name, summary.steps, summary.created, summary.appended
            );
            Ok(ExitCode::SUCCESS)
        }
        // The terminator has already reported the violation.
        Err(_) => Ok(ExitCode::FAILURE),
    }
}
