mod cli;
mod core;
mod device;
mod devices;
mod error;
mod execution;
mod pool;

use anyhow::{Context, Result};
use cli::commands::{RunCommand, ValidateCommand};
use cli::{Cli, Command};
use core::config::PipelineConfig;
use core::pipeline::Pipeline;
use core::state::PipelineState;
use execution::{LoopOutcome, Scheduler};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_loop(cmd)?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
    }

    Ok(())
}

fn run_loop(cmd: &RunCommand) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file)
        .with_context(|| format!("Failed to load pipeline config from {}", cmd.file))?;
    info!(file = %cmd.file, devices = config.pipeline.len(), "loaded pipeline");

    let pipeline = Pipeline::from_config(&config).context("Failed to build pipeline")?;

    // First signal requests a graceful stop at the next device boundary;
    // a second one aborts the process.
    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        if handler_flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        eprintln!("stopping after the current device; press again to abort");
    })
    .context("Failed to install signal handler")?;

    let mut scheduler = Scheduler::new(pipeline, cancel);
    if cmd.profile {
        scheduler = scheduler.with_profiler();
    }
    if let Some(limit) = cmd.max_iterations {
        scheduler = scheduler.with_max_iterations(limit);
    }

    let mut state = PipelineState::new();
    match scheduler.run(&mut state).context("Pipeline loop failed")? {
        LoopOutcome::Done { iterations } => {
            info!(iterations, "pipeline finished");
        }
        LoopOutcome::Cancelled { iterations } => {
            info!(iterations, "pipeline cancelled");
        }
    }
    Ok(())
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file)
        .with_context(|| format!("Failed to load pipeline config from {}", cmd.file))?;

    // Building initializes every device; verify then close immediately.
    let mut pipeline = Pipeline::from_config(&config).context("Failed to build pipeline")?;
    let verdict = execution::verify(pipeline.stages());
    pipeline.close_all();
    verdict.context("Pipeline failed verification")?;

    println!("{}: {} devices, pipeline is valid", cmd.file, config.pipeline.len());
    Ok(())
}
