// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pacer — config-driven periodic task scheduler
//!
//! `pacer run` loads the declared task set, keeps it reconciled while the
//! config file changes, and executes tasks on a worker pool until the
//! process receives SIGINT or SIGTERM.

mod output;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pacer_config::{parser, Reconciler};
use pacer_core::Scheduler;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

#[derive(Parser)]
#[command(name = "pacer")]
#[command(about = "Config-driven periodic task scheduler")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler against a task-set config file
    Run {
        /// Path to the task-set config
        #[arg(long)]
        config: PathBuf,
        /// Number of worker threads
        #[arg(long, default_value_t = 4)]
        workers: usize,
        /// Quiet period after a config edit before it is applied, in seconds
        #[arg(long, default_value_t = 5)]
        debounce_secs: u64,
    },
    /// Parse a config file and print the accepted task set
    Validate {
        /// Path to the task-set config
        #[arg(long)]
        config: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: output::OutputFormat,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            workers,
            debounce_secs,
        } => run(config, workers, Duration::from_secs(debounce_secs)).await,
        Commands::Validate { config, format } => validate(&config, format),
    }
}

async fn run(config: PathBuf, workers: usize, debounce_window: Duration) -> anyhow::Result<()> {
    setup_logging();

    let scheduler = Arc::new(Scheduler::new(workers));
    let mut reconciler = Reconciler::new(scheduler.clone(), &config, debounce_window);
    reconciler
        .start()
        .with_context(|| format!("failed to load config from {}", config.display()))?;

    info!(
        config = %config.display(),
        workers,
        tasks = scheduler.task_count(),
        "pacer running; edit the config to add, update or remove tasks"
    );

    wait_for_shutdown_signal().await?;

    info!("shutting down");
    reconciler.stop();
    scheduler.shutdown();
    info!(tasks = scheduler.task_count(), "stopped");

    Ok(())
}

fn validate(config: &PathBuf, format: output::OutputFormat) -> anyhow::Result<()> {
    let specs = parser::parse_file(config)
        .with_context(|| format!("failed to parse {}", config.display()))?;
    anyhow::ensure!(
        !specs.is_empty(),
        "config declares no valid tasks: {}",
        config.display()
    );

    output::print_list(&specs, format);
    Ok(())
}

async fn wait_for_shutdown_signal() -> anyhow::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
    }
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
