//! # DDA Stepper Simulation Binary
//!
//! Runs a move program through the step pulse pipeline on simulated outputs
//! and reports per-motor pulse totals.
//!
//! # Usage
//!
//! ```bash
//! # Default stepper config, given program
//! dda_stepper --program config/program.toml
//!
//! # Paced at the configured tick rate, verbose
//! dda_stepper -c config/stepper.toml -p config/program.toml --realtime -v
//!
//! # JSON logs, abort after one million ticks
//! dda_stepper -p config/program.toml --json --max-ticks 1000000
//! ```

#![deny(warnings)]

use std::path::PathBuf;

use clap::Parser;
use dda_common::config::LogLevel;
use dda_common::consts::DEFAULT_CONFIG_PATH;
use dda_stepper::config::load_config;
use dda_stepper::cycle::SimRunner;
use dda_stepper::pacing::RtPlacement;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// DDA stepper pipeline simulator
#[derive(Parser, Debug)]
#[command(name = "dda_stepper")]
#[command(version)]
#[command(about = "Runs a move program through the DDA step pulse pipeline")]
#[command(long_about = None)]
struct Args {
    /// Path to the stepper configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Path to the move program.
    #[arg(short, long, default_value = "config/program.toml")]
    program: PathBuf,

    /// Pace ticks at the configured tick rate (RT scheduling with the `rt` feature).
    #[arg(long)]
    realtime: bool,

    /// CPU core for RT mode.
    #[arg(long, default_value_t = 0)]
    cpu: usize,

    /// SCHED_FIFO priority for RT mode.
    #[arg(long, default_value_t = 80)]
    priority: i32,

    /// Abort if motion is not complete after this many ticks.
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("simulation failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = load_config(&args.config, &args.program);
    let log_level = loaded.as_ref().map(|c| c.stepper.shared.log_level).ok();
    setup_tracing(&args, log_level);
    let loaded = loaded.map_err(|e| {
        error!(config = %args.config.display(), program = %args.program.display(), "{e}");
        e
    })?;

    info!(
        "{} v{} starting",
        loaded.stepper.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    let names: Vec<String> = loaded.stepper.motors.iter().map(|m| m.name.clone()).collect();

    let mut runner = SimRunner::new(loaded)?;
    if args.realtime {
        runner = runner.with_realtime(RtPlacement {
            cpu: args.cpu,
            priority: args.priority,
        });
    }
    if let Some(limit) = args.max_ticks {
        runner = runner.with_max_ticks(limit);
    }
    let summary = runner.run()?;

    for (m, name) in names.iter().enumerate() {
        info!(
            motor = %name,
            steps = summary.diagnostics.steps[m],
            position = summary.positions[m],
            "motor total"
        );
    }

    let diag = &summary.diagnostics;
    info!(
        segments = diag.segments_loaded,
        null_segments = diag.null_segments_loaded,
        resyncs = diag.resyncs,
        overspeed = diag.prep.overspeed,
        rejected = diag.rejected_segments,
        "pipeline summary"
    );
    if diag.protocol_violations() > 0 {
        warn!(count = diag.protocol_violations(), "protocol violations recorded");
    }

    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: Option<LogLevel>) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        configured.map(Level::from).unwrap_or(Level::INFO)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
