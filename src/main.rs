//! CLI entry point. Thin glue over the `hbm_residency_sim` library:
//! parse flags, read the trace, run the simulation, print the report.
//! Mirrors how `apps/cli`-style binaries in the teacher workspace layer
//! `anyhow` over a library's own error type for top-level context.

use std::fs::File;
use std::io::BufReader;

use anyhow::Context;
use clap::Parser;

use hbm_residency_sim::config::Cli;
use hbm_residency_sim::error::SimError;
use hbm_residency_sim::report::render_report;
use hbm_residency_sim::trace::read_trace;
use hbm_residency_sim::Simulation;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let show_map = cli.show_map;
    let map_width = cli.map_width;
    let trace_path = cli.trace.clone();

    let config = cli.into_sim_config().context("invalid configuration")?;

    let file = File::open(&trace_path).map_err(|source| SimError::TraceUnreadable {
        path: trace_path.display().to_string(),
        source,
    })?;
    let events = read_trace(BufReader::new(file)).context("failed to parse trace")?;

    tracing::info!(events = events.len(), path = %trace_path.display(), "loaded trace");

    let mut sim = Simulation::new(config.clone());
    sim.run(&events);

    print!("{}", render_report(&sim, &config, show_map, map_width));
    Ok(())
}

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
