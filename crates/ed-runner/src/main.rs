//! `ed-runner` — command-line front end for the ED simulation.
//!
//! Opens (or creates, or forks) a run, attaches the CSV output observer,
//! then either runs a fixed number of steps or reads commands from stdin.
//!
//! Run with:
//!   cargo run -p ed-runner --release -- --target monday --steps 1440 --headless
//!
//! Log level comes from `RUST_LOG` (default `info`).

mod args;
mod session;

#[cfg(test)]
mod tests;

use std::io;

use anyhow::Result;
use clap::Parser;
use ed_output::{CsvWriter, SimOutputObserver};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::{CliArgs, RunnerArgs};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let args: RunnerArgs = CliArgs::parse().into();
    let mut sim = session::open_sim(&args)?;
    info!(
        sim = %sim.storage.code(),
        step = sim.clock.step.0,
        actors = sim.roster.len(),
        headless = sim.headless,
        "simulation ready"
    );

    let mut observer = SimOutputObserver::new(CsvWriter::new(&sim.storage.analysis_dir())?);
    match args.steps {
        Some(n) => println!("{}", session::run_fixed(&mut sim, n, &mut observer)?),
        None => session::command_loop(&mut sim, &mut observer, io::stdin().lock(), io::stdout())?,
    }

    if let Some(e) = observer.take_error() {
        warn!(error = %e, "output was incomplete");
    }
    Ok(())
}
