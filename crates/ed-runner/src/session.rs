//! Opening a run and driving it, interactively or for a fixed step count.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use chrono::{Local, NaiveTime};
use ed_core::SimConfig;
use ed_persist::{SimMeta, SimStorage, read_json};
use ed_sim::{Command, Sim, SimBuilder, SimObserver};
use tracing::{error, info};

use crate::args::RunnerArgs;

pub const PROMPT: &str = "Enter option: ";

/// Create, resume, or fork the run named by `args`.
///
/// With `--origin` the origin run is copied to the target first.  Without
/// it an existing target is resumed, and otherwise a new run is created
/// from `--config` and `--start`.
pub fn open_sim(args: &RunnerArgs) -> Result<Sim> {
    let existing = SimStorage::new(&args.storage, &args.target);
    let builder = match &args.origin {
        Some(origin) => {
            let storage = SimStorage::fork(&args.storage, origin, &args.target)
                .with_context(|| format!("forking {origin} into {}", args.target))?;
            SimBuilder::resume(storage)?.forked_from(origin.clone())
        }
        None if existing.meta_path().exists() => {
            info!(sim = %args.target, "resuming saved run");
            SimBuilder::resume(SimStorage::open(&args.storage, &args.target)?)?
        }
        None => {
            let config: SimConfig = match &args.config {
                Some(path) => read_json(path).with_context(|| format!("reading {}", path.display()))?,
                None => SimConfig::default(),
            };
            let start = args.start.unwrap_or_else(|| Local::now().date_naive().and_time(NaiveTime::MIN));
            let storage = SimStorage::create(&args.storage, &args.target)?;
            SimBuilder::new(storage, SimMeta::new(start, config))
        }
    };

    let mut builder = builder.headless(args.headless).write_movement(args.write_movement);
    if let Some(sec) = args.sec_per_step {
        builder = builder.sec_per_step(sec);
    }
    Ok(builder.build()?)
}

/// Run `steps` steps, then save and finish.  A failing step ends the run.
pub fn run_fixed<O: SimObserver>(sim: &mut Sim, steps: u64, observer: &mut O) -> Result<String> {
    sim.run_steps(steps, observer)
        .with_context(|| format!("step {} of {}", sim.clock.step, sim.storage.code()))?;
    let outcome = sim.execute(&Command::Finish, observer)?;
    Ok(outcome.output().to_string())
}

/// Read commands from `input` until one ends the run.  Failed commands are
/// reported and the prompt returns; end of input saves and finishes.
pub fn command_loop<O: SimObserver>(
    sim:      &mut Sim,
    observer: &mut O,
    mut input: impl BufRead,
    mut out:  impl Write,
) -> Result<()> {
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            let outcome = sim.execute(&Command::Finish, observer)?;
            writeln!(out, "{}", outcome.output())?;
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }

        match sim.handle(&line, observer) {
            Ok(outcome) => {
                writeln!(out, "{}", outcome.output())?;
                if outcome.is_terminal() {
                    return Ok(());
                }
            }
            Err(e) => {
                error!(command = line.trim(), error = %e, "command failed");
                writeln!(out, "Error: {e}")?;
            }
        }
    }
}
