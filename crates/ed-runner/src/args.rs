//! Command-line flags.
//!
//! [`CliArgs`] is the raw `clap` surface; [`RunnerArgs`] is what a session
//! runs with once the headless and movement switches are combined.

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::Parser;
use ed_core::timestamp;

/// Emergency department patient-flow simulation.
#[derive(Parser, Debug)]
#[command(name = "ed-runner", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Run to create, resume, or fork into.
    #[arg(long, value_name = "CODE")]
    target: String,
    /// Fork `target` from this saved run.
    #[arg(long, value_name = "CODE")]
    origin: Option<String>,
    /// Folder holding run folders.
    #[arg(long, value_name = "DIR", default_value = "storage")]
    storage: PathBuf,
    /// `SimConfig` JSON for a new run.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Start time of a new run, e.g. "March 01, 2024, 08:00:00".
    #[arg(long, value_name = "TIMESTAMP", value_parser = parse_start)]
    start: Option<NaiveDateTime>,
    /// Override the step length.
    #[arg(long = "sec-per-step", value_name = "SECONDS", value_parser = clap::value_parser!(u32).range(1..))]
    sec_per_step: Option<u32>,
    /// Run this many steps, save, and exit without prompting.
    #[arg(long, value_name = "COUNT")]
    steps: Option<u64>,
    /// No environment files; movement files off too.
    #[arg(long)]
    headless: bool,
    /// Keep movement files in headless mode.
    #[arg(long = "write-movement")]
    write_movement: bool,
}

fn parse_start(raw: &str) -> Result<NaiveDateTime, String> {
    timestamp::parse(raw).map_err(|e| e.to_string())
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunnerArgs {
    pub target:         String,
    pub origin:         Option<String>,
    pub storage:        PathBuf,
    pub config:         Option<PathBuf>,
    pub start:          Option<NaiveDateTime>,
    pub sec_per_step:   Option<u32>,
    pub steps:          Option<u64>,
    pub headless:       bool,
    pub write_movement: bool,
}

impl From<CliArgs> for RunnerArgs {
    fn from(cli: CliArgs) -> Self {
        RunnerArgs {
            target:         cli.target,
            origin:         cli.origin,
            storage:        cli.storage,
            config:         cli.config,
            start:          cli.start,
            sec_per_step:   cli.sec_per_step,
            steps:          cli.steps,
            headless:       cli.headless,
            write_movement: cli.write_movement || !cli.headless,
        }
    }
}

impl RunnerArgs {
    /// Parse a full argument list, program name first.
    pub fn parse_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Ok(CliArgs::try_parse_from(args)?.into())
    }
}
