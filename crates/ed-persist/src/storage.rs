//! On-disk layout of one simulation run.
//!
//! ```text
//! <storage>/<sim code>/
//!   reverie/meta.json              SimMeta (+ SimConfig)
//!   reverie/maze_status.json       LedgerState
//!   reverie/data_collection.json   DataCollection
//!   reverie/commands.json          [CommandLogEntry]
//!   personas/<name>/scratch.json   Scratch
//!   environment/<step>.json        {name: {maze, x, y}}
//!   movement/<step>.json           MovementFile
//!   sim_status.txt | sim_status.json
//!   analysis/*.csv                 end-of-run exports
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use ed_actors::{Actor, DataCollection, Scratch};
use ed_spatial::LedgerState;
use tracing::{debug, info, warn};

use crate::atomic::{read_json, read_json_opt, write_bytes_atomic, write_json_atomic};
use crate::meta::{CommandLogEntry, Environment, MovementFile, SimMeta};
use crate::{PersistError, PersistResult};

/// Result of reading the environment for a step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvironmentLoad {
    pub positions: Environment,
    /// Step the positions were read from; `None` when nothing valid was
    /// found and the caller should fall back to scratch positions.
    pub from_step: Option<u64>,
}

/// Handle on one run folder.
#[derive(Clone, Debug)]
pub struct SimStorage {
    code: String,
    dir:  PathBuf,
}

impl SimStorage {
    /// A handle on `<storage>/<code>`; nothing is touched on disk.
    pub fn new(storage: &Path, code: impl Into<String>) -> Self {
        let code = code.into();
        SimStorage { dir: storage.join(&code), code }
    }

    /// Create the folder skeleton of a new run.
    pub fn create(storage: &Path, code: impl Into<String>) -> PersistResult<Self> {
        let s = SimStorage::new(storage, code);
        if s.dir.join("reverie").exists() {
            return Err(PersistError::RunExists(s.code));
        }
        for sub in ["reverie", "personas", "environment", "movement", "analysis"] {
            let p = s.dir.join(sub);
            fs::create_dir_all(&p).map_err(|e| PersistError::io(p, e))?;
        }
        Ok(s)
    }

    /// Open an existing run.
    pub fn open(storage: &Path, code: impl Into<String>) -> PersistResult<Self> {
        let s = SimStorage::new(storage, code);
        if !s.meta_path().exists() {
            return Err(PersistError::MissingRun(s.code));
        }
        Ok(s)
    }

    /// Copy run `origin` to `target` and open the copy.
    pub fn fork(storage: &Path, origin: &str, target: &str) -> PersistResult<Self> {
        let from = SimStorage::open(storage, origin)?;
        let to = SimStorage::new(storage, target);
        if to.dir.exists() {
            return Err(PersistError::RunExists(target.to_string()));
        }
        copy_dir(&from.dir, &to.dir)?;
        info!(origin, target, "forked simulation");
        Ok(to)
    }

    /// Delete the run folder.
    pub fn discard(self) -> PersistResult<()> {
        fs::remove_dir_all(&self.dir).map_err(|e| PersistError::io(&self.dir, e))?;
        info!(sim = %self.code, "discarded simulation folder");
        Ok(())
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ── Paths ─────────────────────────────────────────────────────────────

    pub fn meta_path(&self) -> PathBuf {
        self.dir.join("reverie/meta.json")
    }

    pub fn maze_status_path(&self) -> PathBuf {
        self.dir.join("reverie/maze_status.json")
    }

    pub fn data_collection_path(&self) -> PathBuf {
        self.dir.join("reverie/data_collection.json")
    }

    pub fn commands_path(&self) -> PathBuf {
        self.dir.join("reverie/commands.json")
    }

    pub fn scratch_path(&self, name: &str) -> PathBuf {
        self.dir.join("personas").join(name).join("scratch.json")
    }

    pub fn environment_path(&self, step: u64) -> PathBuf {
        self.dir.join("environment").join(format!("{step}.json"))
    }

    pub fn movement_path(&self, step: u64) -> PathBuf {
        self.dir.join("movement").join(format!("{step}.json"))
    }

    pub fn status_txt_path(&self) -> PathBuf {
        self.dir.join("sim_status.txt")
    }

    pub fn status_json_path(&self) -> PathBuf {
        self.dir.join("sim_status.json")
    }

    pub fn analysis_dir(&self) -> PathBuf {
        self.dir.join("analysis")
    }

    // ── Documents ─────────────────────────────────────────────────────────

    pub fn save_meta(&self, meta: &SimMeta) -> PersistResult<()> {
        write_json_atomic(&self.meta_path(), meta)
    }

    pub fn load_meta(&self) -> PersistResult<SimMeta> {
        read_json(&self.meta_path())
    }

    pub fn save_ledger(&self, state: &LedgerState) -> PersistResult<()> {
        write_json_atomic(&self.maze_status_path(), state)
    }

    /// `None` for a run that has never been saved.
    pub fn load_ledger(&self) -> PersistResult<Option<LedgerState>> {
        read_json_opt(&self.maze_status_path())
    }

    pub fn save_metrics(&self, metrics: &DataCollection) -> PersistResult<()> {
        write_json_atomic(&self.data_collection_path(), metrics)
    }

    pub fn load_metrics(&self) -> PersistResult<DataCollection> {
        Ok(read_json_opt(&self.data_collection_path())?.unwrap_or_default())
    }

    pub fn save_scratch(&self, actor: &Actor) -> PersistResult<()> {
        write_json_atomic(&self.scratch_path(&actor.name), &actor.scratch)
    }

    pub fn load_actor(&self, name: &str) -> PersistResult<Actor> {
        let scratch: Scratch = read_json(&self.scratch_path(name))?;
        Ok(Actor { name: name.to_string(), scratch })
    }

    pub fn write_environment(&self, step: u64, env: &Environment) -> PersistResult<()> {
        write_json_atomic(&self.environment_path(step), env)
    }

    pub fn write_movement(&self, step: u64, movement: &MovementFile) -> PersistResult<()> {
        write_json_atomic(&self.movement_path(step), movement)
    }

    /// Positions for `step`, scanning backward to step 0 past missing or
    /// unreadable files.  Never fails; every fallback is logged.
    pub fn load_environment(&self, step: u64) -> EnvironmentLoad {
        for s in (0..=step).rev() {
            let path = self.environment_path(s);
            if !path.exists() {
                if s == step {
                    warn!(step, "environment file missing; scanning back");
                }
                continue;
            }
            match read_json::<Environment>(&path) {
                Ok(positions) => {
                    if s != step {
                        warn!(step, recovered_from = s, "recovered environment from an earlier step");
                    }
                    return EnvironmentLoad { positions, from_step: Some(s) };
                }
                Err(e) => warn!(step = s, error = %e, "unreadable environment file; scanning back"),
            }
        }
        warn!(step, "no valid environment file; starting from scratch positions");
        EnvironmentLoad::default()
    }

    /// Delete what running `step` produced: its movement file and the
    /// environment of the step after it.  Used when a step is rolled back.
    pub fn remove_step_artifacts(&self, step: u64) {
        for path in [self.movement_path(step), self.environment_path(step + 1)] {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed step artifact"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "could not remove step artifact"),
            }
        }
    }

    /// Append to `reverie/commands.json`; returns the entry id.
    pub fn log_command(&self, command: &str, output: &str, timestamp: String) -> PersistResult<u64> {
        let path = self.commands_path();
        let mut log: Vec<CommandLogEntry> = match read_json_opt(&path) {
            Ok(log) => log.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "command log unreadable; starting a new one");
                Vec::new()
            }
        };
        let id = log.last().map_or(1, |e| e.id + 1);
        log.push(CommandLogEntry { id, command: command.to_string(), output: output.to_string(), timestamp });
        write_json_atomic(&path, &log)?;
        Ok(id)
    }

    /// Write the periodic status report pair.
    pub fn write_status(&self, text: &str, json: &serde_json::Value) -> PersistResult<()> {
        write_bytes_atomic(&self.status_txt_path(), text.as_bytes())?;
        write_json_atomic(&self.status_json_path(), json)
    }
}

fn copy_dir(from: &Path, to: &Path) -> PersistResult<()> {
    fs::create_dir_all(to).map_err(|e| PersistError::io(to, e))?;
    let entries = fs::read_dir(from).map_err(|e| PersistError::io(from, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| PersistError::io(from, e))?;
        let src = entry.path();
        let dst = to.join(entry.file_name());
        let kind = entry.file_type().map_err(|e| PersistError::io(&src, e))?;
        if kind.is_dir() {
            copy_dir(&src, &dst)?;
        } else {
            fs::copy(&src, &dst).map_err(|e| PersistError::io(&src, e))?;
        }
    }
    Ok(())
}
