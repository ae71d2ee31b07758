//! Interactive control commands.
//!
//! | Input                                   | Command                   |
//! |-----------------------------------------|---------------------------|
//! | `run <n>`                               | Run `n` steps             |
//! | `save`                                  | Save and keep going       |
//! | `f`, `fin`, `finish`, `save and finish` | Save and stop             |
//! | `exit`                                  | Discard the run and stop  |
//! | `print persona current tile <name>`     | Actor position            |
//! | `print persona scratch <name>`          | Actor scratch as JSON     |
//! | `print current time`                    | Simulated time and step   |
//! | `print tile event <x>, <y>`             | Events on a tile          |
//! | `print tile details <x>, <y>`           | Tile record as JSON       |
//! | `print queues`                          | Every shared queue        |
//!
//! Matching ignores case and surrounding whitespace; actor names keep the
//! case they were typed in.

use std::str::FromStr;

use chrono::Local;
use ed_core::{Tile, timestamp};
use ed_spatial::QueueName;
use tracing::{info, warn};

use crate::{Sim, SimError, SimObserver, SimResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Run(u64),
    Save,
    Finish,
    Exit,
    PersonaTile(String),
    PersonaScratch(String),
    CurrentTime,
    TileEvents(Tile),
    TileDetails(Tile),
    Queues,
}

/// What the caller should do after a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Keep reading commands.
    Continue(String),
    /// Saved; stop.
    Finished(String),
    /// Run folder deleted; stop.
    Discarded(String),
}

impl CommandOutcome {
    pub fn output(&self) -> &str {
        match self {
            CommandOutcome::Continue(s) | CommandOutcome::Finished(s) | CommandOutcome::Discarded(s) => s,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CommandOutcome::Continue(_))
    }
}

/// `s` without `prefix`, compared ignoring ASCII case.
fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

fn parse_tile(command: &'static str, raw: &str) -> SimResult<Tile> {
    Tile::parse_pair(raw).ok_or_else(|| SimError::BadArgument {
        command,
        reason: format!("expected \"x, y\", got {raw:?}"),
    })
}

fn persona_name(command: &'static str, raw: &str) -> SimResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(SimError::BadArgument { command, reason: "missing persona name".into() });
    }
    Ok(name.to_string())
}

impl FromStr for Command {
    type Err = SimError;

    fn from_str(raw: &str) -> SimResult<Self> {
        let s = raw.trim();
        match s.to_ascii_lowercase().as_str() {
            "f" | "fin" | "finish" | "save and finish" => return Ok(Command::Finish),
            "save"               => return Ok(Command::Save),
            "exit"               => return Ok(Command::Exit),
            "print current time" => return Ok(Command::CurrentTime),
            "print queues"       => return Ok(Command::Queues),
            _ => {}
        }

        if let Some(rest) = strip_prefix_ci(s, "run ") {
            let n = rest.trim().parse::<u64>().map_err(|e| SimError::BadArgument {
                command: "run",
                reason:  format!("{:?}: {e}", rest.trim()),
            })?;
            return Ok(Command::Run(n));
        }
        if let Some(rest) = strip_prefix_ci(s, "print persona current tile ") {
            return persona_name("print persona current tile", rest).map(Command::PersonaTile);
        }
        if let Some(rest) = strip_prefix_ci(s, "print persona scratch ") {
            return persona_name("print persona scratch", rest).map(Command::PersonaScratch);
        }
        if let Some(rest) = strip_prefix_ci(s, "print tile event ") {
            return parse_tile("print tile event", rest).map(Command::TileEvents);
        }
        if let Some(rest) = strip_prefix_ci(s, "print tile details ") {
            return parse_tile("print tile details", rest).map(Command::TileDetails);
        }
        Err(SimError::UnknownCommand(s.to_string()))
    }
}

impl Sim {
    /// Parse and run one command line, then append it to the command log.
    /// Unknown or malformed commands change nothing and are not logged.
    pub fn handle<O: SimObserver>(&mut self, line: &str, observer: &mut O) -> SimResult<CommandOutcome> {
        let command: Command = line.parse()?;
        let outcome = self.execute(&command, observer)?;
        if !matches!(outcome, CommandOutcome::Discarded(_)) {
            let stamp = timestamp::format(&Local::now().naive_local());
            self.storage.log_command(line.trim(), outcome.output(), stamp)?;
        }
        Ok(outcome)
    }

    pub fn execute<O: SimObserver>(&mut self, command: &Command, observer: &mut O) -> SimResult<CommandOutcome> {
        let outcome = match command {
            Command::Run(n) => {
                self.run_steps(*n, observer)?;
                CommandOutcome::Continue(format!("ran {n} steps; now at {}", self.clock))
            }
            Command::Save => {
                self.save(observer)?;
                CommandOutcome::Continue(format!("saved {} at {}", self.storage.code(), self.clock.step))
            }
            Command::Finish => {
                self.save(observer)?;
                observer.on_sim_end(self.clock.step);
                info!(sim = %self.storage.code(), step = self.clock.step.0, "finished");
                CommandOutcome::Finished(format!("saved {} and finished", self.storage.code()))
            }
            Command::Exit => {
                observer.on_sim_end(self.clock.step);
                let code = self.storage.code().to_string();
                self.storage.clone().discard()?;
                warn!(sim = %code, "run discarded");
                CommandOutcome::Discarded(format!("discarded {code}"))
            }
            Command::PersonaTile(name) => {
                let actor = self.roster.get(name).ok_or_else(|| unknown_persona("print persona current tile", name))?;
                let tile = actor.tile().map_or_else(|| "not placed".to_string(), |t| t.to_string());
                CommandOutcome::Continue(tile)
            }
            Command::PersonaScratch(name) => {
                let actor = self.roster.get(name).ok_or_else(|| unknown_persona("print persona scratch", name))?;
                CommandOutcome::Continue(serde_json::to_string_pretty(&actor.scratch)?)
            }
            Command::CurrentTime => CommandOutcome::Continue(format!(
                "{}\nstep {}",
                timestamp::format(&self.clock.now),
                self.clock.step.0
            )),
            Command::TileEvents(tile) => {
                if !self.ledger.maze.in_bounds(*tile) {
                    return Err(out_of_bounds("print tile event", *tile));
                }
                let lines: Vec<String> = self
                    .ledger
                    .maze
                    .events_at(*tile)
                    .map(|e| {
                        format!(
                            "{}, {}, {}, {}",
                            e.subject,
                            e.predicate.as_deref().unwrap_or("None"),
                            e.object.as_deref().unwrap_or("None"),
                            e.description.as_deref().unwrap_or("None"),
                        )
                    })
                    .collect();
                CommandOutcome::Continue(lines.join("\n"))
            }
            Command::TileDetails(tile) => {
                let info = self.ledger.maze.tile(*tile).ok_or_else(|| out_of_bounds("print tile details", *tile))?;
                CommandOutcome::Continue(serde_json::to_string_pretty(info)?)
            }
            Command::Queues => {
                let lines: Vec<String> = QueueName::ALL
                    .iter()
                    .map(|q| {
                        let entries: Vec<String> = self
                            .ledger
                            .queues
                            .get(*q)
                            .iter()
                            .map(|e| format!("{} ({})", e.name, e.priority))
                            .collect();
                        format!("{q}: [{}]", entries.join(", "))
                    })
                    .collect();
                CommandOutcome::Continue(lines.join("\n"))
            }
        };
        Ok(outcome)
    }
}

fn unknown_persona(command: &'static str, name: &str) -> SimError {
    SimError::BadArgument { command, reason: format!("no persona named {name:?}") }
}

fn out_of_bounds(command: &'static str, tile: Tile) -> SimError {
    SimError::BadArgument { command, reason: format!("tile {tile} is outside the map") }
}
