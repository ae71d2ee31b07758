//! Persisted documents other than scratch and ledger state.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use ed_actors::ChatLine;
use ed_core::{Role, SimConfig, Tile, timestamp};
use serde::{Deserialize, Serialize};

// ── SimMeta ───────────────────────────────────────────────────────────────────

/// `reverie/meta.json`: where the run is and how it is configured.
///
/// The configuration knobs are flattened into the same object, so a meta
/// document written by hand may carry any subset of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimMeta {
    #[serde(default)]
    pub fork_sim_code: Option<String>,
    #[serde(with = "timestamp")]
    pub start_date:    NaiveDateTime,
    #[serde(with = "timestamp")]
    pub curr_time:     NaiveDateTime,
    #[serde(default = "default_maze_name")]
    pub maze_name:     String,
    #[serde(default)]
    pub step:          u64,
    /// `[name, role]` of every active actor.
    #[serde(default)]
    pub persona_names: Vec<(String, Role)>,

    #[serde(default, with = "timestamp::option")]
    pub last_global_queue_aging: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp::option")]
    pub last_priority_boost:     Option<NaiveDateTime>,
    /// One-time start-up population already ran.
    #[serde(default)]
    pub beds_filled:             bool,
    #[serde(default)]
    pub waiting_room_preloaded:  bool,

    #[serde(flatten)]
    pub config: SimConfig,
}

fn default_maze_name() -> String {
    "Emergency Department".to_string()
}

impl SimMeta {
    /// Meta for a brand-new run starting at `start`.
    pub fn new(start: NaiveDateTime, config: SimConfig) -> Self {
        SimMeta {
            fork_sim_code:           None,
            start_date:              start,
            curr_time:               start,
            maze_name:               default_maze_name(),
            step:                    0,
            persona_names:           Vec::new(),
            last_global_queue_aging: None,
            last_priority_boost:     None,
            beds_filled:             false,
            waiting_room_preloaded:  false,
            config,
        }
    }
}

// ── Environment ───────────────────────────────────────────────────────────────

/// One actor's position in `environment/<step>.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentEntry {
    pub maze: String,
    pub x:    u32,
    pub y:    u32,
}

impl EnvironmentEntry {
    pub fn new(maze: impl Into<String>, tile: Tile) -> Self {
        EnvironmentEntry { maze: maze.into(), x: tile.x, y: tile.y }
    }

    pub fn tile(&self) -> Tile {
        Tile::new(self.x, self.y)
    }
}

/// Actor name → position.
pub type Environment = BTreeMap<String, EnvironmentEntry>;

// ── Movement ──────────────────────────────────────────────────────────────────

/// `movement/<step>.json`, read by a replay viewer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementFile {
    pub persona: BTreeMap<String, MovementEntry>,
    pub meta:    MovementMeta,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovementEntry {
    pub movement:     Tile,
    pub pronunciatio: String,
    pub description:  String,
    pub chat:         Option<Vec<ChatLine>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementMeta {
    #[serde(with = "timestamp::option")]
    pub curr_time: Option<NaiveDateTime>,
}

// ── Command log ───────────────────────────────────────────────────────────────

/// One entry of `reverie/commands.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandLogEntry {
    pub id:        u64,
    pub command:   String,
    pub output:    String,
    pub timestamp: String,
}
