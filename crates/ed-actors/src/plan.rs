//! What an actor is heading for this tick, and what it reports back.

use std::fmt;

use ed_core::Tile;
use serde::{Deserialize, Serialize};

/// Well-known address suffixes.  Prefix with `Maze::address` to resolve.
pub mod places {
    pub const WAITING_ROOM:       &str = "waiting room";
    pub const WAITING_ROOM_CHAIR: &str = "waiting room:waiting room chair";
    pub const TRIAGE_CHAIR:       &str = "triage room:chair";
    pub const TRIAGE_COMPUTER:    &str = "triage room:computer";
    pub const DIAGNOSTIC_TABLE:   &str = "diagnostic room:diagnostic table";
    pub const MAJOR_INJURIES:     &str = "major injuries zone";
    pub const MINOR_INJURIES:     &str = "minor injuries zone";
    pub const TRAUMA_ROOM:        &str = "trauma room";
    pub const EXIT:               &str = "exit";
    pub const SPAWN_PREFIX:       &str = "<spawn_loc>";
}

/// Movement target for the next tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Plan {
    /// Any tile registered under a full address.
    GoToAddress(String),
    /// One specific tile.
    GoToTile(Tile),
    /// Stay on (or return to) a tile without treating it as a destination.
    Wait(Tile),
    /// Walk toward another actor.
    Approach(String),
}

impl Plan {
    pub fn approach_target(&self) -> Option<&str> {
        match self {
            Plan::Approach(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plan::GoToAddress(address) => f.write_str(address),
            Plan::GoToTile(t)          => write!(f, "<tile> {}, {}", t.x, t.y),
            Plan::Wait(t)              => write!(f, "<waiting> {} {}", t.x, t.y),
            Plan::Approach(name)       => write!(f, "<persona> {name}"),
        }
    }
}

/// Result of one actor tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Movement {
    pub tile:         Tile,
    pub pronunciatio: String,
    pub description:  String,
}
