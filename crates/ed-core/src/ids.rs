//! Small value types shared by every crate: grid tiles, staff roles, and
//! triage acuity.
//!
//! All are `Copy + Ord + Hash` so they can key maps and sort without
//! ceremony.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EdError;

// ── Tile ──────────────────────────────────────────────────────────────────────

/// A grid coordinate on the department map.
///
/// Serialised as a two-element array `[x, y]` to match the map and snapshot
/// documents.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Tile {
    pub x: u32,
    pub y: u32,
}

impl Tile {
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Tile { x, y }
    }

    /// Manhattan distance in tiles.
    #[inline]
    pub fn manhattan(self, other: Tile) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Parse `"x,y"` (whitespace tolerated), as typed at the control prompt.
    pub fn parse_pair(s: &str) -> Option<Tile> {
        let (x, y) = s.split_once(',')?;
        Some(Tile::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
    }
}

impl From<[u32; 2]> for Tile {
    fn from([x, y]: [u32; 2]) -> Self {
        Tile { x, y }
    }
}

impl From<Tile> for [u32; 2] {
    fn from(t: Tile) -> Self {
        [t.x, t.y]
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ── Role ──────────────────────────────────────────────────────────────────────

/// The closed set of actor roles.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum Role {
    Patient,
    TriageNurse,
    BedsideNurse,
    Doctor,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Patient, Role::TriageNurse, Role::BedsideNurse, Role::Doctor];

    /// Human-readable prefix used to build actor names (`"Triage Nurse 2"`).
    pub fn display_name(self) -> &'static str {
        match self {
            Role::Patient      => "Patient",
            Role::TriageNurse  => "Triage Nurse",
            Role::BedsideNurse => "Bedside Nurse",
            Role::Doctor       => "Doctor",
        }
    }

    /// Stable key used in persisted documents.
    pub fn key(self) -> &'static str {
        match self {
            Role::Patient      => "Patient",
            Role::TriageNurse  => "TriageNurse",
            Role::BedsideNurse => "BedsideNurse",
            Role::Doctor       => "Doctor",
        }
    }

    /// Name of the `n`-th actor of this role.
    pub fn actor_name(self, n: u32) -> String {
        format!("{} {}", self.display_name(), n)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Role {
    type Err = EdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Patient"                       => Ok(Role::Patient),
            "TriageNurse" | "Triage Nurse"   => Ok(Role::TriageNurse),
            "BedsideNurse" | "Bedside Nurse" => Ok(Role::BedsideNurse),
            "Doctor"                        => Ok(Role::Doctor),
            other                           => Err(EdError::UnknownRole(other.to_string())),
        }
    }
}

/// Trailing number of an actor name (`"Bedside Nurse 3"` → 3), 0 when absent.
pub fn name_ordinal(name: &str) -> u32 {
    name.rsplit(' ').next().and_then(|n| n.parse().ok()).unwrap_or(0)
}

// ── Acuity ────────────────────────────────────────────────────────────────────

/// Triage acuity level: 1 (resuscitation) through 5 (non-urgent).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Acuity(pub u8);

impl Acuity {
    pub const RESUSCITATION: Acuity = Acuity(1);

    /// Used wherever a patient has no recorded acuity.
    pub const DEFAULT: Acuity = Acuity(3);

    /// String key used by per-acuity tables in configuration documents.
    pub fn key(self) -> String {
        self.0.to_string()
    }

    /// Queue key for this acuity under the given multiplier.
    #[inline]
    pub fn priority(self, factor: f64) -> f64 {
        f64::from(self.0) * factor
    }

    #[inline]
    pub fn is_resuscitation(self) -> bool {
        self == Acuity::RESUSCITATION
    }
}

impl Default for Acuity {
    fn default() -> Self {
        Acuity::DEFAULT
    }
}

impl fmt::Display for Acuity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
