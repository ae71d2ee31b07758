//! Map layout documents.
//!
//! A layout is an ASCII grid plus a legend mapping each character to tile
//! semantics, and the list of zones the ledger should track.  The bundled
//! demo department is a 30×11 map with waiting room, triage, minor and major
//! injury zones, trauma, and diagnostics.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::maze::{Maze, TileInfo};
use crate::{SpatialError, SpatialResult};

const DEMO_LAYOUT: &str = include_str!("../layouts/demo_ed.json");

/// Semantics for one legend character.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendEntry {
    pub arena:             Option<String>,
    pub game_object:       Option<String>,
    pub spawning_location: Option<String>,
    pub collision:         bool,
}

/// A zone the ledger tracks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub name: String,
    /// Game object whose tiles count toward capacity (`bed`, `diagnostic table`).
    pub object: String,
    /// Bed-tracked zones hand out individual bed tiles.
    #[serde(default)]
    pub bed_tracked: bool,
    /// Explicit capacity; otherwise the object tile count.
    #[serde(default)]
    pub capacity: Option<usize>,
    /// Beds to take out of service at load.
    #[serde(default)]
    pub remove_beds: usize,
}

/// A complete layout document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MazeLayout {
    pub name:   String,
    pub world:  String,
    pub sector: String,
    pub rows:   Vec<String>,
    /// Keyed by a one-character string.
    pub legend: BTreeMap<String, LegendEntry>,
    #[serde(default)]
    pub zones:  Vec<ZoneSpec>,
}

impl MazeLayout {
    /// The bundled demo department.
    pub fn demo() -> SpatialResult<Self> {
        Self::from_json(DEMO_LAYOUT)
    }

    pub fn from_json(json: &str) -> SpatialResult<Self> {
        let layout: MazeLayout = serde_json::from_str(json)?;
        layout.check()?;
        Ok(layout)
    }

    pub fn load(path: &Path) -> SpatialResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    fn check(&self) -> SpatialResult<()> {
        let width = self.rows.first().map_or(0, |r| r.chars().count());
        if width == 0 {
            return Err(SpatialError::Layout("layout has no rows".into()));
        }
        for (y, row) in self.rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(SpatialError::Layout(format!(
                    "row {y} has {} columns, expected {width}",
                    row.chars().count()
                )));
            }
            for c in row.chars() {
                if !self.legend.contains_key(c.to_string().as_str()) {
                    return Err(SpatialError::Layout(format!("row {y}: character {c:?} missing from legend")));
                }
            }
        }
        Ok(())
    }

    /// Materialise the tile grid and address index.
    pub fn build(&self) -> Maze {
        let height = self.rows.len() as u32;
        let width = self.rows.first().map_or(0, |r| r.chars().count()) as u32;
        let mut tiles = Vec::with_capacity((width * height) as usize);
        for row in &self.rows {
            for c in row.chars() {
                let entry = self.legend.get(c.to_string().as_str()).cloned().unwrap_or_default();
                tiles.push(TileInfo {
                    world:             self.world.clone(),
                    sector:            Some(self.sector.clone()),
                    arena:             entry.arena,
                    game_object:       entry.game_object,
                    spawning_location: entry.spawning_location,
                    collision:         entry.collision,
                    events:            Default::default(),
                });
            }
        }
        Maze::new(self.name.clone(), width, height, tiles)
    }
}
