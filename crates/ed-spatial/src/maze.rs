//! Static tile map plus the address index and per-tile event sets.
//!
//! # Addresses
//!
//! Every tile is registered under each prefix of its semantic path:
//!
//! ```text
//! <world>:<sector>
//! <world>:<sector>:<arena>
//! <world>:<sector>:<arena>:<game object>
//! <spawn_loc><arena>                       (spawning tiles only)
//! ```
//!
//! so `resolve_address("ed map:emergency department:triage room:chair")`
//! yields every triage chair.  The index is built once from the layout; the
//! only later additions are per-bed addresses registered by the ledger.

use std::collections::BTreeSet;

use ed_core::Tile;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ── TileEvent ─────────────────────────────────────────────────────────────────

/// What is currently happening on a tile: `(subject, predicate, object,
/// description)`.  Game objects carry an idle event `(address, None, None,
/// None)`; actors carry one event naming themselves.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileEvent {
    pub subject:     String,
    pub predicate:   Option<String>,
    pub object:      Option<String>,
    pub description: Option<String>,
}

impl TileEvent {
    /// An event with only a subject.
    pub fn idle(subject: impl Into<String>) -> Self {
        TileEvent { subject: subject.into(), predicate: None, object: None, description: None }
    }

    pub fn is_idle(&self) -> bool {
        self.predicate.is_none() && self.object.is_none() && self.description.is_none()
    }
}

// ── TileInfo ──────────────────────────────────────────────────────────────────

/// Semantic details of one tile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TileInfo {
    pub world:             String,
    pub sector:            Option<String>,
    pub arena:             Option<String>,
    pub game_object:       Option<String>,
    pub spawning_location: Option<String>,
    pub collision:         bool,
    pub events:            BTreeSet<TileEvent>,
}

/// Depth of an address query.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AddressLevel {
    World,
    Sector,
    Arena,
    GameObject,
}

// ── Maze ──────────────────────────────────────────────────────────────────────

/// The department map.
///
/// Tiles are stored row-major; `tile(Tile { x, y })` indexes `y * width + x`.
/// Construct via [`MazeLayout::build`][crate::MazeLayout::build].
#[derive(Clone, Debug)]
pub struct Maze {
    pub name:   String,
    pub width:  u32,
    pub height: u32,
    pub(crate) tiles: Vec<TileInfo>,
    pub(crate) address_tiles: FxHashMap<String, BTreeSet<Tile>>,
}

impl Maze {
    pub(crate) fn new(name: String, width: u32, height: u32, tiles: Vec<TileInfo>) -> Self {
        let mut maze = Maze { name, width, height, tiles, address_tiles: FxHashMap::default() };
        maze.index_addresses();
        maze.seed_object_events();
        maze
    }

    fn index_addresses(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                let tile = Tile::new(x, y);
                let info = &self.tiles[(y * self.width + x) as usize];
                let mut addresses = Vec::with_capacity(4);
                if let Some(sector) = &info.sector {
                    addresses.push(format!("{}:{}", info.world, sector));
                    if let Some(arena) = &info.arena {
                        addresses.push(format!("{}:{}:{}", info.world, sector, arena));
                        if let Some(object) = &info.game_object {
                            addresses.push(format!("{}:{}:{}:{}", info.world, sector, arena, object));
                        }
                    }
                }
                if info.spawning_location.is_some() {
                    if let Some(arena) = &info.arena {
                        addresses.push(format!("<spawn_loc>{arena}"));
                    }
                }
                for address in addresses {
                    self.address_tiles.entry(address).or_default().insert(tile);
                }
            }
        }
    }

    /// Every game object starts with its idle event.
    fn seed_object_events(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                let tile = Tile::new(x, y);
                if let Some(address) = self.address_of(tile, AddressLevel::GameObject) {
                    if self.tile(tile).is_some_and(|t| t.game_object.is_some()) {
                        self.add_event(tile, TileEvent::idle(address));
                    }
                }
            }
        }
    }

    // ── Tile access ───────────────────────────────────────────────────────

    #[inline]
    pub fn in_bounds(&self, tile: Tile) -> bool {
        tile.x < self.width && tile.y < self.height
    }

    #[inline]
    fn index(&self, tile: Tile) -> Option<usize> {
        self.in_bounds(tile).then(|| (tile.y * self.width + tile.x) as usize)
    }

    pub fn tile(&self, tile: Tile) -> Option<&TileInfo> {
        self.index(tile).map(|i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, tile: Tile) -> Option<&mut TileInfo> {
        self.index(tile).map(|i| &mut self.tiles[i])
    }

    /// `true` for in-bounds tiles without collision.
    #[inline]
    pub fn is_walkable(&self, tile: Tile) -> bool {
        self.tile(tile).is_some_and(|t| !t.collision)
    }

    /// Arena name of a tile, if it has one.
    pub fn arena_of(&self, tile: Tile) -> Option<&str> {
        self.tile(tile).and_then(|t| t.arena.as_deref())
    }

    /// The address string of `tile` down to `level`.  Returns `None` for
    /// out-of-bounds tiles or when the tile has no component at some level.
    pub fn address_of(&self, tile: Tile, level: AddressLevel) -> Option<String> {
        let info = self.tile(tile)?;
        let mut path = info.world.clone();
        if level == AddressLevel::World {
            return Some(path);
        }
        path.push(':');
        path.push_str(info.sector.as_deref()?);
        if level == AddressLevel::Sector {
            return Some(path);
        }
        path.push(':');
        path.push_str(info.arena.as_deref()?);
        if level == AddressLevel::Arena {
            return Some(path);
        }
        path.push(':');
        path.push_str(info.game_object.as_deref()?);
        Some(path)
    }

    /// `<world>:<sector>:<suffix>` for this map's (single) world and sector.
    pub fn address(&self, suffix: &str) -> String {
        let sector = self
            .tiles
            .iter()
            .find_map(|t| t.sector.as_deref())
            .unwrap_or_default();
        let world = self.tiles.first().map(|t| t.world.as_str()).unwrap_or_default();
        format!("{world}:{sector}:{suffix}")
    }

    // ── Address index ─────────────────────────────────────────────────────

    /// Tiles satisfying `address`, ascending.  Unknown addresses yield an
    /// empty list; callers treat that as "stay put".
    pub fn resolve_address(&self, address: &str) -> Vec<Tile> {
        match self.address_tiles.get(address) {
            Some(tiles) => tiles.iter().copied().collect(),
            None => {
                debug!(address, "unknown address");
                Vec::new()
            }
        }
    }

    pub fn has_address(&self, address: &str) -> bool {
        self.address_tiles.contains_key(address)
    }

    /// Number of tiles registered under `address` (0 when unknown).
    pub fn address_len(&self, address: &str) -> usize {
        self.address_tiles.get(address).map_or(0, BTreeSet::len)
    }

    /// Every registered address containing `needle`, sorted.
    pub fn addresses_containing(&self, needle: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .address_tiles
            .keys()
            .filter(|k| k.contains(needle))
            .cloned()
            .collect();
        out.sort();
        out
    }

    /// Register (or extend) an address.
    pub fn register_address(&mut self, address: String, tile: Tile) {
        self.address_tiles.entry(address).or_default().insert(tile);
    }

    /// Drop `tile` from `address`; removes the address when it empties.
    pub fn unregister_address(&mut self, address: &str, tile: Tile) {
        if let Some(set) = self.address_tiles.get_mut(address) {
            set.remove(&tile);
            if set.is_empty() {
                self.address_tiles.remove(address);
            }
        }
    }

    // ── Events ────────────────────────────────────────────────────────────

    pub fn events_at(&self, tile: Tile) -> impl Iterator<Item = &TileEvent> {
        self.tile(tile).into_iter().flat_map(|t| t.events.iter())
    }

    pub fn add_event(&mut self, tile: Tile, event: TileEvent) {
        if let Some(t) = self.tile_mut(tile) {
            t.events.insert(event);
        }
    }

    pub fn remove_event(&mut self, tile: Tile, event: &TileEvent) {
        if let Some(t) = self.tile_mut(tile) {
            t.events.remove(event);
        }
    }

    /// Reset an object event to its idle form.
    pub fn turn_event_idle(&mut self, tile: Tile, event: &TileEvent) {
        if let Some(t) = self.tile_mut(tile) {
            if t.events.remove(event) {
                t.events.insert(TileEvent::idle(event.subject.clone()));
            }
        }
    }

    /// Remove every event whose subject is `subject`.
    pub fn remove_subject_events(&mut self, tile: Tile, subject: &str) {
        if let Some(t) = self.tile_mut(tile) {
            t.events.retain(|e| e.subject != subject);
        }
    }

    /// Reset every non-idle game-object event on the map.
    pub fn reset_object_events(&mut self) {
        for t in &mut self.tiles {
            let busy: Vec<TileEvent> = t
                .events
                .iter()
                .filter(|e| e.subject.contains(':') && !e.is_idle())
                .cloned()
                .collect();
            for e in busy {
                t.events.remove(&e);
                t.events.insert(TileEvent::idle(e.subject));
            }
        }
    }

    /// `true` when some event on `tile` has a subject accepted by `is_actor`.
    pub fn has_subject_matching(&self, tile: Tile, is_actor: impl Fn(&str) -> bool) -> bool {
        self.events_at(tile).any(|e| is_actor(&e.subject))
    }

    /// Tiles within a square of half-width `radius` around `tile`, clipped to
    /// the map.
    pub fn nearby_tiles(&self, tile: Tile, radius: u32) -> Vec<Tile> {
        let x0 = tile.x.saturating_sub(radius);
        let y0 = tile.y.saturating_sub(radius);
        let x1 = (tile.x + radius).min(self.width.saturating_sub(1));
        let y1 = (tile.y + radius).min(self.height.saturating_sub(1));
        let mut out = Vec::new();
        for x in x0..=x1 {
            for y in y0..=y1 {
                out.push(Tile::new(x, y));
            }
        }
        out
    }
}
