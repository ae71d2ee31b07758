//! Zones and their bed inventories.

use std::collections::{BTreeMap, BTreeSet};

use ed_core::Tile;
use serde::{Deserialize, Serialize};

/// A named care area.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name:             String,
    pub capacity:         usize,
    pub current_patients: Vec<String>,
    pub bed_tracked:      bool,
}

impl Zone {
    pub fn new(name: impl Into<String>, capacity: usize, bed_tracked: bool) -> Self {
        Zone { name: name.into(), capacity, current_patients: Vec::new(), bed_tracked }
    }

    /// Add `patient` unless already present.
    pub fn admit(&mut self, patient: &str) -> bool {
        if self.current_patients.iter().any(|p| p == patient) {
            return false;
        }
        self.current_patients.push(patient.to_string());
        true
    }

    pub fn discharge(&mut self, patient: &str) -> bool {
        let before = self.current_patients.len();
        self.current_patients.retain(|p| p != patient);
        self.current_patients.len() != before
    }

    pub fn contains(&self, patient: &str) -> bool {
        self.current_patients.iter().any(|p| p == patient)
    }

    pub fn occupancy(&self) -> usize {
        self.current_patients.len()
    }
}

// ── BedInventory ──────────────────────────────────────────────────────────────

/// Bed tiles of one bed-tracked zone.
///
/// `available` is always `beds` minus the set of assigned tiles.  A tile may
/// be held by more than one patient only through
/// [`BedInventory::assign_overflow`]; it becomes available again when its
/// last holder releases it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BedInventory {
    pub beds:        BTreeSet<Tile>,
    pub assignments: BTreeMap<String, Tile>,
    pub available:   BTreeSet<Tile>,
}

impl BedInventory {
    pub fn new(beds: impl IntoIterator<Item = Tile>) -> Self {
        let beds: BTreeSet<Tile> = beds.into_iter().collect();
        BedInventory { available: beds.clone(), beds, assignments: BTreeMap::new() }
    }

    pub fn bed_of(&self, actor: &str) -> Option<Tile> {
        self.assignments.get(actor).copied()
    }

    /// Idempotent reservation.  Prefers `preferred` when it is free, else the
    /// lowest available tile.
    pub fn assign(&mut self, actor: &str, preferred: Option<Tile>) -> Option<Tile> {
        if let Some(tile) = self.bed_of(actor) {
            return Some(tile);
        }
        let tile = match preferred {
            Some(t) if self.available.contains(&t) => t,
            _ => *self.available.first()?,
        };
        self.available.remove(&tile);
        self.assignments.insert(actor.to_string(), tile);
        Some(tile)
    }

    /// Share the least-held bed when none is free.  Used only for
    /// resuscitation patients paged past capacity.
    pub fn assign_overflow(&mut self, actor: &str) -> Option<Tile> {
        if let Some(tile) = self.assign(actor, None) {
            return Some(tile);
        }
        let mut holders: BTreeMap<Tile, usize> = self.beds.iter().map(|t| (*t, 0)).collect();
        for tile in self.assignments.values() {
            if let Some(n) = holders.get_mut(tile) {
                *n += 1;
            }
        }
        let (tile, _) = holders.into_iter().min_by_key(|(t, n)| (*n, *t))?;
        self.assignments.insert(actor.to_string(), tile);
        Some(tile)
    }

    /// Idempotent release.  Returns the freed tile if `actor` held one.
    pub fn release(&mut self, actor: &str) -> Option<Tile> {
        let tile = self.assignments.remove(actor)?;
        if self.beds.contains(&tile) && !self.assignments.values().any(|t| *t == tile) {
            self.available.insert(tile);
        }
        Some(tile)
    }

    pub fn assigned_tiles(&self) -> BTreeSet<Tile> {
        self.assignments.values().copied().collect()
    }

    /// `assigned ∪ available == beds` and `assigned ∩ available == ∅`.
    pub fn invariant_holds(&self) -> bool {
        let assigned = self.assigned_tiles();
        assigned.is_disjoint(&self.available)
            && assigned.union(&self.available).copied().collect::<BTreeSet<_>>() == self.beds
    }

    /// Take up to `n` free beds out of service.
    pub fn remove_available(&mut self, n: usize) -> Vec<Tile> {
        let taken: Vec<Tile> = self.available.iter().rev().take(n).copied().collect();
        for t in &taken {
            self.available.remove(t);
            self.beds.remove(t);
        }
        taken
    }
}
