//! The spatial/resource ledger: map, zones, bed inventories, and the shared
//! contention queues.
//!
//! The ledger is the only cross-actor mutable state.  Every method here is a
//! single logical step; there is no interleaving between actors, so no
//! caller can observe a half-applied reservation or queue edit.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ed_core::Tile;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::layout::MazeLayout;
use crate::maze::Maze;
use crate::queue::PriorityQueue;
use crate::zone::{BedInventory, Zone};

/// Zone whose capacity may be overridden from configuration.
pub const DIAGNOSTIC_ROOM: &str = "diagnostic room";

// ── Queues ────────────────────────────────────────────────────────────────────

/// Names of the shared queues.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueueName {
    Triage,
    BedsideNurseWaiting,
    Pager,
    DoctorGlobal,
    Assessment,
}

impl QueueName {
    pub const ALL: [QueueName; 5] = [
        QueueName::Triage,
        QueueName::BedsideNurseWaiting,
        QueueName::Pager,
        QueueName::DoctorGlobal,
        QueueName::Assessment,
    ];

    pub fn key(self) -> &'static str {
        match self {
            QueueName::Triage              => "triage_queue",
            QueueName::BedsideNurseWaiting => "bedside_nurse_waiting",
            QueueName::Pager               => "pager",
            QueueName::DoctorGlobal        => "doctor_global",
            QueueName::Assessment          => "assessment_queue",
        }
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The shared queues.  Per-doctor waitlists live in the doctors' scratch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Queues {
    pub triage_queue:          PriorityQueue,
    pub bedside_nurse_waiting: PriorityQueue,
    pub pager:                 PriorityQueue,
    pub doctor_global:         PriorityQueue,
    pub assessment_queue:      PriorityQueue,
}

impl Queues {
    pub fn get(&self, name: QueueName) -> &PriorityQueue {
        match name {
            QueueName::Triage              => &self.triage_queue,
            QueueName::BedsideNurseWaiting => &self.bedside_nurse_waiting,
            QueueName::Pager               => &self.pager,
            QueueName::DoctorGlobal        => &self.doctor_global,
            QueueName::Assessment          => &self.assessment_queue,
        }
    }

    pub fn get_mut(&mut self, name: QueueName) -> &mut PriorityQueue {
        match name {
            QueueName::Triage              => &mut self.triage_queue,
            QueueName::BedsideNurseWaiting => &mut self.bedside_nurse_waiting,
            QueueName::Pager               => &mut self.pager,
            QueueName::DoctorGlobal        => &mut self.doctor_global,
            QueueName::Assessment          => &mut self.assessment_queue,
        }
    }

    /// Remove `name` from every queue.
    pub fn remove_everywhere(&mut self, name: &str) {
        for q in QueueName::ALL {
            self.get_mut(q).remove(name);
        }
    }

    /// Queues containing `name`.
    pub fn membership(&self, name: &str) -> Vec<QueueName> {
        QueueName::ALL.into_iter().filter(|q| self.get(*q).contains(name)).collect()
    }
}

// ── LedgerState ───────────────────────────────────────────────────────────────

/// Persisted bed inventory of one zone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BedState {
    pub beds:        BTreeSet<Tile>,
    pub assignments: BTreeMap<String, Tile>,
    pub available:   BTreeSet<Tile>,
}

/// Persisted occupancy of one zone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneState {
    pub capacity:         usize,
    pub current_patients: Vec<String>,
}

/// Everything mutable in the ledger; the map itself is rebuilt from the
/// layout on load.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerState {
    pub zones:                       BTreeMap<String, ZoneState>,
    pub beds:                        BTreeMap<String, BedState>,
    pub queues:                      Queues,
    pub triage_patients:             usize,
    pub triage_capacity:             usize,
    pub doctors_taking_more_patients: Vec<String>,
}

// ── Ledger ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Ledger {
    pub maze:              Maze,
    pub zones:             BTreeMap<String, Zone>,
    pub beds:              BTreeMap<String, BedInventory>,
    pub queues:            Queues,
    /// Patients currently being triaged.
    pub triage_patients:   usize,
    /// Number of triage chairs.
    pub triage_capacity:   usize,
    /// Doctors below their assignment cap.
    pub doctors_accepting: Vec<String>,
}

impl Ledger {
    /// Build the map and zone inventories from a layout.
    /// `diagnostic_capacity` overrides the diagnostic table count.
    pub fn from_layout(layout: &MazeLayout, diagnostic_capacity: Option<usize>) -> Self {
        let mut maze = layout.build();
        let mut zones = BTreeMap::new();
        let mut beds = BTreeMap::new();

        for spec in &layout.zones {
            let address = maze.address(&format!("{}:{}", spec.name, spec.object));
            let tiles = maze.resolve_address(&address);
            let mut capacity = spec.capacity.unwrap_or(tiles.len());
            if spec.name == DIAGNOSTIC_ROOM {
                if let Some(cap) = diagnostic_capacity {
                    capacity = cap;
                }
            }
            if spec.bed_tracked {
                let mut inventory = BedInventory::new(tiles.iter().copied());
                if spec.remove_beds > 0 {
                    let removed = inventory.remove_available(spec.remove_beds);
                    capacity = capacity.saturating_sub(removed.len());
                }
                for tile in &inventory.beds {
                    maze.register_address(bed_address(&maze, &spec.name, *tile), *tile);
                }
                beds.insert(spec.name.clone(), inventory);
            }
            zones.insert(spec.name.clone(), Zone::new(spec.name.clone(), capacity, spec.bed_tracked));
        }

        let triage_capacity = maze.address_len(&maze.address("triage room:chair"));

        Ledger {
            maze,
            zones,
            beds,
            queues: Queues::default(),
            triage_patients: 0,
            triage_capacity,
            doctors_accepting: Vec::new(),
        }
    }

    // ── Zones ─────────────────────────────────────────────────────────────

    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.zones.get(name)
    }

    pub fn zone_mut(&mut self, name: &str) -> Option<&mut Zone> {
        self.zones.get_mut(name)
    }

    /// Bed-tracked zones: a free bed exists.  Untracked zones: occupancy is
    /// below capacity.  Unknown zones never have space.
    pub fn zone_has_space(&self, name: &str) -> bool {
        if let Some(inv) = self.beds.get(name) {
            return !inv.available.is_empty();
        }
        self.zones.get(name).is_some_and(|z| z.occupancy() < z.capacity)
    }

    /// Add `patient` to a zone's patient list (no duplicates).
    pub fn admit_to_zone(&mut self, zone: &str, patient: &str) -> bool {
        self.zones.get_mut(zone).is_some_and(|z| z.admit(patient))
    }

    pub fn remove_from_zone(&mut self, zone: &str, patient: &str) -> bool {
        self.zones.get_mut(zone).is_some_and(|z| z.discharge(patient))
    }

    /// Remove `patient` from every zone's patient list.
    pub fn discharge_patient(&mut self, patient: &str) {
        for zone in self.zones.values_mut() {
            zone.discharge(patient);
        }
    }

    /// First zone (by name) listing `patient`.
    pub fn find_patient_zone(&self, patient: &str) -> Option<&str> {
        self.zones.values().find(|z| z.contains(patient)).map(|z| z.name.as_str())
    }

    // ── Beds ──────────────────────────────────────────────────────────────

    /// Idempotent bed reservation; `None` if the zone is untracked or full.
    pub fn reserve_bed(&mut self, actor: &str, zone: &str, preferred: Option<Tile>) -> Option<Tile> {
        let tile = self.beds.get_mut(zone)?.assign(actor, preferred);
        if tile.is_none() {
            debug!(actor, zone, "no free bed");
        }
        tile
    }

    /// Reservation that never fails on a tracked zone with at least one bed:
    /// when every bed is taken the patient doubles up on the least-held one.
    pub fn reserve_bed_overriding(&mut self, actor: &str, zone: &str) -> Option<Tile> {
        let inv = self.beds.get_mut(zone)?;
        let full = inv.available.is_empty() && inv.bed_of(actor).is_none();
        let tile = inv.assign_overflow(actor);
        if full {
            warn!(actor, zone, "zone full; paged patient placed over capacity");
        }
        tile
    }

    /// Idempotent release.  `zone = None` releases the actor's bed wherever
    /// it is held.
    pub fn release_bed(&mut self, actor: &str, zone: Option<&str>) {
        match zone {
            Some(zone) => {
                if let Some(inv) = self.beds.get_mut(zone) {
                    inv.release(actor);
                }
            }
            None => {
                for inv in self.beds.values_mut() {
                    inv.release(actor);
                }
            }
        }
    }

    /// `(zone, tile)` of the bed `actor` holds.
    pub fn bed_of(&self, actor: &str) -> Option<(&str, Tile)> {
        self.beds
            .iter()
            .find_map(|(zone, inv)| inv.bed_of(actor).map(|t| (zone.as_str(), t)))
    }

    /// Take `n` free beds of `zone` out of service; returns how many were
    /// removed.  Capacity shrinks accordingly.
    pub fn remove_beds(&mut self, zone: &str, n: usize) -> usize {
        let Some(inv) = self.beds.get_mut(zone) else { return 0 };
        let removed = inv.remove_available(n);
        for tile in &removed {
            let address = bed_address(&self.maze, zone, *tile);
            self.maze.unregister_address(&address, *tile);
        }
        if let Some(z) = self.zones.get_mut(zone) {
            z.capacity = z.capacity.saturating_sub(removed.len());
        }
        removed.len()
    }

    /// Bed invariant across every tracked zone.
    pub fn bed_invariant_holds(&self) -> bool {
        self.beds.values().all(BedInventory::invariant_holds)
    }

    /// Address of a single bed tile.
    pub fn bed_address(&self, zone: &str, tile: Tile) -> String {
        bed_address(&self.maze, zone, tile)
    }

    // ── Departures ────────────────────────────────────────────────────────

    /// Purge `name` from every queue and zone and free its bed.
    pub fn remove_everywhere(&mut self, name: &str) {
        self.queues.remove_everywhere(name);
        self.discharge_patient(name);
        self.release_bed(name, None);
    }

    /// `true` when `name` appears in no queue, no zone list, and holds no bed.
    pub fn is_absent(&self, name: &str) -> bool {
        self.queues.membership(name).is_empty()
            && self.find_patient_zone(name).is_none()
            && self.bed_of(name).is_none()
    }

    // ── Doctors accepting ─────────────────────────────────────────────────

    pub fn mark_doctor_accepting(&mut self, doctor: &str) {
        if !self.doctors_accepting.iter().any(|d| d == doctor) {
            self.doctors_accepting.push(doctor.to_string());
        }
    }

    pub fn unmark_doctor_accepting(&mut self, doctor: &str) {
        self.doctors_accepting.retain(|d| d != doctor);
    }

    // ── Persistence ───────────────────────────────────────────────────────

    pub fn snapshot(&self) -> LedgerState {
        LedgerState {
            zones: self
                .zones
                .iter()
                .map(|(k, z)| {
                    (k.clone(), ZoneState { capacity: z.capacity, current_patients: z.current_patients.clone() })
                })
                .collect(),
            beds: self
                .beds
                .iter()
                .map(|(k, inv)| {
                    (k.clone(), BedState {
                        beds:        inv.beds.clone(),
                        assignments: inv.assignments.clone(),
                        available:   inv.available.clone(),
                    })
                })
                .collect(),
            queues:                       self.queues.clone(),
            triage_patients:              self.triage_patients,
            triage_capacity:              self.triage_capacity,
            doctors_taking_more_patients: self.doctors_accepting.clone(),
        }
    }

    /// Apply a persisted state.  Zones absent from the map are ignored;
    /// availability is recomputed from the assignments so the bed invariant
    /// holds after any restore.
    pub fn restore(&mut self, state: LedgerState) {
        for (name, zs) in state.zones {
            match self.zones.get_mut(&name) {
                Some(z) => {
                    z.capacity = zs.capacity;
                    z.current_patients = zs.current_patients;
                }
                None => warn!(zone = %name, "persisted zone not on map; ignored"),
            }
        }
        for (name, bs) in state.beds {
            let Some(inv) = self.beds.get_mut(&name) else {
                warn!(zone = %name, "persisted bed inventory not on map; ignored");
                continue;
            };
            let beds = if bs.beds.is_empty() { inv.beds.clone() } else { bs.beds };
            let assignments: BTreeMap<String, Tile> =
                bs.assignments.into_iter().filter(|(_, t)| beds.contains(t)).collect();
            let assigned: BTreeSet<Tile> = assignments.values().copied().collect();
            if bs.available.iter().any(|t| assigned.contains(t)) {
                warn!(zone = %name, "persisted bed sets overlap; availability recomputed");
            }
            let available = beds.difference(&assigned).copied().collect();
            // Keep per-bed addresses in step with beds taken out of service.
            for tile in inv.beds.difference(&beds).copied().collect::<Vec<_>>() {
                let address = bed_address(&self.maze, &name, tile);
                self.maze.unregister_address(&address, tile);
            }
            *inv = BedInventory { beds, assignments, available };
        }
        self.queues = state.queues;
        self.triage_patients = state.triage_patients;
        if state.triage_capacity > 0 {
            self.triage_capacity = state.triage_capacity;
        }
        self.doctors_accepting = state.doctors_taking_more_patients;
    }
}

fn bed_address(maze: &Maze, zone: &str, tile: Tile) -> String {
    maze.address(&format!("{zone}:bed:{}:{}", tile.x, tile.y))
}
