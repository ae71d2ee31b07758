//! A simulated person: name plus scratch.

use ed_core::{Role, SimConfig, Tile};
use ed_spatial::Ledger;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::TickContext;
use crate::metrics::DataCollection;
use crate::plan::{Movement, Plan, places};
use crate::roster::Roster;
use crate::scratch::{
    BedsideNurseScratch, CommonScratch, DoctorScratch, PatientScratch, RoleScratch, Scratch, TriageNurseScratch,
};
use crate::state::Occupied;
use crate::{bedside_nurse, doctor, movement, patient, triage_nurse};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub name:    String,
    pub scratch: Scratch,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: Role, tile: Tile) -> Self {
        let mut scratch = Scratch::new(role);
        scratch.common.curr_tile = Some(tile);
        Actor { name: name.into(), scratch }
    }

    pub fn role(&self) -> Role {
        self.scratch.role.role()
    }

    pub fn tile(&self) -> Option<Tile> {
        self.scratch.common.curr_tile
    }

    // ── Role views ────────────────────────────────────────────────────────

    pub fn patient(&self) -> Option<&PatientScratch> {
        match &self.scratch.role {
            RoleScratch::Patient(p) => Some(p),
            _ => None,
        }
    }

    pub fn patient_mut(&mut self) -> Option<&mut PatientScratch> {
        match &mut self.scratch.role {
            RoleScratch::Patient(p) => Some(p),
            _ => None,
        }
    }

    pub fn bedside_nurse(&self) -> Option<&BedsideNurseScratch> {
        match &self.scratch.role {
            RoleScratch::BedsideNurse(n) => Some(n),
            _ => None,
        }
    }

    pub fn doctor(&self) -> Option<&DoctorScratch> {
        match &self.scratch.role {
            RoleScratch::Doctor(d) => Some(d),
            _ => None,
        }
    }

    pub fn doctor_mut(&mut self) -> Option<&mut DoctorScratch> {
        match &mut self.scratch.role {
            RoleScratch::Doctor(d) => Some(d),
            _ => None,
        }
    }

    /// `(name, common, patient)` as disjoint borrows.
    pub fn patient_parts(&mut self) -> Option<(&str, &mut CommonScratch, &mut PatientScratch)> {
        let Scratch { common, role } = &mut self.scratch;
        match role {
            RoleScratch::Patient(p) => Some((self.name.as_str(), common, p)),
            _ => None,
        }
    }

    pub fn triage_nurse_parts(&mut self) -> Option<(&str, &mut CommonScratch, &mut TriageNurseScratch)> {
        let Scratch { common, role } = &mut self.scratch;
        match role {
            RoleScratch::TriageNurse(t) => Some((self.name.as_str(), common, t)),
            _ => None,
        }
    }

    pub fn bedside_nurse_parts(&mut self) -> Option<(&str, &mut CommonScratch, &mut BedsideNurseScratch)> {
        let Scratch { common, role } = &mut self.scratch;
        match role {
            RoleScratch::BedsideNurse(n) => Some((self.name.as_str(), common, n)),
            _ => None,
        }
    }

    pub fn doctor_parts(&mut self) -> Option<(&str, &mut CommonScratch, &mut DoctorScratch)> {
        let Scratch { common, role } = &mut self.scratch;
        match role {
            RoleScratch::Doctor(d) => Some((self.name.as_str(), common, d)),
            _ => None,
        }
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// One tick: expire a finished conversation, let the role decide its
    /// plan, then walk.  The actor must not be in `ctx.roster` while this
    /// runs.  `None` when the actor has no tile.
    pub fn advance(&mut self, ctx: &mut TickContext<'_>) -> Option<Movement> {
        let now = ctx.now;
        let common = &mut self.scratch.common;
        if common.chatting_end_time.is_some_and(|end| now >= end) {
            common.end_chat();
            common.act_path_set = false;
        }

        match self.role() {
            Role::Patient      => patient::plan(self, ctx),
            Role::TriageNurse  => triage_nurse::plan(self, ctx),
            Role::BedsideNurse => bedside_nurse::plan(self, ctx),
            Role::Doctor       => doctor::plan(self, ctx),
        }

        movement::resolve(&self.name, &mut self.scratch.common, ctx)
    }

    /// Standing on an exit tile with the exit as its destination.
    pub fn is_exiting(&self, ledger: &Ledger) -> bool {
        let Some(tile) = self.tile() else { return false };
        let exit = ledger.maze.address(places::EXIT);
        ledger.maze.arena_of(tile) == Some(places::EXIT)
            && self.scratch.common.next_step == Some(Plan::GoToAddress(exit))
    }

    /// Detach a departing actor from every shared structure and from the
    /// staff still holding it, and merge a patient's final record.
    pub fn leave_ed(&self, ledger: &mut Ledger, roster: &mut Roster, metrics: &mut DataCollection, config: &SimConfig) {
        ledger.remove_everywhere(&self.name);
        for other in roster.iter_mut() {
            let Scratch { common, role } = &mut other.scratch;
            match role {
                RoleScratch::BedsideNurse(n) if n.occupied.patient() == Some(self.name.as_str()) => {
                    n.occupied = Occupied::Idle;
                    common.clear_plan();
                }
                RoleScratch::Doctor(d) => {
                    doctor::release_patient(&other.name, d, &self.name, ledger, config);
                    if common.next_step.as_ref().and_then(Plan::approach_target) == Some(self.name.as_str()) {
                        common.clear_plan();
                    }
                }
                RoleScratch::TriageNurse(t) if t.chatting_patient.as_deref() == Some(self.name.as_str()) => {
                    t.chatting_patient = None;
                    ledger.triage_patients = ledger.triage_patients.saturating_sub(1);
                }
                _ => {}
            }
        }
        if let Some(p) = self.patient() {
            metrics.patient_mut(&self.name).save_final(p);
        }
        debug!(actor = %self.name, "left the department");
    }
}
