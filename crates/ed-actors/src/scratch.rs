//! Per-actor scratch records.
//!
//! A [`Scratch`] is everything an actor carries between ticks.  It is written
//! to `personas/<name>/scratch.json` on save, with the common fields and the
//! role-specific ones flattened into one object and the role named under
//! `"role"`.

use chrono::NaiveDateTime;
use ed_core::{Acuity, Role, Tile, timestamp};
use ed_sampler::StagedWaitTargets;
use ed_spatial::PriorityQueue;
use serde::{Deserialize, Serialize};

use crate::plan::Plan;
use crate::state::{Occupied, PatientState};

/// `(speaker, line)`.
pub type ChatLine = (String, String);

// ── CommonScratch ─────────────────────────────────────────────────────────────

/// Fields shared by every role.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonScratch {
    pub curr_tile:        Option<Tile>,
    pub description:      String,
    pub act_address:      Option<String>,
    pub act_description:  String,
    pub act_pronunciatio: String,
    /// Set once a path toward the current plan has been computed.
    pub act_path_set:     bool,
    pub planned_path:     Vec<Tile>,
    pub next_step:        Option<Plan>,

    pub chatting_with: Option<String>,
    pub chat:          Option<Vec<ChatLine>>,
    #[serde(with = "timestamp::option")]
    pub chatting_end_time: Option<NaiveDateTime>,

    /// Role-specific timer: resting, testing, or result wait.
    #[serde(with = "timestamp::option")]
    pub time_to_next: Option<NaiveDateTime>,
    #[serde(with = "timestamp::option")]
    pub last_idle_move_time: Option<NaiveDateTime>,
}

impl CommonScratch {
    /// Replace the plan; a different plan discards the cached path.
    pub fn set_plan(&mut self, plan: Plan) {
        if self.next_step.as_ref() != Some(&plan) {
            self.next_step = Some(plan);
            self.act_path_set = false;
            self.planned_path.clear();
        }
    }

    pub fn clear_plan(&mut self) {
        self.next_step = None;
        self.act_path_set = false;
        self.planned_path.clear();
    }

    pub fn is_chatting(&self) -> bool {
        self.chatting_with.is_some()
    }

    pub fn end_chat(&mut self) {
        self.chatting_with = None;
        self.chat = None;
        self.chatting_end_time = None;
    }

    /// `true` when `time_to_next` is set and has passed.
    pub fn timer_expired(&self, now: NaiveDateTime) -> bool {
        self.time_to_next.is_some_and(|t| now >= t)
    }
}

// ── Role scratch ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientScratch {
    #[serde(rename = "ICD")]
    pub icd:           Option<String>,
    #[serde(rename = "CTAS")]
    pub ctas:          Option<Acuity>,
    pub injuries_zone: Option<String>,
    pub next_room:     Option<String>,
    pub state:         PatientState,

    /// Filler patients are left out of every export.
    pub exempt_from_data_collection: bool,

    // Walkout
    pub left_without_being_seen:       bool,
    #[serde(with = "timestamp::option")]
    pub left_without_being_seen_time:  Option<NaiveDateTime>,
    pub left_without_being_seen_state: Option<PatientState>,
    pub left_without_being_seen_wait_minutes: Option<f64>,
    pub walkout_last_check_minute:     f64,
    pub walkout_recorded:              bool,

    // Post-discharge linger
    pub lingering_after_discharge: bool,
    #[serde(with = "timestamp::option")]
    pub linger_started_at:         Option<NaiveDateTime>,
    #[serde(with = "timestamp::option")]
    pub linger_end_time:           Option<NaiveDateTime>,
    pub linger_duration_minutes:   Option<f64>,
    pub linger_recorded:           bool,

    pub bed_assignment: Option<Tile>,
    #[serde(flatten)]
    pub targets:        StagedWaitTargets,
    /// Already pushed onto the assigned doctor's waitlist for assessment.
    pub in_queue:       bool,
    pub assigned_doctor: Option<String>,

    #[serde(with = "timestamp::option")]
    pub preload_departure_at: Option<NaiveDateTime>,
    #[serde(with = "timestamp::option")]
    pub testing_end_time:     Option<NaiveDateTime>,

    // Hospital admission
    pub admitted_to_hospital:     bool,
    #[serde(with = "timestamp::option")]
    pub admission_boarding_start: Option<NaiveDateTime>,
    #[serde(with = "timestamp::option")]
    pub admission_boarding_end:   Option<NaiveDateTime>,
}

impl PatientScratch {
    pub fn acuity(&self) -> Acuity {
        self.ctas.unwrap_or(Acuity::DEFAULT)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageNurseScratch {
    /// Patient whose triage conversation is in progress.
    pub chatting_patient: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BedsideNurseScratch {
    pub occupied: Occupied,
    #[serde(with = "timestamp::option")]
    pub occupied_since: Option<NaiveDateTime>,
    pub last_state_label: Option<String>,
    #[serde(with = "timestamp::option")]
    pub last_state_update_time: Option<NaiveDateTime>,
    pub last_action_plan: Option<String>,
    pub prev_chat_partner: Option<String>,
}

impl BedsideNurseScratch {
    pub fn set_occupied(&mut self, occupied: Occupied, now: NaiveDateTime) {
        if self.occupied != occupied {
            self.occupied = occupied;
            self.occupied_since = Some(now);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoctorScratch {
    pub chatting_patient:          Option<String>,
    pub assigned_patients:         Vec<String>,
    pub assigned_patients_waitlist: PriorityQueue,
    #[serde(with = "timestamp::option")]
    pub last_queue_aging_time:     Option<NaiveDateTime>,
}

impl DoctorScratch {
    /// Drop `patient` from the assigned set and the waitlist.  Returns `true`
    /// if it was assigned.
    pub fn remove_patient(&mut self, patient: &str) -> bool {
        self.assigned_patients_waitlist.remove(patient);
        let before = self.assigned_patients.len();
        self.assigned_patients.retain(|p| p != patient);
        self.assigned_patients.len() != before
    }

    pub fn assign_patient(&mut self, patient: &str) -> bool {
        if self.assigned_patients.iter().any(|p| p == patient) {
            return false;
        }
        self.assigned_patients.push(patient.to_string());
        true
    }
}

/// Role-specific half of a [`Scratch`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum RoleScratch {
    Patient(PatientScratch),
    TriageNurse(TriageNurseScratch),
    BedsideNurse(BedsideNurseScratch),
    Doctor(DoctorScratch),
}

impl RoleScratch {
    pub fn new(role: Role) -> Self {
        match role {
            Role::Patient      => RoleScratch::Patient(PatientScratch::default()),
            Role::TriageNurse  => RoleScratch::TriageNurse(TriageNurseScratch::default()),
            Role::BedsideNurse => RoleScratch::BedsideNurse(BedsideNurseScratch::default()),
            Role::Doctor       => RoleScratch::Doctor(DoctorScratch::default()),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            RoleScratch::Patient(_)      => Role::Patient,
            RoleScratch::TriageNurse(_)  => Role::TriageNurse,
            RoleScratch::BedsideNurse(_) => Role::BedsideNurse,
            RoleScratch::Doctor(_)       => Role::Doctor,
        }
    }
}

// ── Scratch ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scratch {
    #[serde(flatten)]
    pub common: CommonScratch,
    #[serde(flatten)]
    pub role:   RoleScratch,
}

impl Scratch {
    pub fn new(role: Role) -> Self {
        Scratch { common: CommonScratch::default(), role: RoleScratch::new(role) }
    }
}
