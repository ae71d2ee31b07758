//! Aggregated per-actor metrics (`reverie/data_collection.json`).

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use ed_core::{Acuity, Role, minutes_between, timestamp};
use serde::{Deserialize, Serialize};

use crate::scratch::PatientScratch;
use crate::state::PatientState;

/// One bucket per role, keyed by actor name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataCollection {
    #[serde(rename = "Patient")]
    pub patient:       BTreeMap<String, PatientRecord>,
    #[serde(rename = "Triage Nurse")]
    pub triage_nurse:  BTreeMap<String, TriageNurseRecord>,
    #[serde(rename = "Bedside Nurse")]
    pub bedside_nurse: BTreeMap<String, BedsideNurseRecord>,
    #[serde(rename = "Doctor")]
    pub doctor:        BTreeMap<String, DoctorRecord>,
}

impl DataCollection {
    /// Create the empty record for a new actor.  Existing records are kept.
    pub fn register(&mut self, name: &str, role: Role, exempt: bool) {
        match role {
            Role::Patient => {
                self.patient
                    .entry(name.to_string())
                    .or_insert_with(|| PatientRecord { exempt_from_data_collection: exempt, ..Default::default() });
            }
            Role::TriageNurse  => { self.triage_nurse.entry(name.to_string()).or_default(); }
            Role::BedsideNurse => { self.bedside_nurse.entry(name.to_string()).or_default(); }
            Role::Doctor       => { self.doctor.entry(name.to_string()).or_default(); }
        }
    }

    pub fn patient_mut(&mut self, name: &str) -> &mut PatientRecord {
        self.patient.entry(name.to_string()).or_default()
    }

    pub fn bedside_nurse_mut(&mut self, name: &str) -> &mut BedsideNurseRecord {
        self.bedside_nurse.entry(name.to_string()).or_default()
    }

    pub fn role_count(&self, role: Role) -> usize {
        match role {
            Role::Patient      => self.patient.len(),
            Role::TriageNurse  => self.triage_nurse.len(),
            Role::BedsideNurse => self.bedside_nurse.len(),
            Role::Doctor       => self.doctor.len(),
        }
    }
}

// ── Patient ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientRecord {
    #[serde(rename = "ICD-10-CA_code")]
    pub icd_code:         Option<String>,
    #[serde(rename = "CTAS_score")]
    pub ctas_score:       Option<Acuity>,
    pub injuries_zone:    Option<String>,
    pub time_spent_area:  BTreeMap<String, f64>,
    pub time_spent_state: BTreeMap<String, f64>,

    pub tiles_traveled:      u64,
    pub travel_time_minutes: f64,
    pub travel_time_state:   BTreeMap<String, f64>,
    pub travel_time_area:    BTreeMap<String, f64>,

    pub exempt_from_data_collection: bool,

    /// Stage budgets including surge extras.
    pub stage1_minutes: Option<f64>,
    pub stage2_minutes: Option<f64>,
    pub stage3_minutes: Option<f64>,

    pub left_department_by_choice: WalkoutRecord,
    pub lingered_after_discharge:  LingerRecord,
    pub admitted_to_hospital:      AdmissionRecord,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkoutRecord {
    pub occurred:     bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state:        Option<PatientState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_minutes: Option<f64>,
    #[serde(with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub timestamp:    Option<NaiveDateTime>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LingerRecord {
    pub occurred: bool,
    #[serde(with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_duration_minutes: Option<f64>,
    #[serde(with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionRecord {
    pub occurred: bool,
    #[serde(with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub boarding_start: Option<NaiveDateTime>,
    #[serde(with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub boarding_end: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boarding_duration_minutes: Option<f64>,
}

impl PatientRecord {
    /// Minutes spent in the current flow state so far.
    pub fn minutes_in_state(&self, state: PatientState) -> f64 {
        self.time_spent_state.get(state.key()).copied().unwrap_or(0.0)
    }

    pub fn add_time(&mut self, area: Option<&str>, state: PatientState, minutes: f64) {
        if let Some(area) = area {
            *self.time_spent_area.entry(area.to_string()).or_insert(0.0) += minutes;
        }
        *self.time_spent_state.entry(state.key().to_string()).or_insert(0.0) += minutes;
    }

    pub fn add_travel(&mut self, tiles: u64, minutes: f64, state: PatientState, area: Option<&str>) {
        self.tiles_traveled += tiles;
        self.travel_time_minutes += minutes;
        *self.travel_time_state.entry(state.key().to_string()).or_insert(0.0) += minutes;
        if let Some(area) = area {
            *self.travel_time_area.entry(area.to_string()).or_insert(0.0) += minutes;
        }
    }

    /// Merge the final scratch into the record when the patient departs.
    pub fn save_final(&mut self, s: &PatientScratch) {
        self.icd_code = s.icd.clone();
        self.ctas_score = s.ctas;
        self.injuries_zone = s.injuries_zone.clone();
        self.exempt_from_data_collection = s.exempt_from_data_collection;
        self.stage1_minutes = Some(s.targets.stage1_total());
        self.stage2_minutes = Some(s.targets.stage2_total());
        self.stage3_minutes = s.targets.stage3_minutes;

        if s.left_without_being_seen {
            self.left_department_by_choice = WalkoutRecord {
                occurred:     true,
                state:        s.left_without_being_seen_state,
                wait_minutes: s.left_without_being_seen_wait_minutes,
                timestamp:    s.left_without_being_seen_time,
            };
        }

        if let Some(decided_at) = s.linger_started_at {
            self.lingered_after_discharge = LingerRecord {
                occurred:                  true,
                decided_at:                Some(decided_at),
                expected_duration_minutes: s.linger_duration_minutes,
                ended_at:                  s.linger_end_time.filter(|_| !s.lingering_after_discharge),
            };
        }

        if s.admitted_to_hospital {
            let duration = match (s.admission_boarding_start, s.admission_boarding_end) {
                (Some(start), Some(end)) => Some(minutes_between(start, end)),
                _ => None,
            };
            self.admitted_to_hospital = AdmissionRecord {
                occurred:                  true,
                boarding_start:            s.admission_boarding_start,
                boarding_end:              s.admission_boarding_end,
                boarding_duration_minutes: duration,
            };
        }
    }
}

// ── Staff ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageNurseRecord {
    /// `[patient, timestamp]`.
    #[serde(rename = "Patients_Triaged")]
    pub patients_triaged: Vec<(String, String)>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BedsideNurseRecord {
    /// `[patient, timestamp]`.
    #[serde(rename = "Patients_Attended")]
    pub patients_attended: Vec<(String, String)>,
    /// Minutes per occupied label.
    #[serde(rename = "State_Durations")]
    pub state_durations:   BTreeMap<String, f64>,
    #[serde(rename = "Action_Log")]
    pub action_log:        Vec<ActionLogEntry>,
    #[serde(rename = "Interactions")]
    pub interactions:      Vec<InteractionEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub time:        String,
    pub plan:        String,
    pub state:       String,
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_persona: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_role:    Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionEntry {
    pub time:             String,
    pub other_persona:    String,
    pub other_role:       Option<String>,
    pub interaction_type: String,
    pub state:            String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoctorRecord {
    /// `[priority, patient]` in the order patients were seen.
    #[serde(rename = "Patients_Attended")]
    pub patients_attended: Vec<(f64, String)>,
}
