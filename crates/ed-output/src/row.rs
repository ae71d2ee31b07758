//! Plain data row types written by output backends.

use serde::Serialize;

/// Department load and activity for one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSummaryRow {
    pub step:               u64,
    pub sim_time:           String,
    pub patients:           usize,
    pub staff:              usize,
    pub arrivals:           usize,
    pub departures:         usize,
    pub moved:              usize,
    pub encounters:         usize,
    pub rescued:            usize,
    pub timed_out:          usize,
    pub boosted:            usize,
    pub preload_departures: usize,
    pub triage_queue:       usize,
    pub doctor_global:      usize,
}

/// Occupancy of one zone at one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneOccupancyRow {
    pub step:     u64,
    pub zone:     String,
    pub current:  usize,
    pub capacity: usize,
}

/// One row of `completed_patient_stage_times.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedStageRow {
    pub name:                    String,
    #[serde(rename = "CTAS")]
    pub ctas:                    u8,
    pub real_stage1_minutes:     f64,
    pub real_stage2_minutes:     f64,
    pub real_stage3_minutes:     f64,
    pub original_stage1_minutes: Option<f64>,
    pub original_stage2_minutes: Option<f64>,
    pub original_stage3_minutes: Option<f64>,
}

/// One row of `ed_metrics.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdMetricsRow {
    pub name:                     String,
    #[serde(rename = "CTAS")]
    pub ctas:                     u8,
    #[serde(rename = "ICD_code")]
    pub icd_code:                 String,
    pub injuries_zone:            String,
    pub door_to_doctor_minutes:   f64,
    pub length_of_stay_minutes:   f64,
    pub treatment_time_minutes:   f64,
    pub boarding_time_minutes:    f64,
    pub left_without_being_seen:  bool,
    pub lwbs_wait_minutes:        Option<f64>,
    pub admitted_to_hospital:     bool,
    pub lingered_after_discharge: bool,
    pub completed_treatment:      bool,
    pub stage1_target_minutes:    Option<f64>,
    pub stage2_target_minutes:    Option<f64>,
    pub stage3_target_minutes:    Option<f64>,
}
