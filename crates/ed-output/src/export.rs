//! End-of-run analysis exports written into the run's `analysis/` folder.
//!
//! | File                               | One row per                                     |
//! |------------------------------------|-------------------------------------------------|
//! | `state_times.csv`                  | reported patient: minutes in each flow state    |
//! | `area_times.csv`                   | reported patient: minutes in each area          |
//! | `completed_patient_stage_times.csv`| patient who went through all three stages       |
//! | `ed_metrics.csv`                   | reported patient: door-to-doctor, stay, flags   |
//! | `summary_by_ctas.json`             | acuity bucket (see [`crate::summary`])          |
//!
//! Filler patients are never reported.  Travel time is taken out of the
//! state and area totals before anything is written, except for `LEAVING`
//! where walking is the whole point.  The stored metrics are not changed.

use std::collections::BTreeSet;
use std::path::Path;

use csv::Writer;
use ed_actors::{DataCollection, PatientRecord, PatientState};
use ed_persist::{write_bytes_atomic, write_json_atomic};
use serde::Serialize;
use tracing::info;

use crate::row::{CompletedStageRow, EdMetricsRow};
use crate::summary::summarize_by_ctas;
use crate::{OutputError, OutputResult};

pub const STATE_TIMES_FILE:     &str = "state_times.csv";
pub const AREA_TIMES_FILE:      &str = "area_times.csv";
pub const COMPLETED_STAGE_FILE: &str = "completed_patient_stage_times.csv";
pub const ED_METRICS_FILE:      &str = "ed_metrics.csv";
pub const CTAS_SUMMARY_FILE:    &str = "summary_by_ctas.json";

/// Columns always present in `state_times.csv`, in order.
const REPORTED_STATES: [PatientState; 10] = [
    PatientState::WaitingForTriage,
    PatientState::Triage,
    PatientState::WaitingForNurse,
    PatientState::WaitingForFirstAssessment,
    PatientState::WaitingForTest,
    PatientState::GoingForTest,
    PatientState::WaitingForResult,
    PatientState::WaitingForDoctor,
    PatientState::AdmittedBoarding,
    PatientState::Leaving,
];

const STAGE1: [PatientState; 4] = [
    PatientState::WaitingForTriage,
    PatientState::Triage,
    PatientState::WaitingForNurse,
    PatientState::WaitingForFirstAssessment,
];

const STAGE2: [PatientState; 4] = [
    PatientState::WaitingForTest,
    PatientState::GoingForTest,
    PatientState::WaitingForResult,
    PatientState::WaitingForDoctor,
];

const STAGE3: [PatientState; 2] = [PatientState::WaitingForExit, PatientState::Leaving];

const TREATMENT: [PatientState; 3] =
    [PatientState::WaitingForTest, PatientState::GoingForTest, PatientState::WaitingForResult];

/// Counts from one export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub reported:  usize,
    pub completed: usize,
}

// ── Record helpers ────────────────────────────────────────────────────────────

/// A copy of `record` with travel minutes subtracted from its state and
/// area totals, floored at zero.  `LEAVING` keeps its travel.
pub fn travel_adjusted(record: &PatientRecord) -> PatientRecord {
    let mut r = record.clone();
    for (state, travel) in &record.travel_time_state {
        if state == PatientState::Leaving.key() {
            continue;
        }
        if let Some(t) = r.time_spent_state.get_mut(state) {
            *t = (*t - travel).max(0.0);
        }
    }
    for (area, travel) in &record.travel_time_area {
        if let Some(t) = r.time_spent_area.get_mut(area) {
            *t = (*t - travel).max(0.0);
        }
    }
    r
}

fn ctas(record: &PatientRecord) -> u8 {
    record.ctas_score.map_or(0, |a| a.0)
}

fn minutes_in(record: &PatientRecord, states: &[PatientState]) -> f64 {
    states.iter().map(|s| record.minutes_in_state(*s)).sum()
}

/// Real minutes spent in each of the three stages.
pub fn stage_minutes(record: &PatientRecord) -> (f64, f64, f64) {
    (minutes_in(record, &STAGE1), minutes_in(record, &STAGE2), minutes_in(record, &STAGE3))
}

/// The stage row of a patient who went through all three stages and did not
/// walk out.
pub fn completed_stage_row(name: &str, record: &PatientRecord) -> Option<CompletedStageRow> {
    if record.exempt_from_data_collection || record.left_department_by_choice.occurred {
        return None;
    }
    let (s1, s2, s3) = stage_minutes(record);
    (s1 > 0.0 && s2 > 0.0 && s3 > 0.0).then(|| CompletedStageRow {
        name:                    name.to_string(),
        ctas:                    ctas(record),
        real_stage1_minutes:     s1,
        real_stage2_minutes:     s2,
        real_stage3_minutes:     s3,
        original_stage1_minutes: record.stage1_minutes,
        original_stage2_minutes: record.stage2_minutes,
        original_stage3_minutes: record.stage3_minutes,
    })
}

pub fn ed_metrics_row(name: &str, record: &PatientRecord) -> EdMetricsRow {
    let walkout = &record.left_department_by_choice;
    let left = record.minutes_in_state(PatientState::Leaving) > 0.0;
    EdMetricsRow {
        name:                     name.to_string(),
        ctas:                     ctas(record),
        icd_code:                 record.icd_code.clone().unwrap_or_default(),
        injuries_zone:            record.injuries_zone.clone().unwrap_or_default(),
        door_to_doctor_minutes:   minutes_in(record, &STAGE1),
        length_of_stay_minutes:   record.time_spent_state.values().sum(),
        treatment_time_minutes:   minutes_in(record, &TREATMENT),
        boarding_time_minutes:    record.minutes_in_state(PatientState::AdmittedBoarding),
        left_without_being_seen:  walkout.occurred,
        lwbs_wait_minutes:        walkout.wait_minutes.filter(|_| walkout.occurred),
        admitted_to_hospital:     record.admitted_to_hospital.occurred,
        lingered_after_discharge: record.lingered_after_discharge.occurred,
        completed_treatment:      left && !walkout.occurred,
        stage1_target_minutes:    record.stage1_minutes,
        stage2_target_minutes:    record.stage2_minutes,
        stage3_target_minutes:    record.stage3_minutes,
    }
}

// ── CSV tables ────────────────────────────────────────────────────────────────

fn into_bytes(writer: Writer<Vec<u8>>) -> OutputResult<Vec<u8>> {
    writer.into_inner().map_err(|e| OutputError::Buffer(e.to_string()))
}

fn serialize_rows<S: Serialize>(rows: &[S]) -> OutputResult<Vec<u8>> {
    let mut w = Writer::from_writer(Vec::new());
    for row in rows {
        w.serialize(row)?;
    }
    into_bytes(w)
}

fn cell(value: Option<&f64>) -> String {
    value.map(f64::to_string).unwrap_or_default()
}

/// `state_times.csv`: the reported states first (missing ones as 0), then
/// any other state seen in the run, then whether the patient left.
pub fn state_times_csv(records: &[(&str, PatientRecord)]) -> OutputResult<Vec<u8>> {
    let fixed: Vec<&str> = REPORTED_STATES.iter().map(|s| s.key()).collect();
    let extra: BTreeSet<&str> = records
        .iter()
        .flat_map(|(_, r)| r.time_spent_state.keys().map(String::as_str))
        .filter(|k| !fixed.contains(k))
        .collect();

    let mut w = Writer::from_writer(Vec::new());
    let mut header = vec!["name", "CTAS"];
    header.extend(&fixed);
    header.extend(&extra);
    header.push("left_ED");
    w.write_record(&header)?;

    for (name, r) in records {
        let mut row = vec![name.to_string(), ctas(r).to_string()];
        row.extend(fixed.iter().map(|k| r.time_spent_state.get(*k).copied().unwrap_or(0.0).to_string()));
        row.extend(extra.iter().map(|k| cell(r.time_spent_state.get(*k))));
        row.push((r.minutes_in_state(PatientState::Leaving) > 0.0).to_string());
        w.write_record(&row)?;
    }
    into_bytes(w)
}

/// `area_times.csv`: one column per area seen in the run; blank where the
/// patient never was.
pub fn area_times_csv(records: &[(&str, PatientRecord)]) -> OutputResult<Vec<u8>> {
    let areas: BTreeSet<&str> =
        records.iter().flat_map(|(_, r)| r.time_spent_area.keys().map(String::as_str)).collect();

    let mut w = Writer::from_writer(Vec::new());
    let mut header = vec!["name", "CTAS"];
    header.extend(&areas);
    w.write_record(&header)?;

    for (name, r) in records {
        let mut row = vec![name.to_string(), ctas(r).to_string()];
        row.extend(areas.iter().map(|a| cell(r.time_spent_area.get(*a))));
        w.write_record(&row)?;
    }
    into_bytes(w)
}

// ── Export ────────────────────────────────────────────────────────────────────

/// Write every analysis file into `dir` from the patient metrics.
pub fn export_analysis(dir: &Path, metrics: &DataCollection) -> OutputResult<ExportReport> {
    std::fs::create_dir_all(dir)?;

    let records: Vec<(&str, PatientRecord)> = metrics
        .patient
        .iter()
        .filter(|(_, r)| !r.exempt_from_data_collection)
        .map(|(name, r)| (name.as_str(), travel_adjusted(r)))
        .collect();

    let completed: Vec<CompletedStageRow> =
        records.iter().filter_map(|(name, r)| completed_stage_row(name, r)).collect();
    let ed_metrics: Vec<EdMetricsRow> = records.iter().map(|(name, r)| ed_metrics_row(name, r)).collect();
    let summary = summarize_by_ctas(records.iter().map(|(_, r)| r));

    write_bytes_atomic(&dir.join(STATE_TIMES_FILE), &state_times_csv(&records)?)?;
    write_bytes_atomic(&dir.join(AREA_TIMES_FILE), &area_times_csv(&records)?)?;
    write_bytes_atomic(&dir.join(COMPLETED_STAGE_FILE), &serialize_rows(&completed)?)?;
    write_bytes_atomic(&dir.join(ED_METRICS_FILE), &serialize_rows(&ed_metrics)?)?;
    write_json_atomic(&dir.join(CTAS_SUMMARY_FILE), &summary)?;

    let report = ExportReport { reported: records.len(), completed: completed.len() };
    info!(dir = %dir.display(), reported = report.reported, completed = report.completed, "analysis exported");
    Ok(report)
}
