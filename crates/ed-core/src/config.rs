//! Run configuration knobs.
//!
//! `SimConfig` is the configuration half of a run's `meta.json`.  Every field
//! carries a serde default so a partial document (or `{}`) yields a runnable
//! configuration, and the full struct is written back on save.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Acuity, EdError, EdResult};

/// Probability (or other scalar) keyed by acuity string `"1"`..`"5"`.
pub type AcuityTable = BTreeMap<String, f64>;

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Simulated seconds per step.
    pub sec_per_step: u32,

    /// Master RNG seed.  The same seed always produces identical runs.
    pub seed: u64,

    // ── Arrivals and surge ────────────────────────────────────────────────
    /// Multiplier on the hourly arrival curve.
    pub patient_rate_modifier: f64,
    /// Arrival rate at which no surge slowdown applies.
    pub surge_baseline_rate: f64,
    /// Slope of the surge multiplier above the baseline.
    pub surge_slowdown_scale: f64,
    /// Arrival accumulator carried between steps.
    pub add_patient_threshold: f64,

    // ── Queueing ──────────────────────────────────────────────────────────
    /// Queue key multiplier: key = acuity * priority_factor.
    pub priority_factor: f64,
    pub priority_boost_interval_minutes: f64,
    pub global_queue_aging_interval_minutes: f64,
    pub triage_timeout_minutes: f64,

    // ── Patient flow ──────────────────────────────────────────────────────
    /// Minutes a patient spends at the diagnostic table (before surge).
    pub testing_time: f64,
    /// Minutes until a test result is back (before surge).
    pub testing_result_time: f64,
    pub testing_probability_by_ctas: AcuityTable,
    pub patient_walkout_probability: f64,
    pub patient_walkout_check_minutes: f64,
    pub patient_post_discharge_linger_probability: f64,
    pub patient_post_discharge_linger_minutes: f64,
    pub simulate_hospital_admission: bool,
    pub admission_probability_by_ctas: AcuityTable,
    pub admission_boarding_minutes_min: f64,
    pub admission_boarding_minutes_max: f64,

    // ── Staff ─────────────────────────────────────────────────────────────
    pub max_patients_assigned_doctor: usize,
    pub doctor_resting_time: f64,
    pub bedside_resting_time: f64,
    pub doctor_queue_aging_interval_minutes: f64,
    pub doctor_queue_aging_decrement: f64,
    pub doctor_idle_move_minutes: f64,
    pub bedside_idle_move_minutes: f64,
    pub doctor_starting_amount: u32,
    pub triage_starting_amount: u32,
    pub bedside_starting_amount: u32,

    // ── Start-up population ───────────────────────────────────────────────
    /// Fraction (0..=1) of injury-zone beds pre-filled with filler patients.
    pub fill_injuries: f64,
    pub preload_waiting_room_patients: u32,
    pub preload_departure_window_hours: f64,

    // ── Map ───────────────────────────────────────────────────────────────
    /// Overrides the diagnostic room capacity derived from the map.
    pub diagnostic_room_capacity: Option<usize>,

    // ── Travel model (first present wins) ─────────────────────────────────
    pub travel_minutes_per_tile: Option<f64>,
    pub travel_seconds_per_tile: Option<f64>,
    pub travel_speed_mps: Option<f64>,
    pub meters_per_tile: f64,

    // ── Encounters and reporting ──────────────────────────────────────────
    pub conversation_minutes: f64,
    pub chat_radius: u32,
    pub status_interval_steps: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        let testing_probability_by_ctas = [("1", 1.0), ("2", 0.8), ("3", 0.5), ("4", 0.3), ("5", 0.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self {
            sec_per_step:                              60,
            seed:                                      0,
            patient_rate_modifier:                     0.5,
            surge_baseline_rate:                       0.5,
            surge_slowdown_scale:                      0.5,
            add_patient_threshold:                     0.0,
            priority_factor:                           3.0,
            priority_boost_interval_minutes:           5.0,
            global_queue_aging_interval_minutes:       15.0,
            triage_timeout_minutes:                    3.0,
            testing_time:                              30.0,
            testing_result_time:                       60.0,
            testing_probability_by_ctas,
            patient_walkout_probability:               0.0,
            patient_walkout_check_minutes:             20.0,
            patient_post_discharge_linger_probability: 0.0,
            patient_post_discharge_linger_minutes:     30.0,
            simulate_hospital_admission:               false,
            admission_probability_by_ctas:             AcuityTable::new(),
            admission_boarding_minutes_min:            60.0,
            admission_boarding_minutes_max:            480.0,
            max_patients_assigned_doctor:              5,
            doctor_resting_time:                       15.0,
            bedside_resting_time:                      15.0,
            doctor_queue_aging_interval_minutes:       15.0,
            doctor_queue_aging_decrement:              2.0,
            doctor_idle_move_minutes:                  15.0,
            bedside_idle_move_minutes:                 30.0,
            doctor_starting_amount:                    1,
            triage_starting_amount:                    1,
            bedside_starting_amount:                   2,
            fill_injuries:                             0.0,
            preload_waiting_room_patients:             0,
            preload_departure_window_hours:            6.0,
            diagnostic_room_capacity:                  None,
            travel_minutes_per_tile:                   None,
            travel_seconds_per_tile:                   None,
            travel_speed_mps:                          None,
            meters_per_tile:                           1.0,
            conversation_minutes:                      1.0,
            chat_radius:                               1,
            status_interval_steps:                     30,
        }
    }
}

impl SimConfig {
    /// Reject configurations the simulation cannot run with.
    pub fn validate(&self) -> EdResult<()> {
        if self.sec_per_step == 0 {
            return Err(EdError::Config("sec_per_step must be positive".into()));
        }
        if self.surge_baseline_rate <= 0.0 {
            return Err(EdError::Config("surge_baseline_rate must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.fill_injuries) {
            return Err(EdError::Config(format!(
                "fill_injuries must be within [0, 1], got {}",
                self.fill_injuries
            )));
        }
        if self.admission_boarding_minutes_max < self.admission_boarding_minutes_min {
            return Err(EdError::Config("admission boarding max is below min".into()));
        }
        Ok(())
    }

    /// Minutes of simulated time per step.
    #[inline]
    pub fn minutes_per_step(&self) -> f64 {
        f64::from(self.sec_per_step) / 60.0
    }

    /// `1 + max(0, (rate - baseline) / baseline) * scale`.
    pub fn surge_multiplier(&self) -> f64 {
        let excess = (self.patient_rate_modifier - self.surge_baseline_rate) / self.surge_baseline_rate;
        1.0 + excess.max(0.0) * self.surge_slowdown_scale
    }

    /// Surge-scaled testing duration in minutes.
    pub fn surged_testing_time(&self) -> f64 {
        self.testing_time * self.surge_multiplier()
    }

    pub fn surged_testing_result_time(&self) -> f64 {
        self.testing_result_time * self.surge_multiplier()
    }

    pub fn surged_doctor_resting_time(&self) -> f64 {
        self.doctor_resting_time * self.surge_multiplier()
    }

    pub fn surged_bedside_resting_time(&self) -> f64 {
        self.bedside_resting_time * self.surge_multiplier()
    }

    /// Minutes of walking per tile, 0 when no travel model is configured.
    pub fn travel_minutes_per_tile(&self) -> f64 {
        if let Some(m) = self.travel_minutes_per_tile {
            return m.max(0.0);
        }
        if let Some(s) = self.travel_seconds_per_tile {
            return (s / 60.0).max(0.0);
        }
        match self.travel_speed_mps {
            Some(speed) if speed > 0.0 => (self.meters_per_tile / speed) / 60.0,
            _ => 0.0,
        }
    }

    /// Tiles an actor may cover in one step.
    pub fn tiles_per_step(&self) -> usize {
        let per_tile = self.travel_minutes_per_tile();
        if per_tile > 0.0 {
            let secs_per_tile = per_tile * 60.0;
            ((f64::from(self.sec_per_step) / secs_per_tile) as usize).max(1)
        } else {
            (self.sec_per_step as usize).max(1)
        }
    }

    /// Probability that a patient of `acuity` is sent for a test (0.5 when
    /// the table has no entry).
    pub fn testing_probability(&self, acuity: Acuity) -> f64 {
        self.testing_probability_by_ctas.get(&acuity.key()).copied().unwrap_or(0.5)
    }

    /// Probability that a patient of `acuity` is admitted (0 when absent).
    pub fn admission_probability(&self, acuity: Acuity) -> f64 {
        self.admission_probability_by_ctas.get(&acuity.key()).copied().unwrap_or(0.0)
    }
}
