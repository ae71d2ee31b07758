//! Staged wait targets carried by each patient.
//!
//! | Stage | Budget                              | Surge handling                        |
//! |-------|-------------------------------------|---------------------------------------|
//! | 1     | arrival → initial assessment        | extra stored, added once in a bed     |
//! | 2     | initial assessment → disposition    | extra stored, added at result wait    |
//! | 3     | disposition → exit                  | log-mean shift at sampling time       |
//!
//! Stage 1's ready-at is anchored at arrival.  Stage 2 and 3 ready-at times
//! are filled in by the patient when it enters those stages.

use chrono::NaiveDateTime;
use ed_core::{Acuity, SimRng, minutes, timestamp};
use serde::{Deserialize, Serialize};

use crate::distribution::{Stage, WaitConfig};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagedWaitTargets {
    pub stage1_minutes:     Option<f64>,
    pub stage1_surge_extra: f64,
    pub stage2_minutes:     Option<f64>,
    pub stage2_surge_extra: f64,
    pub stage3_minutes:     Option<f64>,
    #[serde(with = "timestamp::option")]
    pub initial_assessment_ready_at: Option<NaiveDateTime>,
    #[serde(with = "timestamp::option")]
    pub disposition_ready_at: Option<NaiveDateTime>,
    #[serde(with = "timestamp::option")]
    pub exit_ready_at: Option<NaiveDateTime>,
    pub initial_assessment_done: bool,
    pub disposition_done: bool,
}

impl StagedWaitTargets {
    /// Fill in any budget not yet sampled.  Already-sampled budgets are left
    /// alone, so calling this on a reloaded patient is harmless.
    pub fn assign(&mut self, config: &WaitConfig, rng: &mut SimRng, acuity: Acuity, now: NaiveDateTime, surge: f64) {
        let surge_excess = (surge - 1.0).max(0.0);

        if self.stage1_minutes.is_none() {
            let base = config.sample_minutes(rng, acuity, Stage::ArrivalToInitialAssessment, 1.0);
            self.stage1_minutes = Some(base);
            self.stage1_surge_extra = base * surge_excess;
        }
        if self.initial_assessment_ready_at.is_none() {
            self.initial_assessment_ready_at = Some(now + minutes(self.stage1_minutes.unwrap_or(0.0)));
        }

        if self.stage2_minutes.is_none() {
            let base = config.sample_minutes(rng, acuity, Stage::InitialAssessmentToDisposition, 1.0);
            self.stage2_minutes = Some(base);
            self.stage2_surge_extra = base * surge_excess;
        }

        if self.stage3_minutes.is_none() {
            self.stage3_minutes = Some(config.sample_minutes(rng, acuity, Stage::DispositionToExit, surge));
        }
    }

    /// Push the assessment gate back by the stage-1 surge extra, anchored no
    /// earlier than `now`.
    pub fn apply_stage1_surge(&mut self, now: NaiveDateTime) {
        if self.stage1_surge_extra > 0.0 {
            let base = self.initial_assessment_ready_at.unwrap_or(now).max(now);
            self.initial_assessment_ready_at = Some(base + minutes(self.stage1_surge_extra));
        }
    }

    /// Push the disposition gate back by the stage-2 surge extra.
    pub fn apply_stage2_surge(&mut self, now: NaiveDateTime) {
        if self.stage2_surge_extra > 0.0 {
            let base = self.disposition_ready_at.unwrap_or(now).max(now);
            self.disposition_ready_at = Some(base + minutes(self.stage2_surge_extra));
        }
    }

    /// Stage-1 budget including its surge extra.
    pub fn stage1_total(&self) -> f64 {
        self.stage1_minutes.unwrap_or(0.0) + self.stage1_surge_extra
    }

    pub fn stage2_total(&self) -> f64 {
        self.stage2_minutes.unwrap_or(0.0) + self.stage2_surge_extra
    }

    pub fn stage3_total(&self) -> f64 {
        self.stage3_minutes.unwrap_or(0.0)
    }
}
