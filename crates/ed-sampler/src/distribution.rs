//! Per-acuity, per-stage wait distributions.
//!
//! # Document format
//!
//! ```json
//! {
//!   "3": {
//!     "arrival_to_initial_assessment": { "mu": 3.9, "sigma": 0.7, "low": 0, "high": 360 },
//!     "disposition_to_exit":           { "p_zero": 0.45, "mu_pos": 2.8, "sigma_pos": 0.9, "high": 360 }
//!   }
//! }
//! ```
//!
//! An entry with `p_zero` is a hurdle log-normal; an entry with `mu`/`sigma`
//! is a truncated log-normal (`low` defaults to 0, `high` to 1440).

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use ed_core::{Acuity, SimRng};
use serde::{Deserialize, Serialize};

use crate::SamplerResult;

const DEFAULT_DISTRIBUTIONS: &str = include_str!("../data/ctas_wait_distributions.json");

/// Rejection-sampling attempts before clamping.
const MAX_ATTEMPTS: usize = 1000;

fn default_high() -> f64 {
    1440.0
}

// ── Stage ─────────────────────────────────────────────────────────────────────

/// The three staged phases of care.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    ArrivalToInitialAssessment,
    InitialAssessmentToDisposition,
    DispositionToExit,
}

impl Stage {
    pub fn key(self) -> &'static str {
        match self {
            Stage::ArrivalToInitialAssessment     => "arrival_to_initial_assessment",
            Stage::InitialAssessmentToDisposition => "initial_assessment_to_disposition",
            Stage::DispositionToExit              => "disposition_to_exit",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ── WaitDistribution ──────────────────────────────────────────────────────────

/// One configured distribution.  Hurdle is tried first so that an entry
/// carrying `p_zero` never parses as a plain log-normal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WaitDistribution {
    Hurdle {
        p_zero:    f64,
        mu_pos:    f64,
        sigma_pos: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        high:      Option<f64>,
    },
    TruncatedLogNormal {
        mu:    f64,
        sigma: f64,
        #[serde(default)]
        low:   f64,
        #[serde(default = "default_high")]
        high:  f64,
    },
}

impl WaitDistribution {
    /// Draw minutes, rounded to 0.1.  `surge` shifts the log-mean by
    /// `ln(max(surge, 1))`.
    pub fn sample(&self, rng: &mut SimRng, surge: f64) -> f64 {
        let shift = surge.max(1.0).ln();
        match *self {
            WaitDistribution::Hurdle { p_zero, mu_pos, sigma_pos, high } => {
                if rng.random::<f64>() < p_zero {
                    return 0.0;
                }
                let mu = mu_pos + shift;
                let mut x = rng.lognormal(mu, sigma_pos);
                let Some(high) = high else { return round_tenth(x) };
                for _ in 1..MAX_ATTEMPTS {
                    if x <= high {
                        return round_tenth(x);
                    }
                    x = rng.lognormal(mu, sigma_pos);
                }
                round_tenth(x.min(high))
            }
            WaitDistribution::TruncatedLogNormal { mu, sigma, low, high } => {
                let mu = mu + shift;
                let mut x = rng.lognormal(mu, sigma);
                for _ in 1..MAX_ATTEMPTS {
                    if (low..=high).contains(&x) {
                        return round_tenth(x);
                    }
                    x = rng.lognormal(mu, sigma);
                }
                round_tenth(x.clamp(low, high))
            }
        }
    }
}

#[inline]
fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

// ── WaitConfig ────────────────────────────────────────────────────────────────

/// Distributions keyed by acuity string, then stage key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaitConfig(pub BTreeMap<String, BTreeMap<String, WaitDistribution>>);

impl WaitConfig {
    /// The bundled default distributions.
    pub fn builtin() -> SamplerResult<Self> {
        Self::from_json(DEFAULT_DISTRIBUTIONS)
    }

    pub fn from_json(json: &str) -> SamplerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> SamplerResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn get(&self, acuity: Acuity, stage: Stage) -> Option<&WaitDistribution> {
        self.0.get(&acuity.key())?.get(stage.key())
    }

    /// Sampled minutes for `(acuity, stage)`; 0 when nothing is configured.
    pub fn sample_minutes(&self, rng: &mut SimRng, acuity: Acuity, stage: Stage, surge: f64) -> f64 {
        self.get(acuity, stage).map_or(0.0, |d| d.sample(rng, surge))
    }
}
