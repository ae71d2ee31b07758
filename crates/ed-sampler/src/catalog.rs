//! CSV-backed patient mix and arrival curve.
//!
//! # `diagnosis.csv`
//!
//! ```csv
//! Symptoms,ICD-10-CA,CTAS,Zone,normalized_fraction
//! chest pain,R07.4,2,major injuries zone,0.08
//! ```
//!
//! # `ed_visits_per_hour.csv`
//!
//! ```csv
//! hour,num_of_patients
//! 0,2.1
//! ```

use std::io::Read;
use std::path::Path;

use ed_core::{Acuity, SimRng};
use serde::Deserialize;

use crate::{SamplerError, SamplerResult};

const DEFAULT_DIAGNOSES: &str = include_str!("../data/diagnosis.csv");
const DEFAULT_ARRIVALS: &str = include_str!("../data/ed_visits_per_hour.csv");

// ── Diagnosis catalog ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Diagnosis {
    #[serde(rename = "Symptoms")]
    pub symptoms: String,
    #[serde(rename = "ICD-10-CA")]
    pub icd_code: String,
    #[serde(rename = "CTAS")]
    pub acuity: u8,
    #[serde(rename = "Zone")]
    pub zone: String,
    pub normalized_fraction: f64,
}

impl Diagnosis {
    pub fn acuity(&self) -> Acuity {
        Acuity(self.acuity)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiagnosisCatalog {
    pub entries: Vec<Diagnosis>,
}

impl DiagnosisCatalog {
    pub fn builtin() -> SamplerResult<Self> {
        Self::from_reader(DEFAULT_DIAGNOSES.as_bytes())
    }

    pub fn load(path: &Path) -> SamplerResult<Self> {
        Self::from_reader(std::fs::File::open(path)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> SamplerResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut entries = Vec::new();
        for result in csv_reader.deserialize::<Diagnosis>() {
            let row = result.map_err(|e| SamplerError::Parse(e.to_string()))?;
            if !(1..=5).contains(&row.acuity) {
                return Err(SamplerError::Parse(format!(
                    "diagnosis {:?}: CTAS {} outside 1..=5",
                    row.symptoms, row.acuity
                )));
            }
            entries.push(row);
        }
        if entries.is_empty() {
            return Err(SamplerError::Parse("diagnosis catalog is empty".into()));
        }
        Ok(DiagnosisCatalog { entries })
    }

    /// Draw a diagnosis weighted by `normalized_fraction`.  Falls back to a
    /// uniform pick when every weight is zero.
    pub fn sample(&self, rng: &mut SimRng) -> Option<&Diagnosis> {
        let weights: Vec<f64> = self.entries.iter().map(|d| d.normalized_fraction).collect();
        match rng.weighted_index(&weights) {
            Ok(i) => self.entries.get(i),
            Err(_) => rng.choose(&self.entries),
        }
    }

    /// Entries whose zone is `zone`.
    pub fn for_zone<'a>(&'a self, zone: &'a str) -> impl Iterator<Item = &'a Diagnosis> + 'a {
        self.entries.iter().filter(move |d| d.zone == zone)
    }
}

// ── Arrival curve ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ArrivalRecord {
    hour:            u32,
    num_of_patients: f64,
}

/// Expected arrivals per hour of day.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrivalCurve {
    per_hour: [f64; 24],
}

impl ArrivalCurve {
    pub fn builtin() -> SamplerResult<Self> {
        Self::from_reader(DEFAULT_ARRIVALS.as_bytes())
    }

    pub fn load(path: &Path) -> SamplerResult<Self> {
        Self::from_reader(std::fs::File::open(path)?)
    }

    /// Hours missing from the CSV expect no arrivals.
    pub fn from_reader<R: Read>(reader: R) -> SamplerResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut per_hour = [0.0; 24];
        for result in csv_reader.deserialize::<ArrivalRecord>() {
            let row = result.map_err(|e| SamplerError::Parse(e.to_string()))?;
            let slot = per_hour
                .get_mut(row.hour as usize)
                .ok_or_else(|| SamplerError::Parse(format!("hour {} outside 0..24", row.hour)))?;
            *slot = row.num_of_patients.max(0.0);
        }
        Ok(ArrivalCurve { per_hour })
    }

    pub fn flat(per_hour: f64) -> Self {
        ArrivalCurve { per_hour: [per_hour; 24] }
    }

    pub fn visits(&self, hour: u32) -> f64 {
        self.per_hour[(hour % 24) as usize]
    }

    /// Expected arrivals during one step of `sec_per_step` seconds in `hour`,
    /// scaled by `rate_modifier`.
    pub fn per_step(&self, hour: u32, sec_per_step: u32, rate_modifier: f64) -> f64 {
        let steps_per_hour = 3600.0 / f64::from(sec_per_step.max(1));
        self.visits(hour) / steps_per_hour * rate_modifier
    }
}
