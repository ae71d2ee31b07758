//! Per-acuity aggregate of patient time (`summary_by_ctas.json`).

use std::collections::BTreeMap;

use ed_actors::PatientRecord;
use serde::Serialize;

/// Acuity buckets reported, `0` holding patients with no recorded acuity.
pub const ACUITY_BUCKETS: std::ops::RangeInclusive<u8> = 0..=5;

/// One statistic over the area and state time maps.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TimeBreakdown {
    pub time_spent_area:  BTreeMap<String, f64>,
    pub time_spent_state: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CtasSummary {
    pub num_of_patients:     usize,
    /// Whole percent of all reported patients.
    pub percentage_of_total: usize,
    /// Patients per injuries zone.
    pub zones:               BTreeMap<String, usize>,
    pub total:               TimeBreakdown,
    pub mean:                TimeBreakdown,
    pub median:              TimeBreakdown,
    /// Population standard deviation.
    pub standard_deviation:  TimeBreakdown,
}

/// Samples of one bucket, keyed like the record maps.
#[derive(Default)]
struct Samples {
    area:  BTreeMap<String, Vec<f64>>,
    state: BTreeMap<String, Vec<f64>>,
}

impl Samples {
    fn add(&mut self, record: &PatientRecord) {
        for (k, v) in &record.time_spent_area {
            self.area.entry(k.clone()).or_default().push(*v);
        }
        for (k, v) in &record.time_spent_state {
            self.state.entry(k.clone()).or_default().push(*v);
        }
    }

    fn reduce(&self, f: fn(&[f64]) -> f64) -> TimeBreakdown {
        TimeBreakdown {
            time_spent_area:  self.area.iter().map(|(k, xs)| (k.clone(), f(xs))).collect(),
            time_spent_state: self.state.iter().map(|(k, xs)| (k.clone(), f(xs))).collect(),
        }
    }
}

pub fn total(xs: &[f64]) -> f64 {
    xs.iter().sum()
}

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() { 0.0 } else { total(xs) / xs.len() as f64 }
}

pub fn median(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 { (sorted[mid - 1] + sorted[mid]) / 2.0 } else { sorted[mid] }
}

pub fn population_std(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    (xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64).sqrt()
}

/// Group `records` by acuity and reduce each group.  Every bucket in
/// [`ACUITY_BUCKETS`] is present, empty ones with zero counts.
pub fn summarize_by_ctas<'a>(
    records: impl IntoIterator<Item = &'a PatientRecord>,
) -> BTreeMap<String, CtasSummary> {
    let mut buckets: BTreeMap<u8, (CtasSummary, Samples)> =
        ACUITY_BUCKETS.map(|a| (a, Default::default())).collect();
    let mut reported = 0;

    for record in records {
        let acuity = record.ctas_score.map_or(0, |a| a.0);
        let Some((summary, samples)) = buckets.get_mut(&acuity) else { continue };
        reported += 1;
        summary.num_of_patients += 1;
        let zone = record.injuries_zone.clone().unwrap_or_else(|| "unknown".into());
        *summary.zones.entry(zone).or_insert(0) += 1;
        samples.add(record);
    }

    buckets
        .into_iter()
        .map(|(acuity, (mut summary, samples))| {
            if summary.num_of_patients > 0 {
                summary.percentage_of_total = summary.num_of_patients * 100 / reported;
                summary.total = samples.reduce(total);
                summary.mean = samples.reduce(mean);
                summary.median = samples.reduce(median);
                summary.standard_deviation = samples.reduce(population_std);
            }
            (acuity.to_string(), summary)
        })
        .collect()
}
