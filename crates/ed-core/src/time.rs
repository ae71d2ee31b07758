//! Simulation time model.
//!
//! # Design
//!
//! Time advances in fixed steps.  `Step` counts them; `SimClock` maps the
//! counter to a calendar timestamp:
//!
//!   now = start + step * sec_per_step
//!
//! Calendar time is a `chrono::NaiveDateTime` because every timer in the
//! department (rest, test, boarding, staged targets) is compared against it
//! directly.  Timestamps are persisted in the long form
//! `"February 13, 2023, 06:00:00"`.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ── Step ─────────────────────────────────────────────────────────────────────

/// An absolute simulation step counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Step(pub u64);

impl Step {
    pub const ZERO: Step = Step(0);

    /// Return the step `n` after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Step {
        Step(self.0 + n)
    }

    /// The step before `self`, saturating at zero.
    #[inline]
    pub fn prev(self) -> Step {
        Step(self.0.saturating_sub(1))
    }
}

impl std::ops::Add<u64> for Step {
    type Output = Step;
    #[inline]
    fn add(self, rhs: u64) -> Step {
        Step(self.0 + rhs)
    }
}

impl std::ops::Sub for Step {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Step) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

// ── Duration helpers ──────────────────────────────────────────────────────────

/// A fractional number of minutes as a `chrono::Duration` (millisecond
/// resolution).
#[inline]
pub fn minutes(m: f64) -> Duration {
    Duration::milliseconds((m * 60_000.0).round() as i64)
}

/// Minutes from `earlier` to `later`; negative when reversed.
#[inline]
pub fn minutes_between(earlier: NaiveDateTime, later: NaiveDateTime) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 60_000.0
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Simulated calendar time plus the step counter that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    /// Calendar time of step 0.
    #[serde(with = "timestamp")]
    pub start: NaiveDateTime,
    /// Calendar time of `step`.
    #[serde(with = "timestamp")]
    pub now: NaiveDateTime,
    /// Simulated seconds per step.
    pub sec_per_step: u32,
    pub step: Step,
}

impl SimClock {
    pub fn new(start: NaiveDateTime, sec_per_step: u32) -> Self {
        Self { start, now: start, sec_per_step, step: Step::ZERO }
    }

    /// Resume a clock at a persisted position.
    pub fn resume(start: NaiveDateTime, now: NaiveDateTime, sec_per_step: u32, step: Step) -> Self {
        Self { start, now, sec_per_step, step }
    }

    #[inline]
    pub fn step_duration(&self) -> Duration {
        Duration::seconds(i64::from(self.sec_per_step))
    }

    /// Minutes of simulated time per step.
    #[inline]
    pub fn minutes_per_step(&self) -> f64 {
        f64::from(self.sec_per_step) / 60.0
    }

    /// Advance by one step.
    #[inline]
    pub fn advance(&mut self) {
        self.step = self.step + 1;
        self.now += self.step_duration();
    }

    /// Undo one `advance`.  Used when a step fails and is rolled back.
    #[inline]
    pub fn rewind(&mut self) {
        if self.step.0 > 0 {
            self.step = self.step.prev();
            self.now -= self.step_duration();
        }
    }

    /// Break elapsed time into (day, hour, minute) from `start`.
    pub fn elapsed_dhm(&self) -> (u64, u32, u32) {
        let total_secs = (self.now - self.start).num_seconds().max(0) as u64;
        let days = total_secs / 86_400;
        let hours = ((total_secs % 86_400) / 3_600) as u32;
        let minutes = ((total_secs % 3_600) / 60) as u32;
        (days, hours, minutes)
    }

    /// How many steps span `secs` seconds (rounded up).
    #[inline]
    pub fn steps_for_secs(&self, secs: u64) -> u64 {
        secs.div_ceil(u64::from(self.sec_per_step.max(1)))
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.step, self.now.format("%b %d %Y  %H:%M"))
    }
}

// ── Timestamp (de)serialisation ───────────────────────────────────────────────

/// `#[serde(with = "timestamp")]` helpers for the persisted long form.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%B %d, %Y, %H:%M:%S";

    /// Format used for the start date alone (`"February 13, 2023"`).
    pub const DATE_FORMAT: &str = "%B %d, %Y";

    pub fn format(t: &NaiveDateTime) -> String {
        t.format(FORMAT).to_string()
    }

    pub fn parse(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(s, FORMAT)
    }

    pub fn serialize<S: Serializer>(t: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    /// Same encoding for `Option<NaiveDateTime>`; `None` is `null`.
    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(t: &Option<NaiveDateTime>, s: S) -> Result<S::Ok, S::Error> {
            match t {
                Some(t) => s.serialize_some(&super::format(t)),
                None    => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDateTime>, D::Error> {
            let raw = Option::<String>::deserialize(d)?;
            raw.map(|s| super::parse(&s).map_err(serde::de::Error::custom)).transpose()
        }
    }
}
