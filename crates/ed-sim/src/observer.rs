//! Simulation observer trait for progress reporting and data collection.

use chrono::NaiveDateTime;
use ed_actors::{DataCollection, Roster};
use ed_core::Step;
use ed_persist::SimStorage;
use ed_spatial::Ledger;

/// What happened during one step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub step:        Step,
    /// Simulated time the step ran at.
    pub now:         Option<NaiveDateTime>,
    /// Actors whose tile changed.
    pub moved:       usize,
    pub arrivals:    Vec<String>,
    pub departures:  Vec<String>,
    pub encounters:  usize,
    pub rescued:     usize,
    pub timed_out:   usize,
    pub boosted:     usize,
    pub preload_departures: usize,
}

/// Callbacks invoked by [`Sim`][crate::Sim] at key points.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter { interval: u64 }
///
/// impl SimObserver for ProgressPrinter {
///     fn on_tick_end(&mut self, report: &TickReport, _: &Ledger, roster: &Roster) {
///         if report.step.0 % self.interval == 0 {
///             println!("{}: {} actors", report.step, roster.len());
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each step, before any processing.
    fn on_tick_start(&mut self, _step: Step, _now: NaiveDateTime) {}

    /// Called once a step has committed: every step file and any status
    /// report are written and the clock has advanced.  A failed step never
    /// reaches this hook.
    fn on_tick_end(&mut self, _report: &TickReport, _ledger: &Ledger, _roster: &Roster) {}

    /// Called after the run has been written to `storage`.
    fn on_save(&mut self, _storage: &SimStorage, _metrics: &DataCollection) {}

    /// Called once when the run is finished or discarded.
    fn on_sim_end(&mut self, _final_step: Step) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
