//! `SimOutputObserver<W>`: bridges `SimObserver` to an `OutputWriter` and
//! runs the analysis export whenever the run is saved.

use ed_actors::{DataCollection, Roster};
use ed_core::{Role, Step, timestamp};
use ed_persist::SimStorage;
use ed_sim::{SimObserver, TickReport};
use ed_spatial::Ledger;

use crate::export::{ExportReport, export_analysis};
use crate::row::{TickSummaryRow, ZoneOccupancyRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes step summaries and zone occupancy to any
/// [`OutputWriter`] backend, and the analysis files on every save.
///
/// Errors are stored internally because `SimObserver` methods have no return
/// value.  After the run, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:      W,
    export:      bool,
    last_export: Option<ExportReport>,
    last_error:  Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, export: true, last_export: None, last_error: None }
    }

    /// Skip the analysis export on save.
    pub fn without_export(mut self) -> Self {
        self.export = false;
        self
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Counts from the most recent analysis export.
    pub fn last_export(&self) -> Option<ExportReport> {
        self.last_export
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err<T>(&mut self, result: OutputResult<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                // Keep only the first error.
                if self.last_error.is_none() {
                    self.last_error = Some(e);
                }
                None
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_tick_end(&mut self, report: &TickReport, ledger: &Ledger, roster: &Roster) {
        let patients = roster.count(Role::Patient);
        let row = TickSummaryRow {
            step:               report.step.0,
            sim_time:           report.now.as_ref().map(timestamp::format).unwrap_or_default(),
            patients,
            staff:              roster.len() - patients,
            arrivals:           report.arrivals.len(),
            departures:         report.departures.len(),
            moved:              report.moved,
            encounters:         report.encounters,
            rescued:            report.rescued,
            timed_out:          report.timed_out,
            boosted:            report.boosted,
            preload_departures: report.preload_departures,
            triage_queue:       ledger.queues.triage_queue.len(),
            doctor_global:      ledger.queues.doctor_global.len(),
        };
        let result = self.writer.write_tick_summary(&row);
        self.store_err(result);

        let zones: Vec<ZoneOccupancyRow> = ledger
            .zones
            .iter()
            .map(|(name, z)| ZoneOccupancyRow {
                step:     report.step.0,
                zone:     name.clone(),
                current:  z.occupancy(),
                capacity: z.capacity,
            })
            .collect();
        if !zones.is_empty() {
            let result = self.writer.write_zone_occupancy(&zones);
            self.store_err(result);
        }
    }

    fn on_save(&mut self, storage: &SimStorage, metrics: &DataCollection) {
        let result = self.writer.finish();
        self.store_err(result);
        if self.export {
            let result = export_analysis(&storage.analysis_dir(), metrics);
            if let Some(report) = self.store_err(result) {
                self.last_export = Some(report);
            }
        }
    }

    fn on_sim_end(&mut self, _final_step: Step) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
