//! `ed-output` — simulation output for the emergency department simulation.
//!
//! | Module       | Files created                                              |
//! |--------------|------------------------------------------------------------|
//! | [`csv`]      | `tick_summary.csv`, `zone_occupancy.csv` (every step)      |
//! | [`export`]   | `state_times.csv`, `area_times.csv`, `ed_metrics.csv`,     |
//! |              | `completed_patient_stage_times.csv` (every save)           |
//! | [`summary`]  | `summary_by_ctas.json` (every save)                        |
//!
//! Per-step backends implement [`OutputWriter`] and are driven by
//! [`SimOutputObserver`], which implements `ed_sim::SimObserver` and runs
//! the analysis export from its `on_save` hook.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ed_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(&sim.storage.analysis_dir())?;
//! let mut obs = SimOutputObserver::new(writer);
//! sim.run_steps(480, &mut obs)?;
//! sim.save(&mut obs)?;
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod export;
pub mod observer;
pub mod row;
pub mod summary;
pub mod writer;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use export::{ExportReport, export_analysis};
pub use observer::SimOutputObserver;
pub use row::{CompletedStageRow, EdMetricsRow, TickSummaryRow, ZoneOccupancyRow};
pub use summary::{CtasSummary, TimeBreakdown, summarize_by_ctas};
pub use writer::OutputWriter;
