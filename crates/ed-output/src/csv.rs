//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `tick_summary.csv`
//! - `zone_occupancy.csv`
//!
//! Existing files are appended to, so a resumed run continues the same
//! tables.  The header row is written only into an empty file.

use std::fs::{File, OpenOptions};
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::writer::OutputWriter;
use crate::{OutputResult, TickSummaryRow, ZoneOccupancyRow};

pub const TICK_SUMMARY_FILE:   &str = "tick_summary.csv";
pub const ZONE_OCCUPANCY_FILE: &str = "zone_occupancy.csv";

/// Writes per-step output to two CSV files.
pub struct CsvWriter {
    summaries: Writer<File>,
    zones:     Writer<File>,
    finished:  bool,
}

fn open_append(path: &Path) -> OutputResult<Writer<File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let empty = file.metadata()?.len() == 0;
    Ok(WriterBuilder::new().has_headers(empty).from_writer(file))
}

impl CsvWriter {
    /// Open (or create) the two CSV files in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            summaries: open_append(&dir.join(TICK_SUMMARY_FILE))?,
            zones:     open_append(&dir.join(ZONE_OCCUPANCY_FILE))?,
            finished:  false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.finished = false;
        self.summaries.serialize(row)?;
        Ok(())
    }

    fn write_zone_occupancy(&mut self, rows: &[ZoneOccupancyRow]) -> OutputResult<()> {
        self.finished = false;
        for row in rows {
            self.zones.serialize(row)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.summaries.flush()?;
        self.zones.flush()?;
        Ok(())
    }
}
