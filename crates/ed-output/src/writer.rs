//! The `OutputWriter` trait implemented by per-step backends.

use crate::{OutputResult, TickSummaryRow, ZoneOccupancyRow};

/// Trait implemented by per-step output backends.
///
/// All methods are infallible from the observer's perspective: errors are
/// stored internally and retrieved with
/// [`SimOutputObserver::take_error`][crate::SimOutputObserver::take_error].
pub trait OutputWriter {
    /// Write one step summary row.
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Write the occupancy of every zone for one step.
    fn write_zone_occupancy(&mut self, rows: &[ZoneOccupancyRow]) -> OutputResult<()>;

    /// Flush all underlying file handles.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
