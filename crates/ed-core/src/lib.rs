//! `ed-core` — foundational types for the emergency department simulation.
//!
//! This crate is a dependency of every other `ed-*` crate.  It has no `ed-*`
//! dependencies and a small external footprint (`rand`, `chrono`, `serde`,
//! `thiserror`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `Tile`, `Role`, `Acuity`                              |
//! | [`time`]        | `Step`, `SimClock`, timestamp (de)serialisation       |
//! | [`rng`]         | `SimRng` (per-step deterministic)                     |
//! | [`config`]      | `SimConfig` run knobs with defaults                   |
//! | [`error`]       | `EdError`, `EdResult`                                 |

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{AcuityTable, SimConfig};
pub use error::{EdError, EdResult};
pub use ids::{Acuity, Role, Tile, name_ordinal};
pub use rng::SimRng;
pub use time::{SimClock, Step, minutes, minutes_between, timestamp};
