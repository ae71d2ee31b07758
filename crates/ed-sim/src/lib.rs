//! `ed-sim` — step loop orchestrator for the emergency department simulation.
//!
//! # Step loop
//!
//! ```text
//! for each step:
//!   ① Departures  — actors on the exit heading for the exit are finalized
//!                   and removed from the roster and the ledger.
//!   ② Advance     — every actor in name order: take from the roster,
//!                   Actor::advance, apply the movement, record patient
//!                   travel, put back.
//!   ③ Encounters  — nearby pairs may start a conversation.
//!   ④ Maintenance — assessment queue, orphan rescue, global queue aging,
//!                   overdue boosts, triage timeouts, filler departures.
//!   ⑤ Arrivals    — the arrival accumulator may admit one walk-in.
//!   ⑥ Artifacts   — movement/<step>.json, environment/<step+1>.json,
//!                   status report every `status_interval_steps`.
//! ```
//!
//! Each step draws from `SimRng::for_step(seed, step)`, so a run replays
//! identically from a saved step.
//!
//! # Crate layout
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`builder`]     | `SimBuilder` (fresh or resumed runs)                  |
//! | [`sim`]         | `Sim` and its step loop, save                         |
//! | [`maintenance`] | Per-step ledger upkeep passes                         |
//! | [`population`]  | Arrivals, staffing, bed fill, waiting-room preload    |
//! | [`status`]      | `SimStatus` report                                    |
//! | [`command`]     | `Command` parsing and execution                       |
//! | [`observer`]    | `SimObserver`, `TickReport`                           |
//! | [`error`]       | `SimError`, `SimResult<T>`                            |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ed_core::SimConfig;
//! use ed_persist::{SimMeta, SimStorage};
//! use ed_sim::{NoopObserver, SimBuilder};
//!
//! let storage = SimStorage::create(Path::new("storage"), "monday")?;
//! let mut sim = SimBuilder::new(storage, SimMeta::new(start, SimConfig::default())).build()?;
//! sim.run_steps(480, &mut NoopObserver)?;
//! sim.save(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod command;
pub mod error;
pub mod maintenance;
pub mod observer;
pub mod population;
pub mod sim;
pub mod status;


pub use builder::SimBuilder;
pub use command::{Command, CommandOutcome};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver, TickReport};
pub use sim::Sim;
pub use status::{SimStatus, ZoneOccupancy};
