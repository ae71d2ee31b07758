//! `ed-actors` — the four actor roles and how they act each tick.
//!
//! # Crate layout
//!
//! | Module            | Contents                                                     |
//! |-------------------|--------------------------------------------------------------|
//! | [`plan`]          | `Plan` (go to address / tile, wait, approach), `Movement`    |
//! | [`state`]         | `PatientState`, bedside nurse `Occupied` marker              |
//! | [`scratch`]       | Persisted per-actor scratch records                          |
//! | [`actor`]         | `Actor` and its per-tick `advance`                           |
//! | [`roster`]        | `Roster` — the active actor registry                         |
//! | [`context`]       | `TickContext<'a>` — everything an actor may touch in a tick  |
//! | [`movement`]      | Plan → next tile resolution                                  |
//! | [`patient`]       | Patient flow, walkout, linger, assessment transitions        |
//! | [`triage_nurse`]  | Triage room intake and hand-off                              |
//! | [`bedside_nurse`] | Pager and waiting-queue escorts                              |
//! | [`doctor`]        | Claiming, waitlist aging, assessment and disposition         |
//! | [`encounter`]     | Flavor conversations between nearby actors                   |
//! | [`metrics`]       | `DataCollection` per-role buckets                            |
//! | [`text`]          | `TextGenerator` capability, `NoopTextGenerator`              |
//! | [`error`]         | `ActorError`, `ActorResult<T>`                               |
//!
//! # Tick model
//!
//! The orchestrator takes one actor out of the [`Roster`], calls
//! [`Actor::advance`] with a [`TickContext`] holding the ledger and the rest of
//! the roster, then puts the actor back.  An actor therefore never aliases
//! itself, and every cross-actor edit (a doctor moving a patient on, a nurse
//! escorting one) goes through `ctx.roster`.
//!
//! Every transition checks the current state before acting, so running the
//! same call twice without an intervening tick changes nothing.

pub mod actor;
pub mod bedside_nurse;
pub mod context;
pub mod doctor;
pub mod encounter;
pub mod error;
pub mod metrics;
pub mod movement;
pub mod patient;
pub mod plan;
pub mod roster;
pub mod scratch;
pub mod state;
pub mod text;
pub mod triage_nurse;

#[cfg(test)]
mod tests;

pub use actor::Actor;
pub use context::TickContext;
pub use encounter::{react_to_chat, run_encounters, start_encounter, wants_to_chat};
pub use error::{ActorError, ActorResult};
pub use metrics::{
    ActionLogEntry, AdmissionRecord, BedsideNurseRecord, DataCollection, DoctorRecord, InteractionEntry,
    LingerRecord, PatientRecord, TriageNurseRecord, WalkoutRecord,
};
pub use plan::{Movement, Plan, places};
pub use roster::Roster;
pub use scratch::{
    BedsideNurseScratch, ChatLine, CommonScratch, DoctorScratch, PatientScratch, RoleScratch, Scratch,
    TriageNurseScratch,
};
pub use state::{Occupied, PatientState};
pub use text::{NoopTextGenerator, TextGenerator};
