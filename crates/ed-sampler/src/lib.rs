//! `ed-sampler` — staged wait targets and patient-mix inputs.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                |
//! |------------------|---------------------------------------------------------|
//! | [`distribution`] | `Stage`, `WaitDistribution`, `WaitConfig`               |
//! | [`targets`]      | `StagedWaitTargets`                                     |
//! | [`catalog`]      | `DiagnosisCatalog`, `ArrivalCurve` (CSV)                |
//! | [`error`]        | `SamplerError`, `SamplerResult<T>`                      |
//!
//! Default documents for all three inputs are compiled in from `data/`.

pub mod catalog;
pub mod distribution;
pub mod error;
pub mod targets;

#[cfg(test)]
mod tests;

pub use catalog::{ArrivalCurve, Diagnosis, DiagnosisCatalog};
pub use distribution::{Stage, WaitConfig, WaitDistribution};
pub use error::{SamplerError, SamplerResult};
pub use targets::StagedWaitTargets;
