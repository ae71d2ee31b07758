//! `ed-persist` — the run folder on disk.
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`atomic`]   | `write_json_atomic` (temp file + rename), JSON readers    |
//! | [`meta`]     | `SimMeta`, environment, movement, command log documents   |
//! | [`storage`]  | `SimStorage` paths, fork/discard, environment recovery    |
//! | [`snapshot`] | `RunSnapshot`, whole-run save and load                    |
//! | [`error`]    | `PersistError`, `PersistResult<T>`                        |
//!
//! Every file is written through [`write_json_atomic`], so a crash can
//! leave a stale document but never a truncated one.

pub mod atomic;
pub mod error;
pub mod meta;
pub mod snapshot;
pub mod storage;

#[cfg(test)]
mod tests;

pub use atomic::{read_json, read_json_opt, write_bytes_atomic, write_json_atomic};
pub use error::{PersistError, PersistResult};
pub use meta::{CommandLogEntry, Environment, EnvironmentEntry, MovementEntry, MovementFile, MovementMeta, SimMeta};
pub use snapshot::RunSnapshot;
pub use storage::{EnvironmentLoad, SimStorage};
