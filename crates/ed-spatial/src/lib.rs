//! `ed-spatial` — the department map and the shared resource ledger.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                      |
//! |------------|---------------------------------------------------------------|
//! | [`maze`]   | `Maze`, `TileInfo`, `TileEvent`, address index                |
//! | [`layout`] | `MazeLayout` JSON documents, bundled demo department          |
//! | [`path`]   | `find_path` grid Dijkstra                                     |
//! | [`queue`]  | `PriorityQueue` (stable, unique names, batch re-prioritise)   |
//! | [`zone`]   | `Zone`, `BedInventory`                                        |
//! | [`ledger`] | `Ledger`, `Queues`, `LedgerState` snapshot/restore            |
//! | [`error`]  | `SpatialError`, `SpatialResult<T>`                            |

pub mod error;
pub mod layout;
pub mod ledger;
pub mod maze;
pub mod path;
pub mod queue;
pub mod zone;


pub use error::{SpatialError, SpatialResult};
pub use layout::{LegendEntry, MazeLayout, ZoneSpec};
pub use ledger::{BedState, DIAGNOSTIC_ROOM, Ledger, LedgerState, QueueName, Queues, ZoneState};
pub use maze::{AddressLevel, Maze, TileEvent, TileInfo};
pub use path::{find_path, path_len};
pub use queue::{PriorityQueue, QueueEntry};
pub use zone::{BedInventory, Zone};
