//! Whole-run save and load.

use ed_actors::{Actor, DataCollection, Scratch};
use ed_spatial::LedgerState;
use tracing::{info, warn};

use crate::meta::SimMeta;
use crate::storage::SimStorage;
use crate::PersistResult;

/// Everything needed to resume a run.
#[derive(Clone, Debug)]
pub struct RunSnapshot {
    pub meta:    SimMeta,
    /// `None` for a run that was created but never saved.
    pub ledger:  Option<LedgerState>,
    pub metrics: DataCollection,
    pub actors:  Vec<Actor>,
}

impl SimStorage {
    /// Write scratch, ledger and metrics, then meta.  Meta goes last so a
    /// crash mid-save leaves the previous meta pointing at a complete set.
    pub fn save_run<'a>(
        &self,
        meta: &SimMeta,
        ledger: &LedgerState,
        metrics: &DataCollection,
        actors: impl IntoIterator<Item = &'a Actor>,
    ) -> PersistResult<()> {
        let mut n = 0usize;
        for actor in actors {
            self.save_scratch(actor)?;
            n += 1;
        }
        self.save_ledger(ledger)?;
        self.save_metrics(metrics)?;
        self.save_meta(meta)?;
        info!(sim = %self.code(), step = meta.step, actors = n, "saved simulation");
        Ok(())
    }

    /// Read a run back.  Positions come from the environment file for the
    /// saved step (or the nearest valid earlier one); actors without an
    /// entry keep the tile from their scratch.
    pub fn load_run(&self) -> PersistResult<RunSnapshot> {
        let meta = self.load_meta()?;
        let ledger = self.load_ledger()?;
        let metrics = self.load_metrics()?;

        let mut actors = Vec::with_capacity(meta.persona_names.len());
        for (name, role) in &meta.persona_names {
            let actor = if self.scratch_path(name).exists() {
                self.load_actor(name)?
            } else {
                warn!(actor = %name, "scratch missing; starting from an empty record");
                Actor { name: name.clone(), scratch: Scratch::new(*role) }
            };
            actors.push(actor);
        }

        let env = self.load_environment(meta.step);
        for actor in &mut actors {
            if let Some(entry) = env.positions.get(&actor.name) {
                actor.scratch.common.curr_tile = Some(entry.tile());
            }
        }

        info!(sim = %self.code(), step = meta.step, actors = actors.len(), "loaded simulation");
        Ok(RunSnapshot { meta, ledger, metrics, actors })
    }
}
