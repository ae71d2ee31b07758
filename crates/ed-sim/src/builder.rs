//! Fluent builder for constructing a [`Sim`].

use ed_actors::{Actor, DataCollection, NoopTextGenerator, Roster, TextGenerator};
use ed_core::{SimClock, SimRng, Step};
use ed_persist::{SimMeta, SimStorage};
use ed_sampler::{ArrivalCurve, DiagnosisCatalog, WaitConfig};
use ed_spatial::{Ledger, LedgerState, MazeLayout, TileEvent};
use tracing::info;

use crate::{Sim, SimError, SimResult, population};

/// RNG stream for start-up population, apart from every per-step stream.
const POPULATION_STREAM: u64 = 0xED00;

/// State recovered from disk by [`SimBuilder::resume`].
struct Restored {
    ledger:  Option<LedgerState>,
    metrics: DataCollection,
    actors:  Vec<Actor>,
}

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`SimStorage`] — the run folder the simulation saves into
/// - [`SimMeta`] — start time, step, configuration
///
/// [`SimBuilder::resume`] reads both (and every actor) from an existing run.
///
/// # Optional inputs (have defaults)
///
/// | Method                | Default                          |
/// |-----------------------|----------------------------------|
/// | `.layout(l)`          | `MazeLayout::demo()`             |
/// | `.waits(w)`           | `WaitConfig::builtin()`          |
/// | `.catalog(c)`         | `DiagnosisCatalog::builtin()`    |
/// | `.arrival_curve(a)`   | `ArrivalCurve::builtin()`        |
/// | `.text_generator(t)`  | `NoopTextGenerator`              |
/// | `.headless(b)`        | `false` (environment each step)  |
/// | `.write_movement(b)`  | `true`                           |
/// | `.populate(b)`        | `true`                           |
///
/// # Example
///
/// ```rust,ignore
/// let storage = SimStorage::create(Path::new("storage"), "run-1")?;
/// let mut sim = SimBuilder::new(storage, SimMeta::new(start, SimConfig::default()))
///     .headless(true)
///     .build()?;
/// sim.run_steps(60, &mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    storage:        SimStorage,
    meta:           SimMeta,
    restored:       Option<Restored>,
    layout:         Option<MazeLayout>,
    waits:          Option<WaitConfig>,
    catalog:        Option<DiagnosisCatalog>,
    curve:          Option<ArrivalCurve>,
    text:           Option<Box<dyn TextGenerator>>,
    headless:       bool,
    write_movement: bool,
    populate:       bool,
}

impl SimBuilder {
    /// Builder for a fresh run.
    pub fn new(storage: SimStorage, meta: SimMeta) -> Self {
        Self {
            storage,
            meta,
            restored:       None,
            layout:         None,
            waits:          None,
            catalog:        None,
            curve:          None,
            text:           None,
            headless:       false,
            write_movement: true,
            populate:       true,
        }
    }

    /// Builder for a saved run: meta, ledger, metrics and actors come from
    /// `storage`.
    pub fn resume(storage: SimStorage) -> SimResult<Self> {
        let snapshot = storage.load_run()?;
        let mut builder = Self::new(storage, snapshot.meta);
        builder.restored = Some(Restored {
            ledger:  snapshot.ledger,
            metrics: snapshot.metrics,
            actors:  snapshot.actors,
        });
        Ok(builder)
    }

    pub fn layout(mut self, layout: MazeLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn waits(mut self, waits: WaitConfig) -> Self {
        self.waits = Some(waits);
        self
    }

    pub fn catalog(mut self, catalog: DiagnosisCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn arrival_curve(mut self, curve: ArrivalCurve) -> Self {
        self.curve = Some(curve);
        self
    }

    pub fn text_generator(mut self, text: Box<dyn TextGenerator>) -> Self {
        self.text = Some(text);
        self
    }

    /// Skip the per-step environment file.
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn write_movement(mut self, write: bool) -> Self {
        self.write_movement = write;
        self
    }

    /// Run staffing top-up and the one-time bed fill and waiting-room
    /// preload during `build`.
    pub fn populate(mut self, populate: bool) -> Self {
        self.populate = populate;
        self
    }

    /// Record `origin` as the run this one was copied from.
    pub fn forked_from(mut self, origin: impl Into<String>) -> Self {
        self.meta.fork_sim_code = Some(origin.into());
        self
    }

    /// Override the step length of the stored configuration.
    pub fn sec_per_step(mut self, sec: u32) -> Self {
        self.meta.config.sec_per_step = sec;
        self
    }

    /// Validate the configuration, rebuild the map and ledger, place every
    /// actor, and return a ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim> {
        let meta = self.meta;
        meta.config.validate()?;
        if meta.curr_time < meta.start_date {
            return Err(SimError::Config(format!("curr_time {} precedes start_date {}", meta.curr_time, meta.start_date)));
        }

        // ── Resolve optional inputs ───────────────────────────────────────
        let layout = match self.layout {
            Some(l) => l,
            None => MazeLayout::demo()?,
        };
        let waits = match self.waits {
            Some(w) => w,
            None => WaitConfig::builtin()?,
        };
        let catalog = match self.catalog {
            Some(c) => c,
            None => DiagnosisCatalog::builtin()?,
        };
        let curve = match self.curve {
            Some(c) => c,
            None => ArrivalCurve::builtin()?,
        };
        let text = self.text.unwrap_or_else(|| Box::new(NoopTextGenerator));

        // ── Ledger and roster ─────────────────────────────────────────────
        let mut ledger = Ledger::from_layout(&layout, meta.config.diagnostic_room_capacity);
        let mut roster = Roster::new();
        let mut metrics = DataCollection::default();
        if let Some(restored) = self.restored {
            if let Some(state) = restored.ledger {
                ledger.restore(state);
            }
            metrics = restored.metrics;
            for actor in restored.actors {
                if let Some(tile) = actor.tile() {
                    ledger.maze.add_event(tile, TileEvent::idle(actor.name.clone()));
                }
                roster.insert(actor);
            }
        }

        let clock = SimClock::resume(meta.start_date, meta.curr_time, meta.config.sec_per_step, Step(meta.step));
        let arrival_threshold = meta.config.add_patient_threshold;

        let mut sim = Sim {
            config: meta.config,
            clock,
            ledger,
            roster,
            metrics,
            waits,
            catalog,
            curve,
            text,
            storage: self.storage,
            headless: self.headless,
            write_movement: self.write_movement,
            fork_sim_code: meta.fork_sim_code,
            maze_name: meta.maze_name,
            arrival_threshold,
            last_global_aging: meta.last_global_queue_aging,
            last_boost: meta.last_priority_boost,
            beds_filled: meta.beds_filled,
            waiting_room_preloaded: meta.waiting_room_preloaded,
        };

        if self.populate {
            sim.populate();
        }

        info!(
            sim = %sim.storage.code(),
            step = sim.clock.step.0,
            actors = sim.roster.len(),
            "simulation ready"
        );
        Ok(sim)
    }
}

impl Sim {
    /// Top staffing up to the configured counts, then run the bed fill and
    /// the waiting-room preload unless an earlier start already did.
    pub(crate) fn populate(&mut self) {
        let mut rng = SimRng::for_step(self.config.seed, self.clock.step.0).child(POPULATION_STREAM);
        let mut ctx = ed_actors::TickContext {
            ledger:  &mut self.ledger,
            roster:  &mut self.roster,
            metrics: &mut self.metrics,
            rng:     &mut rng,
            config:  &self.config,
            waits:   &self.waits,
            now:     self.clock.now,
        };

        let staffed = population::top_up_staff(&mut ctx);
        let mut filled = 0;
        if !self.beds_filled {
            filled = population::fill_beds(&mut ctx, &self.catalog);
            self.beds_filled = true;
        }
        let mut preloaded = 0;
        if !self.waiting_room_preloaded {
            let n = ctx.config.preload_waiting_room_patients;
            preloaded = population::preload_waiting_room(&mut ctx, &self.catalog, n).len();
            self.waiting_room_preloaded = true;
        }
        info!(staffed, filled, preloaded, "start-up population");
    }
}
