//! The `Sim` struct and its step loop.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use ed_actors::{
    DataCollection, Movement, Roster, TextGenerator, TickContext, patient::record_travel, run_encounters,
};
use ed_core::{SimClock, SimConfig, SimRng};
use ed_persist::{Environment, EnvironmentEntry, MovementEntry, MovementFile, MovementMeta, SimMeta, SimStorage};
use ed_sampler::{ArrivalCurve, DiagnosisCatalog, WaitConfig};
use ed_spatial::{Ledger, TileEvent};
use tracing::{debug, error, info};

use crate::status::SimStatus;
use crate::{SimObserver, SimResult, TickReport, maintenance, population};

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The emergency department simulation.
///
/// `Sim` owns the ledger, every active actor, and the metrics, and drives
/// the step loop:
///
/// 1. **Departures**: actors standing on the exit with the exit as their
///    destination are finalized and removed.
/// 2. **Advance**: each actor, in name order, is taken out of the roster,
///    plans and walks, and is put back.  Patient travel is recorded against
///    the state and area it started in.
/// 3. **Encounters**: nearby pairs may start a conversation.
/// 4. **Maintenance**: assessment queue, orphan rescue, queue aging,
///    overdue boosts, triage timeouts, filler departures.
/// 5. **Arrivals**: the arrival accumulator may admit one walk-in.
/// 6. **Artifacts**: movement file for this step, environment for the next.
///
/// A step that fails is rolled back: the clock is restored and any file the
/// step wrote is removed.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    pub config:  SimConfig,
    pub clock:   SimClock,
    pub ledger:  Ledger,
    pub roster:  Roster,
    pub metrics: DataCollection,
    pub waits:   WaitConfig,
    pub catalog: DiagnosisCatalog,
    pub curve:   ArrivalCurve,
    pub text:    Box<dyn TextGenerator>,
    pub storage: SimStorage,

    /// Skip the per-step environment file.
    pub headless:       bool,
    pub write_movement: bool,

    pub(crate) fork_sim_code: Option<String>,
    pub(crate) maze_name:     String,
    /// Fractional arrivals carried between steps.
    pub(crate) arrival_threshold: f64,
    pub(crate) last_global_aging: Option<NaiveDateTime>,
    pub(crate) last_boost:        Option<NaiveDateTime>,
    pub(crate) beds_filled:            bool,
    pub(crate) waiting_room_preloaded: bool,
}

impl Sim {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run `n` steps, stopping at the first that fails.
    pub fn run_steps<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    /// Run one step.  On failure the step is rolled back and the error
    /// returned.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<TickReport> {
        let step = self.clock.step;
        match self.process_step(observer) {
            Ok(report) => Ok(report),
            Err(e) => {
                error!(step = step.0, error = %e, "step failed; rolling back");
                if self.clock.step != step {
                    self.clock.rewind();
                }
                self.storage.remove_step_artifacts(step.0);
                Err(e)
            }
        }
    }

    /// Write meta, ledger, metrics, every scratch, and the current
    /// environment.
    pub fn save<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        for actor in self.roster.iter() {
            if let Some(p) = actor.patient() {
                self.metrics.patient_mut(&actor.name).save_final(p);
            }
        }
        self.storage.write_environment(self.clock.step.0, &self.environment())?;
        self.storage.save_run(&self.meta(), &self.ledger.snapshot(), &self.metrics, self.roster.iter())?;
        observer.on_save(&self.storage, &self.metrics);
        Ok(())
    }

    /// The meta document describing the run as it stands.
    pub fn meta(&self) -> SimMeta {
        let mut config = self.config.clone();
        config.add_patient_threshold = self.arrival_threshold;
        SimMeta {
            fork_sim_code:           self.fork_sim_code.clone(),
            start_date:              self.clock.start,
            curr_time:               self.clock.now,
            maze_name:               self.maze_name.clone(),
            step:                    self.clock.step.0,
            persona_names:           self.roster.iter().map(|a| (a.name.clone(), a.role())).collect(),
            last_global_queue_aging: self.last_global_aging,
            last_priority_boost:     self.last_boost,
            beds_filled:             self.beds_filled,
            waiting_room_preloaded:  self.waiting_room_preloaded,
            config,
        }
    }

    /// Every placed actor's tile.
    pub fn environment(&self) -> Environment {
        self.roster
            .iter()
            .filter_map(|a| a.tile().map(|t| (a.name.clone(), EnvironmentEntry::new(self.maze_name.clone(), t))))
            .collect()
    }

    pub fn status(&self) -> SimStatus {
        SimStatus::collect(self)
    }

    /// Write the status report to the run folder.
    pub fn write_status(&self) -> SimResult<()> {
        let status = self.status();
        self.storage.write_status(&status.to_text(), &serde_json::to_value(&status)?)?;
        Ok(())
    }

    // ── Core step processing ──────────────────────────────────────────────

    fn process_step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<TickReport> {
        let step = self.clock.step;
        let now = self.clock.now;
        observer.on_tick_start(step, now);
        let mut report = TickReport { step, now: Some(now), ..Default::default() };

        // ── Phase 1: departures ───────────────────────────────────────────
        report.departures = self.finalize_departures();

        let mut rng = SimRng::for_step(self.config.seed, step.0);
        let mut movements: BTreeMap<String, MovementEntry> = BTreeMap::new();
        {
            // Explicit field borrows so the borrow checker sees disjoint access.
            let mut ctx = TickContext {
                ledger:  &mut self.ledger,
                roster:  &mut self.roster,
                metrics: &mut self.metrics,
                rng:     &mut rng,
                config:  &self.config,
                waits:   &self.waits,
                now,
            };

            // ── Phase 2: advance every actor ──────────────────────────────
            for name in ctx.roster.names() {
                let Some(mut actor) = ctx.roster.take(&name) else { continue };
                let before = actor.tile();
                let state = actor.patient().map(|p| p.state);
                let area = before.and_then(|t| ctx.ledger.maze.arena_of(t)).map(str::to_string);

                if let Some(Movement { tile, pronunciatio, description }) = actor.advance(&mut ctx) {
                    if let Some(from) = before {
                        ctx.ledger.maze.remove_subject_events(from, &name);
                        if from != tile {
                            report.moved += 1;
                        }
                        if let Some(state) = state {
                            record_travel(ctx.metrics, &name, state, area.as_deref(), from, tile, ctx.config);
                        }
                    }
                    ctx.ledger.maze.add_event(tile, TileEvent {
                        subject:     name.clone(),
                        predicate:   Some("is".into()),
                        object:      Some(description.clone()),
                        description: Some(description.clone()),
                    });
                    actor.scratch.common.curr_tile = Some(tile);
                    movements.insert(name.clone(), MovementEntry {
                        movement: tile,
                        pronunciatio,
                        description,
                        chat: None,
                    });
                }
                ctx.roster.insert(actor);
            }

            // ── Phase 3: encounters ───────────────────────────────────────
            report.encounters = run_encounters(&mut ctx, &*self.text);
            for (name, entry) in movements.iter_mut() {
                entry.chat = ctx.roster.get(name).and_then(|a| a.scratch.common.chat.clone());
            }

            // ── Phase 4: maintenance ──────────────────────────────────────
            maintenance::enqueue_ready_assessments(&mut ctx);
            report.rescued = maintenance::rescue_orphans(&mut ctx);
            maintenance::age_global_queue(&mut ctx, &mut self.last_global_aging);
            report.boosted = maintenance::boost_overdue(&mut ctx, &mut self.last_boost);
            report.timed_out = maintenance::triage_timeouts(&mut ctx);
            report.preload_departures = maintenance::preload_departures(&mut ctx);

            // ── Phase 5: arrivals ─────────────────────────────────────────
            if let Some(name) =
                population::arrival(&mut ctx, &self.catalog, &self.curve, &mut self.arrival_threshold)
            {
                report.arrivals.push(name);
            }
        }

        // ── Phase 6: artifacts ────────────────────────────────────────────
        if !self.headless {
            self.storage.write_environment(step.0 + 1, &self.environment())?;
        }
        if self.write_movement {
            let file = MovementFile { persona: movements, meta: MovementMeta { curr_time: Some(now) } };
            self.storage.write_movement(step.0, &file)?;
        }

        self.clock.advance();

        let interval = self.config.status_interval_steps;
        if interval > 0 && self.clock.step.0 % interval == 0 {
            self.write_status()?;
        }

        // Only a committed step reaches observers.
        observer.on_tick_end(&report, &self.ledger, &self.roster);
        debug!(
            step = step.0,
            moved = report.moved,
            arrivals = report.arrivals.len(),
            departures = report.departures.len(),
            "step complete"
        );
        Ok(report)
    }

    /// Remove every actor that has reached the exit.
    fn finalize_departures(&mut self) -> Vec<String> {
        let leaving: Vec<String> = self
            .roster
            .iter()
            .filter(|a| a.is_exiting(&self.ledger))
            .map(|a| a.name.clone())
            .collect();
        for name in &leaving {
            let Some(actor) = self.roster.remove(name) else { continue };
            if let Some(tile) = actor.tile() {
                self.ledger.maze.remove_subject_events(tile, name);
            }
            actor.leave_ed(&mut self.ledger, &mut self.roster, &mut self.metrics, &self.config);
            let walked_out = actor.patient().is_some_and(|p| p.left_without_being_seen);
            info!(actor = %name, role = %actor.role(), walked_out, "left the department");
        }
        leaving
    }
}
