//! Everything an actor may read or change during its tick.

use chrono::NaiveDateTime;
use ed_core::{SimConfig, SimRng};
use ed_sampler::WaitConfig;
use ed_spatial::Ledger;

use crate::actor::Actor;
use crate::metrics::DataCollection;
use crate::roster::Roster;

/// Mutable view of the simulation handed to [`Actor::advance`][crate::Actor::advance].
///
/// The acting actor itself is *not* in `roster` while it runs; see the crate
/// docs.  Fields are disjoint borrows so a callee can hold `ctx.ledger` and
/// `ctx.roster` at the same time.
pub struct TickContext<'a> {
    pub ledger:  &'a mut Ledger,
    pub roster:  &'a mut Roster,
    pub metrics: &'a mut DataCollection,
    pub rng:     &'a mut SimRng,
    pub config:  &'a SimConfig,
    pub waits:   &'a WaitConfig,
    /// Simulated time of the tick.
    pub now:     NaiveDateTime,
}

impl TickContext<'_> {
    /// Surge multiplier of the current configuration.
    pub fn surge(&self) -> f64 {
        self.config.surge_multiplier()
    }

    /// Minutes represented by one tick.
    pub fn minutes_per_step(&self) -> f64 {
        self.config.minutes_per_step()
    }
}

impl TickContext<'_> {
    /// Run `f` on `name` taken out of the roster, then put it back.
    /// `None` if no such actor is registered.
    pub fn with_actor<R>(&mut self, name: &str, f: impl FnOnce(&mut Actor, &mut Self) -> R) -> Option<R> {
        let mut actor = self.roster.take(name)?;
        let out = f(&mut actor, self);
        self.roster.insert(actor);
        Some(out)
    }
}
