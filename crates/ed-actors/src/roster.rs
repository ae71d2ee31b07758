//! The active actor registry.

use std::collections::BTreeMap;

use ed_core::Role;

use crate::actor::Actor;

/// Active actors by name.  Iteration order is by name, which fixes the
/// per-tick processing order for a given roster.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    actors: BTreeMap<String, Actor>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, actor: Actor) -> Option<Actor> {
        self.actors.insert(actor.name.clone(), actor)
    }

    pub fn get(&self, name: &str) -> Option<&Actor> {
        self.actors.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Actor> {
        self.actors.get_mut(name)
    }

    /// Remove an actor for the duration of its tick.  Put it back with
    /// [`Roster::insert`].
    pub fn take(&mut self, name: &str) -> Option<Actor> {
        self.actors.remove(name)
    }

    /// Deregister for good.
    pub fn remove(&mut self, name: &str) -> Option<Actor> {
        self.actors.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actors.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.actors.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Actor> {
        self.actors.values_mut()
    }

    pub fn by_role(&self, role: Role) -> impl Iterator<Item = &Actor> {
        self.actors.values().filter(move |a| a.role() == role)
    }

    pub fn count(&self, role: Role) -> usize {
        self.by_role(role).count()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}
