//! Stable ascending priority queue keyed by actor name.
//!
//! Lower numeric priority is served first.  Insertion is stable: a new entry
//! goes after every existing entry of equal priority, so two patients with
//! the same key leave in the order they arrived.  A name appears at most
//! once; a second `push` of the same name is rejected.
//!
//! All in-place priority edits go through [`PriorityQueue::reprioritize`],
//! which applies the edit to every entry and then performs one stable
//! re-sort.  Callers never see an out-of-order queue.

use serde::{Deserialize, Serialize};

/// One `(priority, name)` entry.  Serialised as a two-element array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, String)", into = "(f64, String)")]
pub struct QueueEntry {
    pub priority: f64,
    pub name:     String,
}

impl From<(f64, String)> for QueueEntry {
    fn from((priority, name): (f64, String)) -> Self {
        QueueEntry { priority, name }
    }
}

impl From<QueueEntry> for (f64, String) {
    fn from(e: QueueEntry) -> Self {
        (e.priority, e.name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorityQueue {
    entries: Vec<QueueEntry>,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert after all entries with priority `<= priority`.  Returns
    /// `false` (and leaves the queue unchanged) when `name` is already queued.
    pub fn push(&mut self, priority: f64, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        let at = self.entries.partition_point(|e| e.priority <= priority);
        self.entries.insert(at, QueueEntry { priority, name });
        true
    }

    /// Remove and return the lowest-priority (first) entry.
    pub fn pop_front(&mut self) -> Option<QueueEntry> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0))
        }
    }

    pub fn front(&self) -> Option<&QueueEntry> {
        self.entries.first()
    }

    /// Remove `name`; returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn priority_of(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.priority)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// Drop every entry rejected by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&QueueEntry) -> bool) {
        self.entries.retain(|e| keep(e));
    }

    /// Apply `f(name, priority) -> new priority` to every entry, then
    /// re-sort once (stable, so equal keys keep their relative order).
    pub fn reprioritize(&mut self, mut f: impl FnMut(&str, f64) -> f64) {
        for e in &mut self.entries {
            e.priority = f(&e.name, e.priority);
        }
        self.entries.sort_by(|a, b| a.priority.total_cmp(&b.priority));
    }

    /// Decrease every priority by `decrement`, floored at 1.  Entries already
    /// at or below the floor are left untouched.
    pub fn age(&mut self, decrement: f64) {
        self.reprioritize(|_, p| if p > 1.0 { (p - decrement).max(1.0) } else { p });
    }
}
