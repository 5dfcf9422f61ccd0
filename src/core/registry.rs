//! # Active-task registry.
//!
//! [`Registry`] tracks every submission that is currently queued or running —
//! a multiset, since several tasks of the same category may be pending at
//! once. Membership holds from acceptance until the terminal transition
//! (completed, failed, or cancelled).
//!
//! Producers use it to answer "is a scan of this category/scope already
//! active?" before submitting redundant work; observers use the
//! `TaskQueued`/`TaskRemoved` notifications it publishes to drive
//! presentation ("N operations pending").
//!
//! ## Rules
//! - Entries are keyed by a unique submission id assigned at insert.
//! - Notifications have no ordering contract relative to queue order; they
//!   are presentation-only and never used for scheduling decisions.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Scope, TaskSpec};

/// One queued-or-running submission, as seen by registry queries.
#[derive(Clone, Debug)]
pub struct ActiveEntry {
    /// Unique submission id.
    pub id: u64,
    /// Category name of the task.
    pub name: Arc<str>,
    /// Scope the submission was narrowed to, if any.
    pub scope: Option<Scope>,
}

/// Thread-safe multiset of queued-or-running submissions.
pub struct Registry {
    entries: Mutex<Vec<ActiveEntry>>,
    next_id: AtomicU64,
    bus: Bus,
}

impl Registry {
    pub(crate) fn new(bus: Bus) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            bus,
        }
    }

    /// Adds a submission, assigns its id, publishes `TaskQueued`.
    pub(crate) fn insert(&self, spec: &TaskSpec) -> u64 {
        let id = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        let name: Arc<str> = Arc::from(spec.name());
        {
            let mut entries = self.entries.lock().unwrap();
            entries.push(ActiveEntry {
                id,
                name: name.clone(),
                scope: spec.scope().cloned(),
            });
        }
        self.bus
            .publish(Event::now(EventKind::TaskQueued).with_task(name));
        id
    }

    /// Removes a submission by id, publishes `TaskRemoved`.
    ///
    /// Idempotent: removing an id that already left the set is a no-op.
    pub(crate) fn remove(&self, id: u64) {
        let removed = {
            let mut entries = self.entries.lock().unwrap();
            match entries.iter().position(|e| e.id == id) {
                Some(pos) => Some(entries.remove(pos)),
                None => None,
            }
        };
        if let Some(entry) = removed {
            self.bus
                .publish(Event::now(EventKind::TaskRemoved).with_task(entry.name));
        }
    }

    /// Removes every entry, publishing `TaskRemoved` for each.
    pub(crate) fn clear(&self) {
        let drained: Vec<ActiveEntry> = {
            let mut entries = self.entries.lock().unwrap();
            entries.drain(..).collect()
        };
        for entry in drained {
            self.bus
                .publish(Event::now(EventKind::TaskRemoved).with_task(entry.name));
        }
    }

    /// True if any active entry matches the predicate.
    pub fn contains(&self, predicate: impl Fn(&ActiveEntry) -> bool) -> bool {
        self.entries.lock().unwrap().iter().any(|e| predicate(e))
    }

    /// True if any task of the given category is queued or running.
    pub fn is_active(&self, category: &str) -> bool {
        self.contains(|e| &*e.name == category)
    }

    /// True if a task of the given category is active for the same scope.
    pub fn is_active_scoped(&self, category: &str, scope: &Scope) -> bool {
        self.contains(|e| &*e.name == category && e.scope.as_ref() == Some(scope))
    }

    /// Number of queued-or-running submissions.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// True when nothing is queued or running.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
