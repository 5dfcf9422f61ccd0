//! # Runtime events emitted by the keeper and its collaborators.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Registry events**: a submission entered or left the active set
//!   (`TaskQueued`, `TaskRemoved`) — presentation only ("N operations pending").
//! - **Lifecycle events**: execution flow on the worker (`TaskStarting`,
//!   `TaskProgress`, `TaskStopped`, `TaskFailed`, `TaskDropped`).
//! - **Shutdown events**: `ShutdownRequested`.
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task
//! name, reasons, and fine-grained progress.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order. Registry notifications have no ordering contract
//! relative to queue order; they are never used for scheduling decisions.
//!
//! ## Example
//! ```rust
//! use chorekeeper::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::TaskFailed)
//!     .with_task("Dup")
//!     .with_reason("catalog row vanished mid-scan");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("Dup"));
//! assert_eq!(ev.reason.as_deref(), Some("catalog row vanished mid-scan"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Registry events ===
    /// A submission was accepted and entered the active set.
    ///
    /// Sets:
    /// - `task`: category name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskQueued,

    /// A submission left the active set (any terminal transition).
    ///
    /// Sets:
    /// - `task`: category name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskRemoved,

    // === Task lifecycle events ===
    /// The worker began executing a task.
    ///
    /// Sets:
    /// - `task`: category name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskStarting,

    /// Fine-grained progress reported by the running task, forwarded verbatim.
    ///
    /// Sets:
    /// - `task`: category name
    /// - `percent`: 0–100
    /// - `status`: free-form status text
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskProgress,

    /// The task finished (success **or** graceful cooperative cancellation).
    ///
    /// Sets:
    /// - `task`: category name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskStopped,

    /// The task body failed (error or panic). The worker loop continues.
    ///
    /// Sets:
    /// - `task`: category name
    /// - `reason`: failure message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskFailed,

    /// A submission was denied by category policy and never queued.
    ///
    /// Sets:
    /// - `task`: category name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskDropped,

    // === Shutdown events ===
    /// The keeper is closing: queue closed, in-flight task asked to cancel.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ShutdownRequested,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Category name of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (failure details, denial cause, etc.).
    pub reason: Option<Arc<str>>,
    /// Progress percentage (0–100), only for [`EventKind::TaskProgress`].
    pub percent: Option<u8>,
    /// Free-form progress status text, only for [`EventKind::TaskProgress`].
    pub status: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            reason: None,
            percent: None,
            status: None,
        }
    }

    /// Attaches a task category name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a progress percentage, clamped to 100.
    #[inline]
    pub fn with_percent(mut self, percent: u8) -> Self {
        self.percent = Some(percent.min(100));
        self
    }

    /// Attaches free-form progress status text.
    #[inline]
    pub fn with_status(mut self, status: impl Into<Arc<str>>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// True for terminal lifecycle events (`TaskStopped` / `TaskFailed`).
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::TaskStopped | EventKind::TaskFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::now(EventKind::TaskQueued);
        let b = Event::now(EventKind::TaskQueued);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn percent_clamped_to_hundred() {
        let ev = Event::now(EventKind::TaskProgress).with_percent(250);
        assert_eq!(ev.percent, Some(100));
    }

    #[test]
    fn terminal_kinds() {
        assert!(Event::now(EventKind::TaskStopped).is_terminal());
        assert!(Event::now(EventKind::TaskFailed).is_terminal());
        assert!(!Event::now(EventKind::TaskStarting).is_terminal());
        assert!(!Event::now(EventKind::TaskDropped).is_terminal());
    }
}
