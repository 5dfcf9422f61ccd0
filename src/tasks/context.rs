//! Execution context handed to every running task.
//!
//! Bundles the cancellation token with a progress reporter so task bodies
//! depend on one argument instead of two collaborators.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};

/// Per-execution context passed to [`Task::run`](crate::Task::run).
///
/// Cheap to clone; clones share the same cancellation token, so a body may
/// hand clones to helpers it awaits.
#[derive(Clone)]
pub struct TaskContext {
    task: Arc<str>,
    cancel: CancellationToken,
    bus: Bus,
}

impl TaskContext {
    pub(crate) fn new(task: Arc<str>, cancel: CancellationToken, bus: Bus) -> Self {
        Self { task, cancel, bus }
    }

    /// Category name of the task this context belongs to.
    pub fn task(&self) -> &str {
        &self.task
    }

    /// True once cancellation has been requested.
    ///
    /// Bodies poll this at checkpoints; cancellation is cooperative, never
    /// preemptive.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Completes when cancellation is requested. For use in `select!` arms
    /// around long waits (I/O, external processes).
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Reports fine-grained progress `(percent, status)`, forwarded verbatim
    /// to every subscriber as [`EventKind::TaskProgress`].
    pub fn progress(&self, percent: u8, status: impl Into<Arc<str>>) {
        self.bus.publish(
            Event::now(EventKind::TaskProgress)
                .with_task(self.task.clone())
                .with_percent(percent)
                .with_status(status),
        );
    }
}
