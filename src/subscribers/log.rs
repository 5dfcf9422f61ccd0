//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] renders lifecycle events through `tracing` in a compact,
//! human-readable form. This is primarily useful for development, demos, and
//! tests; production embedders usually implement their own
//! [`Subscribe`](crate::Subscribe) feeding UI badges or metrics.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Built-in `tracing` subscriber for lifecycle events.
///
/// Enabled via the `logging` feature.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::TaskQueued => info!(task, "queued"),
            EventKind::TaskStarting => info!(task, "starting"),
            EventKind::TaskProgress => {
                debug!(
                    task,
                    percent = e.percent.unwrap_or(0),
                    status = e.status.as_deref().unwrap_or(""),
                    "progress"
                );
            }
            EventKind::TaskStopped => info!(task, "stopped"),
            EventKind::TaskFailed => {
                warn!(task, reason = e.reason.as_deref().unwrap_or(""), "failed");
            }
            EventKind::TaskDropped => debug!(task, "dropped by policy"),
            EventKind::TaskRemoved => debug!(task, "removed"),
            EventKind::ShutdownRequested => info!("shutdown requested"),
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
