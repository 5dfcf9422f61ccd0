//! # Task abstraction.
//!
//! This module defines the [`Task`] trait, the common contract every unit of
//! maintenance/export work implements. The keeper treats all variants
//! uniformly through this contract and holds no type-specific logic.
//!
//! A task receives a [`TaskContext`] carrying its cancellation token and a
//! progress handle. Cancellation is cooperative: the body should poll
//! [`TaskContext::is_cancelled`] at reasonable checkpoints and return
//! [`TaskError::Canceled`] promptly — a body that never checks cannot be
//! stopped early.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::tasks::context::TaskContext;

/// Shared handle to a task (`Arc<dyn Task>`), suitable for submission.
pub type TaskRef = Arc<dyn Task>;

/// # One schedulable unit of maintenance/export work.
///
/// A `Task` has a stable [`name`](Task::name) — its *category*, used for
/// policy checks, suppression, logging, and registry membership queries —
/// and an async [`run`](Task::run) method executed on the keeper's single
/// worker. Bodies run to completion one at a time; a slow body blocks the
/// whole scheduler until it returns or observes cancellation.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use chorekeeper::{Task, TaskContext, TaskError};
///
/// struct OrphanScan;
///
/// #[async_trait]
/// impl Task for OrphanScan {
///     fn name(&self) -> &str { "Phantom" }
///
///     async fn run(&self, ctx: TaskContext) -> Result<(), TaskError> {
///         for step in 0..4u8 {
///             if ctx.is_cancelled() {
///                 return Err(TaskError::Canceled);
///             }
///             ctx.progress(step * 25, "checking catalog entries");
///             // scan a batch...
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns the stable category name of this task.
    fn name(&self) -> &str;

    /// Executes the task until completion or cancellation.
    ///
    /// Runs synchronously on the worker: nothing else is scheduled until it
    /// returns. Implementations should check `ctx.is_cancelled()` at bounded
    /// intervals and exit with [`TaskError::Canceled`].
    async fn run(&self, ctx: TaskContext) -> Result<(), TaskError>;
}
