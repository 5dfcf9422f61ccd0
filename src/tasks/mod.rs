//! # Task abstractions and specifications.
//!
//! This module provides the core task-related types:
//! - [`Task`] - trait for implementing async cancelable units of work
//! - [`TaskFn`] - function-based task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`TaskContext`] - per-execution cancellation + progress handle
//! - [`TaskSpec`] - submission bundle (task + scope + completion hook)

mod context;
mod spec;
mod task;
mod task_fn;

pub use context::TaskContext;
pub use spec::{CompletionHook, Scope, TaskSpec};
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
