//! # Task specification for submission.
//!
//! Defines [`TaskSpec`] a submission bundle that describes one unit of work:
//! the task itself, an optional [`Scope`] narrowing what it operates on, and
//! an optional completion hook.
//!
//! ## Rules
//! - The spec is passed to [`Keeper::submit`](crate::Keeper::submit); once
//!   accepted, the keeper owns it.
//! - The completion hook runs exactly once, after the body returns — on
//!   success, failure, panic, or cancellation alike. Suppression released in
//!   a hook therefore always lifts, even when the task fails.

use std::fmt;
use std::sync::Arc;

use crate::tasks::task::TaskRef;

/// Callback invoked once by the keeper after the task body has returned.
pub type CompletionHook = Arc<dyn Fn() + Send + Sync>;

/// Optional filters narrowing a task to part of the catalog
/// (e.g. one artist/album subtree instead of the whole store).
///
/// The keeper never interprets scopes; they exist so producers can ask the
/// registry "is a scan for this same subtree already pending?" before
/// submitting a redundant one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scope {
    /// Target group identifier (e.g. artist).
    pub group: Option<String>,
    /// Target subgroup identifier (e.g. album).
    pub subgroup: Option<String>,
}

impl Scope {
    /// Scope covering one group.
    pub fn for_group(group: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            subgroup: None,
        }
    }

    /// Scope covering one subgroup within a group.
    pub fn for_subgroup(group: impl Into<String>, subgroup: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            subgroup: Some(subgroup.into()),
        }
    }
}

/// Specification for one submission.
///
/// ## Example
/// ```rust
/// use chorekeeper::{Scope, TaskContext, TaskError, TaskFn, TaskSpec};
///
/// let scan = TaskFn::arc("Dup", |_ctx: TaskContext| async { Ok::<_, TaskError>(()) });
/// let spec = TaskSpec::new(scan)
///     .with_scope(Scope::for_group("artist-42"))
///     .with_completed(|| { /* re-enable something */ });
///
/// assert_eq!(spec.name(), "Dup");
/// assert!(spec.scope().is_some());
/// ```
#[derive(Clone)]
pub struct TaskSpec {
    task: TaskRef,
    scope: Option<Scope>,
    completed: Option<CompletionHook>,
}

impl TaskSpec {
    /// Creates a specification for the given task.
    pub fn new(task: TaskRef) -> Self {
        Self {
            task,
            scope: None,
            completed: None,
        }
    }

    /// Returns a new spec with the given scope attached.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Returns a new spec with a completion hook attached.
    pub fn with_completed(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.completed = Some(Arc::new(hook));
        self
    }

    /// Returns reference to the task.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    /// Convenience: returns the task's category name.
    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Returns the scope, if any.
    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub(crate) fn completed(&self) -> Option<&CompletionHook> {
        self.completed.as_ref()
    }
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("task", &self.task.name())
            .field("scope", &self.scope)
            .field("completed", &self.completed.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::tasks::context::TaskContext;
    use crate::tasks::task_fn::TaskFn;

    #[test]
    fn scope_constructors() {
        let g = Scope::for_group("artist");
        assert_eq!(g.group.as_deref(), Some("artist"));
        assert!(g.subgroup.is_none());

        let s = Scope::for_subgroup("artist", "album");
        assert_eq!(s.subgroup.as_deref(), Some("album"));
    }

    #[test]
    fn debug_shows_name_not_internals() {
        let spec = TaskSpec::new(TaskFn::arc("Init", |_ctx: TaskContext| async {
            Ok::<_, TaskError>(())
        }));
        let rendered = format!("{spec:?}");
        assert!(rendered.contains("Init"));
    }
}
