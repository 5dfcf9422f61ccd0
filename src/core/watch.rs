//! # Filesystem-change integration.
//!
//! An external watcher delivers create/delete/rename notifications to
//! [`Keeper::notify_change`](crate::Keeper::notify_change). Each notification
//! that survives filtering is wrapped in a [`ChangeTask`] and submitted like
//! any other task — same queue, same registry, same category policy.
//!
//! ## Filtering
//! - The watch gate is closed for the duration of every task execution
//!   (a running scan or export touching files must not re-trigger itself)
//!   and permanently once the keeper closes.
//! - Paths are filtered through [`ChangeAdapter::recognizes`] — the catalog
//!   collaborator decides which file types belong to the library. A rename
//!   qualifies if either side of it is recognized.
//!
//! Adapter tasks report the [`WATCH_CATEGORY`] category, so users can disable
//! folder watching via settings (`"FolderWatchIsEnabled"`) and the keeper can
//! suppress it around exports like any other category.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::tasks::{Task, TaskContext};

/// Category reported by filesystem-change adapter tasks.
pub const WATCH_CATEGORY: &str = "FolderWatch";

/// What happened to a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Deleted,
    Renamed,
}

/// One filesystem change, as delivered by the external watcher.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Affected path (the new path for renames).
    pub path: PathBuf,
    /// Previous path, set for renames only.
    pub old_path: Option<PathBuf>,
}

impl ChangeEvent {
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ChangeKind::Created,
            path: path.into(),
            old_path: None,
        }
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ChangeKind::Deleted,
            path: path.into(),
            old_path: None,
        }
    }

    pub fn renamed(old_path: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ChangeKind::Renamed,
            path: path.into(),
            old_path: Some(old_path.into()),
        }
    }

    /// True if the adapter recognizes any path touched by this change.
    pub(crate) fn is_relevant_to(&self, adapter: &dyn ChangeAdapter) -> bool {
        adapter.recognizes(&self.path)
            || self
                .old_path
                .as_deref()
                .is_some_and(|old| adapter.recognizes(old))
    }
}

/// Catalog-side collaborator that absorbs filesystem changes.
///
/// `recognizes` is the file-type filter (is this a library file at all?);
/// `apply` performs the actual catalog mutation for one change, running on
/// the keeper's worker like any task body.
#[async_trait]
pub trait ChangeAdapter: Send + Sync + 'static {
    /// Does this path belong to the library (by extension or location)?
    fn recognizes(&self, path: &Path) -> bool;

    /// Absorbs one change into the catalog. Cooperative-cancellation rules
    /// apply as for any [`Task::run`].
    async fn apply(&self, change: &ChangeEvent, ctx: &TaskContext) -> Result<(), TaskError>;
}

/// Task wrapping one [`ChangeEvent`] for execution through the normal queue.
pub(crate) struct ChangeTask {
    adapter: Arc<dyn ChangeAdapter>,
    change: ChangeEvent,
}

impl ChangeTask {
    pub(crate) fn new(adapter: Arc<dyn ChangeAdapter>, change: ChangeEvent) -> Self {
        Self { adapter, change }
    }
}

#[async_trait]
impl Task for ChangeTask {
    fn name(&self) -> &str {
        WATCH_CATEGORY
    }

    async fn run(&self, ctx: TaskContext) -> Result<(), TaskError> {
        self.adapter.apply(&self.change, &ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Bus;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    struct FlacAdapter {
        applied: Mutex<Vec<PathBuf>>,
    }

    impl FlacAdapter {
        fn new() -> Self {
            Self {
                applied: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChangeAdapter for FlacAdapter {
        fn recognizes(&self, path: &Path) -> bool {
            path.extension().is_some_and(|e| e == "flac")
        }

        async fn apply(&self, change: &ChangeEvent, _ctx: &TaskContext) -> Result<(), TaskError> {
            self.applied.lock().unwrap().push(change.path.clone());
            Ok(())
        }
    }

    #[test]
    fn relevance_checks_both_sides_of_a_rename() {
        let adapter = FlacAdapter::new();

        assert!(ChangeEvent::created("a.flac").is_relevant_to(&adapter));
        assert!(!ChangeEvent::created("a.txt").is_relevant_to(&adapter));
        assert!(ChangeEvent::renamed("a.flac", "a.bak").is_relevant_to(&adapter));
        assert!(ChangeEvent::renamed("a.bak", "a.flac").is_relevant_to(&adapter));
        assert!(!ChangeEvent::renamed("a.tmp", "a.bak").is_relevant_to(&adapter));
    }

    #[tokio::test]
    async fn change_task_reports_watch_category_and_applies() {
        let adapter = Arc::new(FlacAdapter::new());
        let task = ChangeTask::new(adapter.clone(), ChangeEvent::created("song.flac"));
        assert_eq!(task.name(), WATCH_CATEGORY);

        let ctx = TaskContext::new(
            Arc::from(WATCH_CATEGORY),
            CancellationToken::new(),
            Bus::new(1),
        );
        task.run(ctx).await.unwrap();

        let applied = adapter.applied.lock().unwrap();
        assert_eq!(applied.as_slice(), [PathBuf::from("song.flac")]);
    }
}
