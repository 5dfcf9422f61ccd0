//! # Keeper: the serialized scheduler for catalog maintenance.
//!
//! The [`Keeper`] owns the task queue, the active-task registry, the category
//! policy, and the event bus. One dedicated worker loop — spawned once by the
//! builder and alive until the queue closes — drains submissions in strict
//! FIFO order and runs each task body to completion before touching the next.
//! That single worker **is** the mutual-exclusion guarantee: at most one task
//! mutates the shared catalog at any instant.
//!
//! ## Worker loop
//! ```text
//! loop {
//!   ├─► queue.dequeue()                 (suspends while empty; exits on Closed)
//!   ├─► close watch gate                (a running task must not re-trigger itself)
//!   ├─► current = task, publish TaskStarting
//!   ├─► run body (catch error + panic; log; never propagate)
//!   ├─► registry.remove, reopen watch gate
//!   ├─► publish TaskStopped / TaskFailed
//!   ├─► completion hook                 (always — finally semantics)
//!   └─► current = None
//! }
//! ```
//!
//! ## Entry points (any thread/task)
//! - [`submit`](Keeper::submit): policy check → registry → queue.
//! - [`suppress`](Keeper::suppress) / [`unsuppress`](Keeper::unsuppress):
//!   temporary category disabling, e.g. around exports.
//! - [`cancel`](Keeper::cancel): cooperative cancellation of the *current*
//!   task only; queued tasks are unaffected.
//! - [`notify_change`](Keeper::notify_change): filesystem watcher inlet.
//! - [`close`](Keeper::close) / [`shutdown`](Keeper::shutdown).
//!
//! ## Rules
//! - Submission order is execution order. No priorities, no reordering.
//! - A failing or panicking body is logged and reported; the loop continues.
//! - Policy applies at submit time only; queued tasks are never re-evaluated.
//! - Cancellation is cooperative: a body that never polls its context cannot
//!   be stopped early, and nothing force-kills the worker.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::core::policy::CategoryPolicy;
use crate::core::queue::{QueueClosed, TaskQueue};
use crate::core::registry::Registry;
use crate::core::watch::{ChangeAdapter, ChangeEvent, ChangeTask};
use crate::core::Config;
use crate::error::{RuntimeError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{TaskContext, TaskSpec};

/// Result of a submission attempt.
///
/// Denial is not an error: producers that only ever fire-and-forget may
/// ignore it. Producers that need to know whether a category is live can
/// check [`Keeper::is_allowed`] or the registry before building a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Entered the registry and the queue; will run in FIFO turn.
    Accepted,
    /// Rejected by category policy (settings or suppression) or filtered at
    /// the watch boundary. Not queued, not registered.
    Denied,
    /// The keeper is closed; nothing is accepted anymore.
    Closed,
}

/// One accepted submission travelling through the queue.
pub(crate) struct Submission {
    id: u64,
    spec: TaskSpec,
}

/// The task currently executing on the worker.
pub(crate) struct CurrentTask {
    name: Arc<str>,
    token: CancellationToken,
}

/// Serialized background-task scheduler. Construct via
/// [`Keeper::builder`](crate::KeeperBuilder); all handles are `Arc`-shared.
pub struct Keeper {
    pub(crate) cfg: Config,
    pub(crate) bus: Bus,
    pub(crate) queue: TaskQueue<Submission>,
    pub(crate) registry: Registry,
    pub(crate) policy: CategoryPolicy,
    pub(crate) adapter: Option<Arc<dyn ChangeAdapter>>,
    pub(crate) watch_open: AtomicBool,
    pub(crate) runtime_token: CancellationToken,
    pub(crate) current: Mutex<Option<CurrentTask>>,
    pub(crate) worker: Mutex<Option<JoinHandle<()>>>,
}

impl Keeper {
    /// Starts building a keeper with the given configuration.
    pub fn builder(cfg: Config) -> crate::core::builder::KeeperBuilder {
        crate::core::builder::KeeperBuilder::new(cfg)
    }

    /// Submits a task for serialized execution.
    ///
    /// Checks category policy first: a denied submission is dropped without
    /// entering the registry or the queue (a `TaskDropped` event and a debug
    /// log are the only traces). Accepted submissions are registered, then
    /// enqueued; the worker picks them up in FIFO order.
    pub fn submit(&self, spec: TaskSpec) -> SubmitOutcome {
        let name = spec.name();
        if !self.policy.allows(name) {
            debug!(task = name, "submission denied by category policy");
            self.bus
                .publish(Event::now(EventKind::TaskDropped).with_task(name));
            return SubmitOutcome::Denied;
        }

        let id = self.registry.insert(&spec);
        if self.queue.enqueue(Submission { id, spec }) {
            SubmitOutcome::Accepted
        } else {
            // Closed between the policy check and the enqueue; undo the
            // registry entry so membership stays terminal-accurate.
            self.registry.remove(id);
            SubmitOutcome::Closed
        }
    }

    /// True if a submission of this category would currently be accepted.
    pub fn is_allowed(&self, category: &str) -> bool {
        self.policy.allows(category)
    }

    /// Temporarily disables categories, on top of persistent settings.
    ///
    /// Typically paired with a completion hook that calls
    /// [`unsuppress`](Keeper::unsuppress), so the suppression lifts even if
    /// the guarding task fails.
    pub fn suppress<I, S>(&self, categories: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy.suppress(categories);
    }

    /// Lifts a previous [`suppress`](Keeper::suppress).
    pub fn unsuppress<I, S>(&self, categories: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy.unsuppress(categories);
    }

    /// Requests cooperative cancellation of the currently running task.
    ///
    /// Returns `true` if a task was running and has been signalled. A no-op
    /// (returning `false`) when the worker is idle; queued tasks and tasks
    /// that already finished are never affected.
    pub fn cancel(&self) -> bool {
        let current = self.current.lock().unwrap();
        match current.as_ref() {
            Some(task) => {
                debug!(task = &*task.name, "cancellation requested");
                task.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Inlet for the external filesystem watcher.
    ///
    /// The change is dropped (`Denied`) while the watch gate is closed —
    /// during every task execution, and permanently after
    /// [`close`](Keeper::close) — when no adapter is configured, or when the
    /// adapter does not recognize any path the change touches. Otherwise it
    /// is wrapped into an adapter task (category
    /// [`WATCH_CATEGORY`](crate::WATCH_CATEGORY)) and submitted under the
    /// same policy as any other task.
    pub fn notify_change(&self, change: ChangeEvent) -> SubmitOutcome {
        if !self.watch_open.load(AtomicOrdering::Acquire) {
            return SubmitOutcome::Denied;
        }
        let Some(adapter) = self.adapter.as_ref() else {
            return SubmitOutcome::Denied;
        };
        if !change.is_relevant_to(adapter.as_ref()) {
            return SubmitOutcome::Denied;
        }
        self.submit(TaskSpec::new(Arc::new(ChangeTask::new(
            Arc::clone(adapter),
            change,
        ))))
    }

    /// The active-task registry, for "is category X already pending?" queries
    /// and presentation counts.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Subscribes directly to the event stream (lifecycle, progress,
    /// registry notifications).
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Closes the keeper: no further submissions, queue drains, worker exits.
    ///
    /// Idempotent. The watch gate closes permanently, the in-flight task is
    /// asked to cancel (cooperatively — nothing is force-killed), suppression
    /// state drops, and the registry clears. Tasks still in the queue are
    /// drained by the worker with an already-cancelled context, so
    /// well-behaved bodies exit promptly.
    pub fn close(&self) {
        if !self.queue.close() {
            return;
        }
        self.bus.publish(Event::now(EventKind::ShutdownRequested));
        self.watch_open.store(false, AtomicOrdering::Release);
        self.runtime_token.cancel();
        self.policy.clear_suppressed();
        self.registry.clear();
    }

    /// [`close`](Keeper::close), then waits up to `cfg.grace` for the worker
    /// to finish.
    ///
    /// Returns [`RuntimeError::GraceExceeded`] — naming the stuck task, if
    /// one is still running — when the worker does not yield in time.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.close();

        let handle = { self.worker.lock().unwrap().take() };
        let Some(handle) = handle else {
            // Worker already joined by an earlier shutdown call.
            return Ok(());
        };

        let grace = self.cfg.grace;
        match tokio::time::timeout(grace, handle).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(join_err)) => {
                warn!(error = %join_err, "worker terminated abnormally");
                Ok(())
            }
            Err(_elapsed) => {
                let stuck = self
                    .current
                    .lock()
                    .unwrap()
                    .as_ref()
                    .map(|c| c.name.to_string());
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// The worker loop. Spawned exactly once by the builder; runs until the
    /// queue is closed and drained.
    pub(crate) async fn worker_loop(self: Arc<Self>) {
        loop {
            let Submission { id, spec } = match self.queue.dequeue().await {
                Ok(submission) => submission,
                Err(QueueClosed) => break,
            };

            let name: Arc<str> = Arc::from(spec.name());
            let token = self.runtime_token.child_token();

            // Closed for the whole execution: file writes performed by the
            // task itself must not come back in as change notifications.
            self.watch_open.store(false, AtomicOrdering::Release);
            {
                let mut current = self.current.lock().unwrap();
                *current = Some(CurrentTask {
                    name: Arc::clone(&name),
                    token: token.clone(),
                });
            }

            self.bus
                .publish(Event::now(EventKind::TaskStarting).with_task(Arc::clone(&name)));

            let ctx = TaskContext::new(Arc::clone(&name), token, self.bus.clone());
            let outcome = std::panic::AssertUnwindSafe(spec.task().run(ctx))
                .catch_unwind()
                .await;

            self.registry.remove(id);
            // Reopen only while the keeper itself is still open.
            self.watch_open.store(
                !self.runtime_token.is_cancelled(),
                AtomicOrdering::Release,
            );

            match outcome {
                Ok(Ok(())) => {
                    self.bus
                        .publish(Event::now(EventKind::TaskStopped).with_task(Arc::clone(&name)));
                }
                Ok(Err(TaskError::Canceled)) => {
                    // Graceful cooperative exit, reported as a normal stop.
                    debug!(task = &*name, "task cancelled");
                    self.bus
                        .publish(Event::now(EventKind::TaskStopped).with_task(Arc::clone(&name)));
                }
                Ok(Err(err)) => {
                    error!(task = &*name, error = %err, "task failed");
                    self.bus.publish(
                        Event::now(EventKind::TaskFailed)
                            .with_task(Arc::clone(&name))
                            .with_reason(err.as_message()),
                    );
                }
                Err(panic_err) => {
                    let reason = panic_reason(panic_err);
                    error!(task = &*name, reason, "task panicked");
                    self.bus.publish(
                        Event::now(EventKind::TaskFailed)
                            .with_task(Arc::clone(&name))
                            .with_reason(reason),
                    );
                }
            }

            // Finally-semantics: the hook fires on success, failure, panic,
            // and cancellation alike, so suppression never sticks.
            if let Some(hook) = spec.completed() {
                hook();
            }

            {
                let mut current = self.current.lock().unwrap();
                *current = None;
            }
        }
    }
}

fn panic_reason(err: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::watch::ChangeAdapter;
    use crate::tasks::TaskFn;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::{mpsc, Notify};

    fn keeper() -> Arc<Keeper> {
        Keeper::builder(Config::default()).build()
    }

    /// Task that reports its name on a channel when it runs.
    fn reporting(name: &'static str, done: mpsc::Sender<&'static str>) -> TaskSpec {
        TaskSpec::new(TaskFn::arc(name, move |_ctx: TaskContext| {
            let done = done.clone();
            async move {
                let _ = done.send(name).await;
                Ok::<_, TaskError>(())
            }
        }))
    }

    struct MapSettings(HashMap<String, bool>);

    impl crate::core::policy::SettingsSource for MapSettings {
        fn lookup(&self, key: &str) -> Option<bool> {
            self.0.get(key).copied()
        }
    }

    struct FlacAdapter {
        applied: mpsc::Sender<std::path::PathBuf>,
    }

    #[async_trait]
    impl ChangeAdapter for FlacAdapter {
        fn recognizes(&self, path: &Path) -> bool {
            path.extension().is_some_and(|e| e == "flac")
        }

        async fn apply(&self, change: &ChangeEvent, _ctx: &TaskContext) -> Result<(), TaskError> {
            let _ = self.applied.send(change.path.clone()).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn executes_in_submission_order() {
        let keeper = keeper();
        let (tx, mut rx) = mpsc::channel(8);

        assert_eq!(keeper.submit(reporting("Init", tx.clone())), SubmitOutcome::Accepted);
        assert_eq!(keeper.submit(reporting("Dup", tx.clone())), SubmitOutcome::Accepted);
        assert_eq!(keeper.submit(reporting("Phantom", tx.clone())), SubmitOutcome::Accepted);

        let mut order = Vec::new();
        for _ in 0..3 {
            order.push(rx.recv().await.unwrap());
        }
        assert_eq!(order, vec!["Init", "Dup", "Phantom"]);
    }

    #[tokio::test]
    async fn never_runs_two_tasks_at_once() {
        let keeper = keeper();
        let (tx, mut rx) = mpsc::channel(16);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            let tx = tx.clone();
            keeper.submit(TaskSpec::new(TaskFn::arc("Dup", move |_ctx: TaskContext| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                let tx = tx.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    let _ = tx.send(()).await;
                    Ok::<_, TaskError>(())
                }
            })));
        }

        for _ in 0..5 {
            rx.recv().await.unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_is_noop_when_idle() {
        let keeper = keeper();
        assert!(!keeper.cancel());
    }

    #[tokio::test]
    async fn cancel_reaches_only_the_running_task() {
        let keeper = keeper();
        let (started_tx, mut started_rx) = mpsc::channel(1);
        let (done_tx, mut done_rx) = mpsc::channel(4);

        let done = done_tx.clone();
        keeper.submit(TaskSpec::new(TaskFn::arc("Export", move |ctx: TaskContext| {
            let started = started_tx.clone();
            let done = done.clone();
            async move {
                let _ = started.send(()).await;
                ctx.cancelled().await;
                let _ = done.send("Export:cancelled").await;
                Err::<(), _>(TaskError::Canceled)
            }
        })));

        started_rx.recv().await.unwrap();
        assert!(keeper.cancel());
        assert_eq!(done_rx.recv().await.unwrap(), "Export:cancelled");

        // The next task gets a fresh token; the earlier cancel must not leak.
        let done = done_tx.clone();
        keeper.submit(TaskSpec::new(TaskFn::arc("Dup", move |ctx: TaskContext| {
            let done = done.clone();
            async move {
                assert!(!ctx.is_cancelled());
                let _ = done.send("Dup:ran").await;
                Ok::<_, TaskError>(())
            }
        })));
        assert_eq!(done_rx.recv().await.unwrap(), "Dup:ran");
    }

    #[tokio::test]
    async fn settings_disabled_category_never_registered_or_run() {
        let mut map = HashMap::new();
        map.insert("DupIsEnabled".to_string(), false);
        let keeper = Keeper::builder(Config::default())
            .with_settings(Arc::new(MapSettings(map)))
            .build();

        let (tx, mut rx) = mpsc::channel(4);
        let outcome = keeper.submit(reporting("Dup", tx.clone()));
        assert_eq!(outcome, SubmitOutcome::Denied);
        assert!(!keeper.registry().is_active("Dup"));

        // Flush the worker with an allowed task; Dup must never surface.
        keeper.submit(reporting("Phantom", tx));
        assert_eq!(rx.recv().await.unwrap(), "Phantom");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn suppress_drops_until_unsuppressed() {
        let keeper = keeper();
        let (tx, mut rx) = mpsc::channel(4);

        keeper.suppress(["Dup"]);
        assert!(!keeper.is_allowed("Dup"));
        assert_eq!(keeper.submit(reporting("Dup", tx.clone())), SubmitOutcome::Denied);

        keeper.unsuppress(["Dup"]);
        assert!(keeper.is_allowed("Dup"));
        assert_eq!(keeper.submit(reporting("Dup", tx)), SubmitOutcome::Accepted);
        assert_eq!(rx.recv().await.unwrap(), "Dup");
    }

    #[tokio::test]
    async fn failing_task_fires_hook_and_loop_continues() {
        let keeper = keeper();
        let (hook_tx, mut hook_rx) = mpsc::channel(1);
        let (tx, mut rx) = mpsc::channel(4);

        let mut events = keeper.subscribe();
        keeper.submit(
            TaskSpec::new(TaskFn::arc("Dup", |_ctx: TaskContext| async {
                Err(TaskError::fail("catalog row vanished"))
            }))
            .with_completed(move || {
                let _ = hook_tx.try_send(());
            }),
        );
        keeper.submit(reporting("Phantom", tx));

        hook_rx.recv().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "Phantom");

        let mut saw_failure = false;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::TaskFailed {
                assert_eq!(ev.task.as_deref(), Some("Dup"));
                assert!(ev.reason.as_deref().unwrap_or("").contains("vanished"));
                saw_failure = true;
            }
        }
        assert!(saw_failure);
    }

    #[tokio::test]
    async fn panicking_task_fires_hook_and_loop_continues() {
        let keeper = keeper();
        let (hook_tx, mut hook_rx) = mpsc::channel(1);
        let (tx, mut rx) = mpsc::channel(4);

        keeper.submit(
            TaskSpec::new(TaskFn::arc("Init", |_ctx: TaskContext| async {
                if true {
                    panic!("bootstrap exploded");
                }
                Ok::<_, TaskError>(())
            }))
            .with_completed(move || {
                let _ = hook_tx.try_send(());
            }),
        );
        keeper.submit(reporting("Dup", tx));

        hook_rx.recv().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "Dup");
    }

    #[tokio::test]
    async fn export_suppresses_dup_until_its_hook_releases() {
        let keeper = keeper();
        let (started_tx, mut started_rx) = mpsc::channel(1);
        let (released_tx, mut released_rx) = mpsc::channel(1);
        let (dup_tx, mut dup_rx) = mpsc::channel(2);
        let gate = Arc::new(Notify::new());

        keeper.suppress(["Dup"]);
        let hook_keeper = Arc::downgrade(&keeper);
        let export = TaskSpec::new(TaskFn::arc("Export", {
            let gate = Arc::clone(&gate);
            move |_ctx: TaskContext| {
                let started = started_tx.clone();
                let gate = Arc::clone(&gate);
                async move {
                    let _ = started.send(()).await;
                    gate.notified().await;
                    Ok::<_, TaskError>(())
                }
            }
        }))
        .with_completed(move || {
            if let Some(k) = hook_keeper.upgrade() {
                k.unsuppress(["Dup"]);
            }
            let _ = released_tx.try_send(());
        });
        assert_eq!(keeper.submit(export), SubmitOutcome::Accepted);

        // Export is running; a Dup submitted now must be dropped.
        started_rx.recv().await.unwrap();
        assert_eq!(keeper.submit(reporting("Dup", dup_tx.clone())), SubmitOutcome::Denied);
        assert!(!keeper.registry().is_active("Dup"));

        // Let the export finish; its hook lifts the suppression.
        gate.notify_one();
        released_rx.recv().await.unwrap();

        assert_eq!(keeper.submit(reporting("Dup", dup_tx)), SubmitOutcome::Accepted);
        assert_eq!(dup_rx.recv().await.unwrap(), "Dup");
    }

    #[tokio::test]
    async fn policy_applies_at_submit_time_only() {
        let settings = Arc::new(std::sync::Mutex::new(HashMap::new()));

        struct SharedSettings(Arc<std::sync::Mutex<HashMap<String, bool>>>);
        impl crate::core::policy::SettingsSource for SharedSettings {
            fn lookup(&self, key: &str) -> Option<bool> {
                self.0.lock().unwrap().get(key).copied()
            }
        }

        let keeper = Keeper::builder(Config::default())
            .with_settings(Arc::new(SharedSettings(Arc::clone(&settings))))
            .build();

        let (tx, mut rx) = mpsc::channel(2);
        assert_eq!(keeper.submit(reporting("Dup", tx)), SubmitOutcome::Accepted);

        // Disabling after acceptance does not pull the task back out.
        settings
            .lock()
            .unwrap()
            .insert("DupIsEnabled".to_string(), false);
        assert_eq!(rx.recv().await.unwrap(), "Dup");
    }

    #[tokio::test]
    async fn watch_gate_closes_during_execution() {
        let (applied_tx, mut applied_rx) = mpsc::channel(4);
        let keeper = Keeper::builder(Config::default())
            .with_change_adapter(Arc::new(FlacAdapter { applied: applied_tx }))
            .build();

        let (started_tx, mut started_rx) = mpsc::channel(1);
        let (done_tx, mut done_rx) = mpsc::channel(1);
        let gate = Arc::new(Notify::new());

        keeper.submit(
            TaskSpec::new(TaskFn::arc("Export", {
                let gate = Arc::clone(&gate);
                move |_ctx: TaskContext| {
                    let started = started_tx.clone();
                    let gate = Arc::clone(&gate);
                    async move {
                        let _ = started.send(()).await;
                        gate.notified().await;
                        Ok::<_, TaskError>(())
                    }
                }
            }))
            .with_completed(move || {
                let _ = done_tx.try_send(());
            }),
        );

        // Mid-execution: the export itself may be writing these files.
        started_rx.recv().await.unwrap();
        assert_eq!(
            keeper.notify_change(ChangeEvent::created("ripped.flac")),
            SubmitOutcome::Denied
        );

        gate.notify_one();
        done_rx.recv().await.unwrap();

        // Idle again: the same change is now accepted and applied.
        assert_eq!(
            keeper.notify_change(ChangeEvent::created("ripped.flac")),
            SubmitOutcome::Accepted
        );
        assert_eq!(
            applied_rx.recv().await.unwrap(),
            std::path::PathBuf::from("ripped.flac")
        );
    }

    #[tokio::test]
    async fn unrecognized_changes_are_filtered() {
        let (applied_tx, _applied_rx) = mpsc::channel(1);
        let keeper = Keeper::builder(Config::default())
            .with_change_adapter(Arc::new(FlacAdapter { applied: applied_tx }))
            .build();

        assert_eq!(
            keeper.notify_change(ChangeEvent::created("notes.txt")),
            SubmitOutcome::Denied
        );
        assert!(!keeper.registry().is_active(crate::core::watch::WATCH_CATEGORY));
    }

    #[tokio::test]
    async fn change_tasks_obey_category_policy() {
        let (applied_tx, _applied_rx) = mpsc::channel(1);
        let keeper = Keeper::builder(Config::default())
            .with_change_adapter(Arc::new(FlacAdapter { applied: applied_tx }))
            .build();

        keeper.suppress([crate::core::watch::WATCH_CATEGORY]);
        assert_eq!(
            keeper.notify_change(ChangeEvent::created("song.flac")),
            SubmitOutcome::Denied
        );
    }

    #[tokio::test]
    async fn without_adapter_changes_are_dropped() {
        let keeper = keeper();
        assert_eq!(
            keeper.notify_change(ChangeEvent::created("song.flac")),
            SubmitOutcome::Denied
        );
    }

    #[tokio::test]
    async fn progress_is_forwarded_verbatim() {
        let keeper = keeper();
        let mut events = keeper.subscribe();
        let (tx, mut rx) = mpsc::channel(1);

        keeper.submit(TaskSpec::new(TaskFn::arc("Dup", move |ctx: TaskContext| {
            let tx = tx.clone();
            async move {
                ctx.progress(50, "halfway through the catalog");
                let _ = tx.send(()).await;
                Ok::<_, TaskError>(())
            }
        })));
        rx.recv().await.unwrap();

        loop {
            let ev = events.recv().await.unwrap();
            if ev.kind == EventKind::TaskProgress {
                assert_eq!(ev.task.as_deref(), Some("Dup"));
                assert_eq!(ev.percent, Some(50));
                assert_eq!(ev.status.as_deref(), Some("halfway through the catalog"));
                break;
            }
        }
    }

    #[tokio::test]
    async fn close_cancels_in_flight_and_shutdown_joins() {
        let keeper = keeper();
        let (started_tx, mut started_rx) = mpsc::channel(1);

        keeper.submit(TaskSpec::new(TaskFn::arc("Export", move |ctx: TaskContext| {
            let started = started_tx.clone();
            async move {
                let _ = started.send(()).await;
                ctx.cancelled().await;
                Err::<(), _>(TaskError::Canceled)
            }
        })));

        started_rx.recv().await.unwrap();
        keeper.close();
        keeper.shutdown().await.unwrap();

        assert!(keeper.registry().is_empty());
        assert_eq!(
            keeper.submit(TaskSpec::new(TaskFn::arc("Dup", |_ctx: TaskContext| async {
                Ok::<_, TaskError>(())
            }))),
            SubmitOutcome::Closed
        );
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let keeper = keeper();
        keeper.shutdown().await.unwrap();
        keeper.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_reports_stuck_task_after_grace() {
        let mut cfg = Config::default();
        cfg.grace = Duration::from_millis(100);
        let keeper = Keeper::builder(cfg).build();

        let (started_tx, mut started_rx) = mpsc::channel(1);
        let never = Arc::new(Notify::new());
        keeper.submit(TaskSpec::new(TaskFn::arc("Export", {
            let never = Arc::clone(&never);
            move |_ctx: TaskContext| {
                let started = started_tx.clone();
                let never = Arc::clone(&never);
                async move {
                    let _ = started.send(()).await;
                    // Ignores its cancellation token on purpose.
                    never.notified().await;
                    Ok::<_, TaskError>(())
                }
            }
        })));

        started_rx.recv().await.unwrap();
        let err = keeper.shutdown().await.unwrap_err();
        match err {
            RuntimeError::GraceExceeded { stuck, .. } => {
                assert_eq!(stuck.as_deref(), Some("Export"));
            }
        }
    }

    #[tokio::test]
    async fn queued_submissions_drain_after_close_with_cancelled_context() {
        let keeper = keeper();
        let (started_tx, mut started_rx) = mpsc::channel(1);
        let (seen_tx, mut seen_rx) = mpsc::channel(4);
        let gate = Arc::new(Notify::new());

        keeper.submit(TaskSpec::new(TaskFn::arc("Export", {
            let gate = Arc::clone(&gate);
            move |_ctx: TaskContext| {
                let started = started_tx.clone();
                let gate = Arc::clone(&gate);
                async move {
                    let _ = started.send(()).await;
                    gate.notified().await;
                    Ok::<_, TaskError>(())
                }
            }
        })));

        let seen = seen_tx.clone();
        keeper.submit(TaskSpec::new(TaskFn::arc("Dup", move |ctx: TaskContext| {
            let seen = seen.clone();
            async move {
                let _ = seen.send(ctx.is_cancelled()).await;
                if ctx.is_cancelled() {
                    return Err(TaskError::Canceled);
                }
                Ok(())
            }
        })));

        started_rx.recv().await.unwrap();
        keeper.close();
        gate.notify_one();

        // The queued Dup still drains, but its context starts cancelled.
        assert!(seen_rx.recv().await.unwrap());
        keeper.shutdown().await.unwrap();
    }
}
