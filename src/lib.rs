//! # chorekeeper
//!
//! **Chorekeeper** is a serialized background-task scheduler for media
//! library catalogs.
//!
//! It accepts maintenance and export tasks from many producers (user
//! commands, filesystem-change notifications, playback hooks) and executes
//! them **one at a time, in arrival order**, on a single dedicated worker.
//! That serialization is the point: two scans mutating the same catalog, or
//! a scan colliding with a file export, would corrupt state — so at most one
//! task ever touches the shared store.
//!
//! ## Architecture
//! ```text
//!  Producers (any thread/task):
//!    UI action ──┐
//!    FS watcher ─┼─ submit()/notify_change() ──► policy check ──► Registry + TaskQueue
//!    playback  ──┘      (settings AND not-suppressed)                    │
//!                                                                        ▼
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │  Keeper worker loop (one task, process lifetime)                          │
//! │    dequeue → close watch gate → TaskStarting → run body → remove from     │
//! │    registry → reopen gate → TaskStopped/TaskFailed → completion hook      │
//! └──────────────────────────────────┬────────────────────────────────────────┘
//!                                    │ publish(Event)
//!                                    ▼
//!                          Bus (broadcast channel)
//!                                    │
//!                        ┌───────────┴───────────┐
//!                        ▼                       ▼
//!                 SubscriberSet            Keeper::subscribe()
//!               (per-sub queues)          (direct receivers)
//!                 ▼         ▼
//!            sub1.on_event  sub2.on_event
//! ```
//!
//! ## Lifecycle of a submission
//! ```text
//! TaskSpec ──► submit()
//!   ├─ policy denies ──► dropped (TaskDropped event, SubmitOutcome::Denied)
//!   └─ accepted ──► Registry (TaskQueued) ──► TaskQueue ──► worker
//!        Queued ──► Running ──► Completed | Failed | Cancelled
//!                                  └─ always: removed from registry,
//!                                     completion hook fired
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                  |
//! |-------------------|----------------------------------------------------------------|-------------------------------------|
//! | **Scheduling**    | FIFO queue, single worker, cooperative cancellation.           | [`Keeper`], [`TaskQueue`]           |
//! | **Tasks**         | Define tasks as trait impls or closures.                       | [`Task`], [`TaskFn`], [`TaskSpec`]  |
//! | **Policy**        | Per-category enable/disable: settings + temporary suppression. | [`SettingsSource`]                  |
//! | **Watch**         | Filesystem changes become tasks through the same policy.       | [`ChangeAdapter`], [`ChangeEvent`]  |
//! | **Observability** | Lifecycle/progress events fanned out to subscribers.           | [`Subscribe`], [`Event`]            |
//! | **Errors**        | Typed errors for the runtime and task executions.              | [`RuntimeError`], [`TaskError`]     |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use chorekeeper::{Config, Keeper, SubmitOutcome, TaskContext, TaskError, TaskFn, TaskSpec};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Construct once at process start; hand the Arc to producers.
//!     let keeper = Keeper::builder(Config::default()).build();
//!
//!     let scan = TaskFn::arc("Dup", |ctx: TaskContext| async move {
//!         if ctx.is_cancelled() {
//!             return Err(TaskError::Canceled);
//!         }
//!         ctx.progress(100, "catalog clean");
//!         Ok(())
//!     });
//!
//!     assert_eq!(keeper.submit(TaskSpec::new(scan)), SubmitOutcome::Accepted);
//!
//!     // Drains the queue, then stops the worker.
//!     keeper.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{
    ActiveEntry, ChangeAdapter, ChangeEvent, ChangeKind, Config, DefaultSettings, Keeper,
    KeeperBuilder, QueueClosed, Registry, SettingsSource, SubmitOutcome, TaskQueue, WATCH_CATEGORY,
};
pub use error::{RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{CompletionHook, Scope, Task, TaskContext, TaskFn, TaskRef, TaskSpec};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
