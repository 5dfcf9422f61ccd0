//! # Example: export_suppression
//!
//! Demonstrates category suppression around an export: while an export runs,
//! duplicate scans must not interleave with it, so the producer suppresses
//! the `Dup` category and releases it from the export's completion hook —
//! which fires even if the export fails.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► keeper.suppress(["Dup"])
//!   ├─► submit Export (hook: unsuppress(["Dup"]))
//!   ├─► submit Dup while Export runs      → Denied
//!   ├─► Export finishes, hook fires
//!   └─► submit Dup again                  → Accepted
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example export_suppression --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use chorekeeper::{
    Config, Keeper, LogWriter, Subscribe, SubmitOutcome, TaskContext, TaskError, TaskFn, TaskSpec,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== export_suppression example ===\n");

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let keeper = Keeper::builder(Config::default())
        .with_subscribers(subs)
        .build();

    let mut events = keeper.subscribe();

    // 1. Suppress scans for the duration of the export; the completion hook
    //    lifts the suppression no matter how the export ends.
    keeper.suppress(["Dup"]);
    let hook_keeper = Arc::downgrade(&keeper);
    let export = TaskSpec::new(TaskFn::arc("Export", |ctx: TaskContext| async move {
        for step in 1..=5u8 {
            if ctx.is_cancelled() {
                return Err(TaskError::Canceled);
            }
            ctx.progress(step * 20, "copying files to target directory");
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        Ok(())
    }))
    .with_completed(move || {
        if let Some(keeper) = hook_keeper.upgrade() {
            keeper.unsuppress(["Dup"]);
            println!("[hook] export done, Dup re-enabled");
        }
    });
    assert_eq!(keeper.submit(export), SubmitOutcome::Accepted);

    // 2. A Dup scan submitted mid-export is dropped, not queued.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let dup = || {
        TaskSpec::new(TaskFn::arc("Dup", |_ctx: TaskContext| async move {
            println!("[dup] scanning for duplicate entries");
            Ok::<_, TaskError>(())
        }))
    };
    let denied = keeper.submit(dup());
    println!("[producer] Dup during export: {denied:?}");
    assert_eq!(denied, SubmitOutcome::Denied);

    // 3. Wait for the export to finish (hook has fired by then).
    loop {
        let ev = events.recv().await?;
        if ev.is_terminal() && ev.task.as_deref() == Some("Export") {
            break;
        }
    }

    // 4. Now the same submission is accepted.
    let accepted = keeper.submit(dup());
    println!("[producer] Dup after export: {accepted:?}");
    assert_eq!(accepted, SubmitOutcome::Accepted);

    keeper.shutdown().await?;
    println!("\n=== example completed successfully ===");
    Ok(())
}
