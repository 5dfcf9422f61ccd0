//! # Example: basic_submit
//!
//! Demonstrates the serialized execution guarantee: tasks submitted from one
//! producer run one at a time, in submission order.
//!
//! Shows how to:
//! - Build a [`Keeper`] with the built-in `LogWriter` subscriber
//! - Submit closure-backed tasks with [`TaskFn`]
//! - Report fine-grained progress from a task body
//! - Shut the keeper down gracefully
//!
//! ## Run
//! ```bash
//! cargo run --example basic_submit --features logging
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

    println!("=== basic_submit example ===\n");

    // 1. Configure and build the keeper (spawns the worker loop).
    let mut cfg = Config::default();
    cfg.grace = Duration::from_secs(5);
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let keeper = Keeper::builder(cfg).with_subscribers(subs).build();

    // 2. Watch the event stream directly as well.
    let mut events = keeper.subscribe();

    // 3. Submit three maintenance tasks; they will run strictly in order.
    for name in ["Init", "Dup", "Phantom"] {
        let task = TaskFn::arc(name, move |ctx: TaskContext| async move {
            for step in 1..=4u8 {
                if ctx.is_cancelled() {
                    return Err(TaskError::Canceled);
                }
                ctx.progress(step * 25, "walking the catalog");
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Ok(())
        });
        let outcome = keeper.submit(TaskSpec::new(task));
        assert_eq!(outcome, SubmitOutcome::Accepted);
        println!("[producer] submitted {name}: {outcome:?}");
    }
    println!("[producer] pending operations: {}", keeper.registry().len());

    // 4. Wait until all three report a stop.
    let mut stopped = 0;
    while stopped < 3 {
        let ev = events.recv().await?;
        if ev.is_terminal() {
            println!("[observer] {:?} finished (seq={})", ev.task, ev.seq);
            stopped += 1;
        }
    }
    assert!(keeper.registry().is_empty());

    // 5. Graceful shutdown: queue closes, worker joins.
    keeper.shutdown().await?;
    println!("\n=== example completed successfully ===");
    Ok(())
}
