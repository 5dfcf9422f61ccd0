//! # Blocking FIFO between producers and the single worker.
//!
//! [`TaskQueue`] is the hand-off point of the whole scheduler: many producers
//! append with [`enqueue`](TaskQueue::enqueue); exactly one consumer loop pops
//! with [`dequeue`](TaskQueue::dequeue), suspending while the queue is empty.
//!
//! ## Rules
//! - Insertion order is consumption order (strict FIFO, no priorities).
//! - `enqueue` wakes one suspended consumer; once closed it is a silent no-op.
//! - `close` is idempotent. Items already queued are still drained in order;
//!   only after the queue is **both** closed and empty does `dequeue` yield
//!   [`QueueClosed`] — the consumer loop's sole exit signal, then and forever.
//! - `len` is a diagnostics snapshot; control flow relies on the blocking
//!   semantics of `dequeue`, never on observed counts.
//!
//! ## Locking
//! All state lives under one `std::sync::Mutex`, never held across an await.
//! Suspension uses [`tokio::sync::Notify`]: the consumer registers interest
//! (`notified()`) *before* re-checking state, so a wakeup between the check
//! and the await is stored as a permit and cannot be lost. `close` stores an
//! extra permit for a consumer that has not registered yet — the design
//! assumes a single consumer, which is all the worker model needs.

use std::collections::VecDeque;
use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::Notify;

/// Terminal signal: the queue is closed and fully drained.
///
/// Not a failure — the consumer loop exits cleanly on it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("task queue closed")]
pub struct QueueClosed;

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Thread-safe blocking FIFO with a terminal closed state.
pub struct TaskQueue<T> {
    inner: Mutex<Inner<T>>,
    notify: Notify,
}

impl<T> TaskQueue<T> {
    /// Creates an empty, open queue.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Appends an item to the tail and wakes one suspended consumer.
    ///
    /// Returns `false` once the queue is closed; the item is dropped.
    pub fn enqueue(&self, item: T) -> bool {
        {
            let mut q = self.inner.lock().unwrap();
            if q.closed {
                return false;
            }
            q.items.push_back(item);
        }
        self.notify.notify_one();
        true
    }

    /// Removes and returns the head, suspending while the queue is empty and
    /// open.
    ///
    /// After [`close`](TaskQueue::close), remaining items are still returned
    /// in order; once drained, every call yields `Err(QueueClosed)`.
    pub async fn dequeue(&self) -> Result<T, QueueClosed> {
        loop {
            // Register before the check: a permit stored by a concurrent
            // enqueue/close completes the first poll of `notified`.
            let notified = self.notify.notified();
            {
                let mut q = self.inner.lock().unwrap();
                if let Some(item) = q.items.pop_front() {
                    return Ok(item);
                }
                if q.closed {
                    return Err(QueueClosed);
                }
            }
            notified.await;
        }
    }

    /// Closes the queue and wakes every waiter.
    ///
    /// Idempotent. Returns `true` on the call that actually transitioned the
    /// queue to closed.
    pub fn close(&self) -> bool {
        {
            let mut q = self.inner.lock().unwrap();
            if q.closed {
                return false;
            }
            q.closed = true;
        }
        self.notify.notify_waiters();
        // A consumer between its state check and first poll is not yet a
        // waiter; the stored permit catches it.
        self.notify.notify_one();
        true
    }

    /// True once [`close`](TaskQueue::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }

    /// Snapshot of the number of pending items. Diagnostics only.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }

    /// True when no items are pending. Diagnostics only.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn fifo_order_single_producer() {
        let q = TaskQueue::new();
        for i in 0..10u32 {
            assert!(q.enqueue(i));
        }
        for i in 0..10u32 {
            assert_eq!(q.dequeue().await, Ok(i));
        }
    }

    #[tokio::test]
    async fn fifo_per_producer_across_concurrent_producers() {
        let q = Arc::new(TaskQueue::new());

        let mut handles = Vec::new();
        for producer in 0..4u32 {
            let q = Arc::clone(&q);
            handles.push(tokio::spawn(async move {
                for i in 0..25u32 {
                    assert!(q.enqueue((producer, i)));
                    tokio::task::yield_now().await;
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let mut last = [None::<u32>; 4];
        for _ in 0..100 {
            let (producer, i) = q.dequeue().await.unwrap();
            if let Some(prev) = last[producer as usize] {
                assert!(i > prev, "producer {producer} reordered: {prev} then {i}");
            }
            last[producer as usize] = Some(i);
        }
        assert_eq!(last, [Some(24); 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn dequeue_suspends_until_enqueue() {
        let q = Arc::new(TaskQueue::new());

        // Empty + open: nothing to return, the future must stay pending.
        let pending = tokio::time::timeout(Duration::from_millis(50), q.dequeue()).await;
        assert!(pending.is_err(), "dequeue returned on an empty open queue");

        let consumer = {
            let q = Arc::clone(&q);
            tokio::spawn(async move { q.dequeue().await })
        };
        tokio::task::yield_now().await;

        assert!(q.enqueue(7u32));
        assert_eq!(consumer.await.unwrap(), Ok(7));
    }

    #[tokio::test]
    async fn close_drains_in_order_then_signals_closed() {
        let q = TaskQueue::new();
        for i in 0..3u32 {
            q.enqueue(i);
        }
        assert!(q.close());

        for i in 0..3u32 {
            assert_eq!(q.dequeue().await, Ok(i));
        }
        assert_eq!(q.dequeue().await, Err(QueueClosed));
        assert_eq!(q.dequeue().await, Err(QueueClosed));
    }

    #[tokio::test]
    async fn close_wakes_suspended_consumer() {
        let q = Arc::new(TaskQueue::<u32>::new());
        let consumer = {
            let q = Arc::clone(&q);
            tokio::spawn(async move { q.dequeue().await })
        };
        tokio::task::yield_now().await;

        q.close();
        assert_eq!(consumer.await.unwrap(), Err(QueueClosed));
    }

    #[tokio::test]
    async fn enqueue_after_close_is_dropped() {
        let q = TaskQueue::new();
        assert!(q.close());
        assert!(!q.close(), "close must be idempotent");

        assert!(!q.enqueue(1u32));
        assert_eq!(q.len(), 0);
        assert_eq!(q.dequeue().await, Err(QueueClosed));
    }

    #[tokio::test]
    async fn len_reflects_pending_items() {
        let q = TaskQueue::new();
        assert!(q.is_empty());
        q.enqueue(1u32);
        q.enqueue(2u32);
        assert_eq!(q.len(), 2);
        let _ = q.dequeue().await;
        assert_eq!(q.len(), 1);
    }
}
