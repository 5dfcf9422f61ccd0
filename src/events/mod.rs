//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the keeper, the registry,
//! and running tasks.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Keeper` (worker loop, submit path), `Registry`
//!   (queued/removed), `TaskContext` (progress).
//! - **Consumers**: the keeper's subscriber listener (fans out to
//!   `SubscriberSet`) and any receiver obtained from
//!   [`Keeper::subscribe`](crate::Keeper::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
