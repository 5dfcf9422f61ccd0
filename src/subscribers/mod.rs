//! # Event subscribers for the chorekeeper runtime.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out used to deliver runtime events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Keeper ── publish(Event) ──► Bus ──► keeper listener ──► SubscriberSet::emit
//!                                                                │
//!                                                           ┌────┴────┬────────┐
//!                                                           ▼         ▼        ▼
//!                                                        LogWriter  UI badge  ...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use chorekeeper::{Event, EventKind, Subscribe};
//!
//! struct PendingBadge;
//!
//! #[async_trait]
//! impl Subscribe for PendingBadge {
//!     async fn on_event(&self, event: &Event) {
//!         match event.kind {
//!             EventKind::TaskQueued | EventKind::TaskRemoved => {
//!                 // refresh the "N operations pending" badge
//!             }
//!             _ => {}
//!         }
//!     }
//! }
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
