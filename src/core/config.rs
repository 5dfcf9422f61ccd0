//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the keeper runtime.
//!
//! ## Field semantics
//! - `grace`: maximum wait for the worker to finish during
//!   [`Keeper::shutdown`](crate::Keeper::shutdown) (`0s` = don't wait)
//! - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)

use std::time::Duration;

/// Global configuration for the keeper runtime.
///
/// All fields are public for flexibility. Prefer the helper accessors to
/// avoid sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for the in-flight task to yield during shutdown.
    ///
    /// When the keeper closes:
    /// - the queue closes and the in-flight task is asked to cancel
    /// - `shutdown` waits up to `grace` for the worker to exit
    /// - on timeout it returns `RuntimeError::GraceExceeded`
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// will skip older items. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 30s` (reasonable cooperative shutdown window)
    /// - `bus_capacity = 1024` (good baseline)
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
        }
    }
}
