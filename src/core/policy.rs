//! # Per-category admission policy.
//!
//! Whether a submission is accepted is decided **once, at submit time**, by
//! two independent sources merged with logical AND:
//!
//! - the external settings store, queried as `"<Category>IsEnabled"` with a
//!   default of enabled when unset (persistent, user-facing);
//! - the in-memory suppression set, toggled by the keeper itself around
//!   operations that must not interleave (temporary).
//!
//! ## Invariants
//! - `allows(c)` = settings say enabled AND `c` is not suppressed.
//! - Suppression mutations and the submit-time check share one lock, so a
//!   racing suppress/submit resolves to strictly before-or-after, never torn.
//! - Tasks already queued are not re-evaluated when either source changes.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// External key-value settings store consulted for category enablement.
///
/// Queried with keys of the form `"<Category>IsEnabled"` (e.g.
/// `"DupIsEnabled"`). `None` means the key is unset; unset categories default
/// to enabled.
pub trait SettingsSource: Send + Sync + 'static {
    fn lookup(&self, key: &str) -> Option<bool>;
}

/// Settings source with nothing configured: every category is enabled.
#[derive(Default)]
pub struct DefaultSettings;

impl SettingsSource for DefaultSettings {
    fn lookup(&self, _key: &str) -> Option<bool> {
        None
    }
}

pub(crate) struct CategoryPolicy {
    settings: Arc<dyn SettingsSource>,
    suppressed: Mutex<HashSet<String>>,
}

impl CategoryPolicy {
    pub(crate) fn new(settings: Arc<dyn SettingsSource>) -> Self {
        Self {
            settings,
            suppressed: Mutex::new(HashSet::new()),
        }
    }

    /// The submit-time check: settings AND not-suppressed.
    pub(crate) fn allows(&self, category: &str) -> bool {
        let suppressed = self.suppressed.lock().unwrap();
        if suppressed.contains(category) {
            return false;
        }
        self.settings
            .lookup(&format!("{category}IsEnabled"))
            .unwrap_or(true)
    }

    /// Adds categories to the suppression set.
    pub(crate) fn suppress<I, S>(&self, categories: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut suppressed = self.suppressed.lock().unwrap();
        for c in categories {
            suppressed.insert(c.into());
        }
    }

    /// Removes categories from the suppression set.
    pub(crate) fn unsuppress<I, S>(&self, categories: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut suppressed = self.suppressed.lock().unwrap();
        for c in categories {
            suppressed.remove(&c.into());
        }
    }

    /// Drops all suppression state (shutdown path).
    pub(crate) fn clear_suppressed(&self) {
        self.suppressed.lock().unwrap().clear();
    }
}
