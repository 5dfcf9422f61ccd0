use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::core::policy::{CategoryPolicy, DefaultSettings, SettingsSource};
use crate::core::queue::TaskQueue;
use crate::core::registry::Registry;
use crate::core::watch::ChangeAdapter;
use crate::core::{Config, Keeper};
use crate::events::Bus;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`Keeper`] with its collaborators.
///
/// `build()` wires the bus, subscriber fan-out, queue, registry and policy,
/// then spawns the subscriber listener and the single worker loop. It must
/// therefore run inside a tokio runtime.
pub struct KeeperBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    settings: Arc<dyn SettingsSource>,
    adapter: Option<Arc<dyn ChangeAdapter>>,
}

impl KeeperBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            settings: Arc::new(DefaultSettings),
            adapter: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (lifecycle, progress, registry
    /// notifications) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the external settings store consulted for category enablement.
    ///
    /// Defaults to [`DefaultSettings`] (everything enabled).
    pub fn with_settings(mut self, settings: Arc<dyn SettingsSource>) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the catalog-side adapter that absorbs filesystem changes.
    ///
    /// Without an adapter, [`Keeper::notify_change`] drops every change.
    pub fn with_change_adapter(mut self, adapter: Arc<dyn ChangeAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Builds the keeper and starts its runtime pieces:
    /// the bus→subscribers listener and the worker loop.
    pub fn build(self) -> Arc<Keeper> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers));

        let keeper = Arc::new(Keeper {
            cfg: self.cfg,
            bus: bus.clone(),
            queue: TaskQueue::new(),
            registry: Registry::new(bus.clone()),
            policy: CategoryPolicy::new(self.settings),
            adapter: self.adapter,
            watch_open: AtomicBool::new(true),
            runtime_token: CancellationToken::new(),
            current: Mutex::new(None),
            worker: Mutex::new(None),
        });

        // Bridge the bus into the subscriber fan-out (fire-and-forget).
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            while let Ok(ev) = rx.recv().await {
                subs.emit(&ev);
            }
        });

        let handle = tokio::spawn(Arc::clone(&keeper).worker_loop());
        *keeper.worker.lock().unwrap() = Some(handle);

        keeper
    }
}
