use std::sync::Arc;

use super::{config::SupervisorConfig, lifecycle::Lifecycle, supervisor::Supervisor};
use crate::{
    events::Bus,
    launcher::{MnexecLauncher, ProcessLauncher},
    locator::{NodeLocator, PgrepLocator},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Supervisor`] with injectable primitives.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    locator: Option<Arc<dyn NodeLocator>>,
    launcher: Option<Arc<dyn ProcessLauncher>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            locator: None,
            launcher: None,
        }
    }

    /// Sets event subscribers for observability.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the default [`PgrepLocator`].
    pub fn with_locator(mut self, locator: Arc<dyn NodeLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Replaces the default [`MnexecLauncher`].
    pub fn with_launcher(mut self, launcher: Arc<dyn ProcessLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Builds the supervisor: bus, subscriber workers, listener and one stopped slot
    /// per configured node.
    ///
    /// Must be called from within a tokio runtime (workers are spawned here).
    pub fn build(self) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let locator = self
            .locator
            .unwrap_or_else(|| Arc::new(PgrepLocator::default()));
        let launcher = self
            .launcher
            .unwrap_or_else(|| Arc::new(MnexecLauncher::default()));
        let lifecycle = Lifecycle::new(locator, launcher, bus.clone());

        Arc::new(Supervisor::new_internal(self.cfg, bus, lifecycle, subs))
    }
}
