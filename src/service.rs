use tracing::debug;

use crate::error::Result;
use crate::path::Path;
use crate::pubsub::{MessageReceiver, PubSub, SubscriptionId};
use crate::scoped::Scoped;
use crate::settings::Settings;
use crate::storage::{Getter, Setter};
use crate::value::Value;

/// A backend plus the change notification registry that watches it.
///
/// Hands out per-tenant [`Scoped`] views for reads; writes through
/// [`set`](Self::set) are stored first and published second.
#[derive(Debug)]
pub struct Service<S> {
    backend: S,
    pubsub: PubSub,
}

impl<S: Getter + Setter> Service<S> {
    pub fn builder(backend: S) -> ServiceBuilder<S> {
        ServiceBuilder::new(backend)
    }

    /// Service with default [`Settings`].
    pub fn new(backend: S) -> Result<Self> {
        Self::builder(backend).build()
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Tenant-bound view; see [`Scoped::new`] for the identity rules.
    pub fn scoped(&self, website_id: i64, store_id: i64) -> Result<Scoped<'_, S>> {
        Scoped::new(&self.backend, website_id, store_id)
    }

    /// Raw value at exactly `path`.
    pub fn get(&self, path: &Path) -> Result<Value> {
        self.backend.get(path)
    }

    /// Store `value` at `path`, then notify the route's subscribers.
    pub fn set(&self, path: &Path, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.backend.set(path, value.clone())?;
        debug!(%path, "value written");
        self.pubsub.publish(path, &value)
    }

    pub fn subscribe(
        &self,
        route: impl AsRef<str>,
        receiver: impl MessageReceiver + 'static,
    ) -> Result<SubscriptionId> {
        self.pubsub.subscribe(route, receiver)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.pubsub.unsubscribe(id)
    }

    /// Deliver pending notifications and stop the dispatcher.
    pub fn close(&self) {
        self.pubsub.close()
    }
}

/// Builder for a [`Service`].
pub struct ServiceBuilder<S> {
    backend: S,
    settings: Settings,
}

impl<S: Getter + Setter> ServiceBuilder<S> {
    fn new(backend: S) -> Self {
        ServiceBuilder {
            backend,
            settings: Settings::default(),
        }
    }

    /// Replace all settings, e.g. from [`Settings::load`].
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn max_subscriptions(mut self, max: usize) -> Self {
        self.settings.max_subscriptions = max;
        self
    }

    /// Queued notifications before writers block; 0 means unbounded.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.settings.channel_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<Service<S>> {
        let pubsub = PubSub::new(
            self.settings.max_subscriptions,
            self.settings.channel_capacity,
        )?;
        Ok(Service {
            backend: self.backend,
            pubsub,
        })
    }
}
