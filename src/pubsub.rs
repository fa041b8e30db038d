//! Change notification: subscribe to a route, get told when it is written.
//!
//! Writers publish `(Path, Value)` messages into a channel; a single
//! dispatcher thread fans each message out to every receiver registered for
//! the message's route, whatever scope or ID the write targeted. Delivery is
//! asynchronous to the write. The payload is a hint: receivers that care about
//! the effective value re-resolve through a [`Scoped`](crate::Scoped) service.
//!
//! A receiver returning an error is logged and stays subscribed. A receiver
//! that panics is logged and removed.
//!
//! Receivers may write back through [`PubSub::publish`]. Those messages skip
//! the channel and go onto a backlog the dispatcher drains after the current
//! message, so a bounded channel never blocks its only consumer.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::path::Path;
use crate::route::Route;
use crate::value::Value;

/// Callback invoked for writes to a subscribed route.
pub trait MessageReceiver: Send + Sync {
    fn on_change(&self, path: &Path, value: &Value) -> Result<()>;
}

impl<F> MessageReceiver for F
where
    F: Fn(&Path, &Value) -> Result<()> + Send + Sync,
{
    fn on_change(&self, path: &Path, value: &Value) -> Result<()> {
        self(path, value)
    }
}

/// Opaque handle returned by [`PubSub::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Receivers = BTreeMap<SubscriptionId, Arc<dyn MessageReceiver>>;

#[derive(Default)]
struct Registry {
    by_route: HashMap<Route, Receivers>,
    routes: HashMap<SubscriptionId, Route>,
    next_id: u64,
}

impl Registry {
    fn remove(&mut self, id: SubscriptionId) -> Option<Route> {
        let route = self.routes.remove(&id)?;
        if let Some(receivers) = self.by_route.get_mut(&route) {
            receivers.remove(&id);
            if receivers.is_empty() {
                self.by_route.remove(&route);
            }
        }
        Some(route)
    }
}

struct Message {
    path: Path,
    value: Value,
}

/// Subscription registry plus the dispatcher thread that serves it.
pub struct PubSub {
    registry: Arc<RwLock<Registry>>,
    sender: Mutex<Option<flume::Sender<Message>>>,
    backlog: Arc<Mutex<VecDeque<Message>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    dispatcher: ThreadId,
    max_subscriptions: usize,
}

impl PubSub {
    /// Start a registry accepting up to `max_subscriptions` receivers.
    /// `channel_capacity` bounds queued messages; 0 means unbounded.
    pub fn new(max_subscriptions: usize, channel_capacity: usize) -> Result<Self> {
        let (sender, receiver) = if channel_capacity == 0 {
            flume::unbounded()
        } else {
            flume::bounded(channel_capacity)
        };
        let registry = Arc::new(RwLock::new(Registry::default()));
        let backlog = Arc::new(Mutex::new(VecDeque::new()));

        let worker = thread::Builder::new()
            .name("scopecfg-pubsub".into())
            .spawn({
                let registry = Arc::clone(&registry);
                let backlog = Arc::clone(&backlog);
                move || dispatch(&registry, &receiver, &backlog)
            })
            .map_err(|e| Error::IoError {
                path: "<pubsub worker>".into(),
                source: e,
            })?;

        Ok(PubSub {
            registry,
            sender: Mutex::new(Some(sender)),
            backlog,
            dispatcher: worker.thread().id(),
            worker: Mutex::new(Some(worker)),
            max_subscriptions,
        })
    }

    /// Register `receiver` for writes to `route` at any scope.
    pub fn subscribe(
        &self,
        route: impl AsRef<str>,
        receiver: impl MessageReceiver + 'static,
    ) -> Result<SubscriptionId> {
        let route = Route::new(route.as_ref())?;
        let mut reg = self.registry.write();
        if reg.routes.len() >= self.max_subscriptions {
            return Err(Error::ResourceExhausted {
                limit: self.max_subscriptions,
            });
        }
        reg.next_id += 1;
        let id = SubscriptionId(reg.next_id);
        reg.by_route
            .entry(route.clone())
            .or_default()
            .insert(id, Arc::new(receiver));
        reg.routes.insert(id, route.clone());
        debug!(%route, %id, "subscribed");
        Ok(id)
    }

    /// Remove a subscription. Unknown IDs are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        if let Some(route) = self.registry.write().remove(id) {
            debug!(%route, %id, "unsubscribed");
        }
    }

    pub fn len(&self) -> usize {
        self.registry.read().routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queue a notification for `path`. Returns once the message is queued,
    /// not once it is delivered.
    pub fn publish(&self, path: &Path, value: &Value) -> Result<()> {
        let sender = self.sender.lock().clone().ok_or(Error::Closed)?;
        if !self.registry.read().by_route.contains_key(path.route()) {
            return Ok(());
        }
        let msg = Message {
            path: path.clone(),
            value: value.clone(),
        };
        if thread::current().id() == self.dispatcher {
            self.backlog.lock().push_back(msg);
            return Ok(());
        }
        sender.send(msg).map_err(|_| Error::Closed)
    }

    /// Stop accepting messages, deliver everything already queued, and join
    /// the dispatcher. Calling it again is a no-op.
    pub fn close(&self) {
        drop(self.sender.lock().take());
        if thread::current().id() == self.dispatcher {
            return;
        }
        if let Some(worker) = self.worker.lock().take()
            && worker.join().is_err()
        {
            warn!("pubsub dispatcher panicked");
        }
    }
}

impl Drop for PubSub {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for PubSub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PubSub")
            .field("subscriptions", &self.len())
            .field("max_subscriptions", &self.max_subscriptions)
            .finish()
    }
}

fn dispatch(
    registry: &RwLock<Registry>,
    receiver: &flume::Receiver<Message>,
    backlog: &Mutex<VecDeque<Message>>,
) {
    for msg in receiver.iter() {
        deliver(registry, &msg);
        loop {
            let Some(next) = backlog.lock().pop_front() else {
                break;
            };
            deliver(registry, &next);
        }
    }
    debug!("pubsub dispatcher stopped");
}

fn deliver(registry: &RwLock<Registry>, msg: &Message) {
    let targets: Vec<(SubscriptionId, Arc<dyn MessageReceiver>)> = registry
        .read()
        .by_route
        .get(msg.path.route())
        .map(|r| r.iter().map(|(id, rx)| (*id, Arc::clone(rx))).collect())
        .unwrap_or_default();

    for (id, target) in targets {
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| target.on_change(&msg.path, &msg.value)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(path = %msg.path, %id, %err, "receiver failed"),
            Err(_) => {
                warn!(path = %msg.path, %id, "receiver panicked, unsubscribing");
                registry.write().remove(id);
            }
        }
    }
}
