//! Scope-aware configuration for multi-tenant storefronts. Bind a tenant,
//! ask for a setting, get the most specific value it is allowed to have.
//!
//! One deployment serves many *stores*, grouped into *websites*. Every
//! setting has a global *default* and may be overridden per website or per
//! store, but only at the levels its definition permits.
//!
//! ```ignore
//! let svc = Service::new(MemoryStore::from_toml_str(SEED)?)?;
//! let scoped = svc.scoped(website_id, store_id)?;
//! let country = scoped.string("shipping/origin/country_id", None)?;
//! ```
//!
//! # Addressing
//!
//! A [`Route`] names a setting independently of any tenant:
//! `section/group/element`, three non-empty segments of `[A-Za-z0-9_]`.
//! A [`Path`] binds a route to one concrete level and ID and is what backends
//! store values under:
//!
//! | Path | Meaning |
//! |------|---------|
//! | `default/0/shipping/origin/country_id` | global value |
//! | `websites/2/shipping/origin/country_id` | website 2 override |
//! | `stores/9/shipping/origin/country_id` | store 9 override |
//!
//! Callers only ever pass routes. The scoped service builds paths.
//!
//! # Fallback chain
//!
//! ```text
//! Store      stores/{store_id}/route       only if the store level is permitted
//!    ↓ NotFound
//! Website    websites/{website_id}/route   only if the website level is permitted
//!    ↓ NotFound
//! Default    default/0/route               always, result returned verbatim
//! ```
//!
//! Only `NotFound` moves down the chain. Any other error at a store or website
//! level is returned at once: a backend timeout on a store override must not
//! quietly turn into the default value.
//!
//! # Permissions
//!
//! [`ScopePerm`] is the set of levels a route may be overridden at; `Default`
//! is always in it. Lookups take an optional [`Scope`] cap: pass
//! `Some(perm.top())` for a route whose definition stops at website level and
//! store overrides are never read, even when the service is bound to a store.
//! A [`Schema`] loaded from TOML carries permissions and defaults per route,
//! and [`Scoped::field`] applies both.
//!
//! # Backends
//!
//! Anything implementing [`Getter`] can be resolved against; [`Setter`] adds
//! writes. [`MemoryStore`] is the in-process implementation. Backends must keep
//! "nothing stored here" ([`Error::NotFound`]) apart from real failures
//! ([`Error::Backend`]) since the chain branches on it.
//!
//! # Change notification
//!
//! [`Service::subscribe`] registers a receiver for a route. Writes through
//! [`Service::set`] at any level of that route are delivered asynchronously
//! from a dispatcher thread. Treat the payload as a hint and re-resolve.
//!
//! # Settings
//!
//! [`Settings`] tunes the notification registry and loads from defaults, a
//! TOML file and `SCOPECFG_*` environment variables.
//!
//! # Logging
//!
//! The crate emits [`tracing`] events (fallback steps at `trace`,
//! subscriptions at `debug`, receiver failures at `warn`) and installs no
//! subscriber of its own.

pub mod error;
pub mod scope;

mod memory;
mod path;
mod pubsub;
mod route;
mod schema;
mod scoped;
mod service;
mod settings;
mod storage;
mod value;

#[cfg(test)]
mod fixtures;

pub use error::{BackendError, Error, Result};
pub use memory::MemoryStore;
pub use path::Path;
pub use pubsub::{MessageReceiver, PubSub, SubscriptionId};
pub use route::Route;
pub use schema::{Field, Schema};
pub use scope::{Scope, ScopePerm};
pub use scoped::Scoped;
pub use service::{Service, ServiceBuilder};
pub use settings::Settings;
pub use storage::{Getter, Setter, get_as};
pub use value::{FromValue, Value, time_value};
