//! Tenant-bound lookups with the Store → Website → Default fallback chain.
//!
//! A [`Scoped`] is created once the tenant of a request is known and is
//! thrown away with the request. It holds the two tenant IDs, the scope they
//! imply, and a shared reference to the backend; it has no other state, so
//! any number of them can run concurrently against one backend.
//!
//! Every typed lookup follows the same chain:
//!
//! 1. Build the Default path (a malformed route fails here, before any I/O).
//! 2. If the store level is permitted, read the Store path. Anything other
//!    than `NotFound` (a value or a real error) is returned as is.
//! 3. If the website level is permitted, read the Website path, same rule.
//! 4. Read the Default path and return its result verbatim.
//!
//! Permission is evaluated against the service's own scope, or against the
//! `scope` argument when one above [`Scope::Absent`] is passed. The argument
//! never changes which IDs are used, so it can only remove levels.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::error::{Error, Result};
use crate::path::Path;
use crate::route::Route;
use crate::schema::Field;
use crate::scope::{Scope, ScopePerm};
use crate::storage::Getter;
use crate::value::{FromValue, Value};

pub struct Scoped<'a, G: Getter + ?Sized> {
    root: &'a G,
    scope: Scope,
    website_id: i64,
    store_id: i64,
}

impl<G: Getter + ?Sized> Clone for Scoped<'_, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: Getter + ?Sized> Copy for Scoped<'_, G> {}

impl<G: Getter + ?Sized> fmt::Debug for Scoped<'_, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scoped")
            .field("scope", &self.scope)
            .field("website_id", &self.website_id)
            .field("store_id", &self.store_id)
            .finish()
    }
}

impl<'a, G: Getter + ?Sized> Scoped<'a, G> {
    /// Bind `root` to a tenant. `store_id = 0` means website scope,
    /// both 0 means default scope.
    ///
    /// Negative IDs, and a store without its website, are rejected with
    /// [`Error::InvalidScopeBinding`].
    pub fn new(root: &'a G, website_id: i64, store_id: i64) -> Result<Self> {
        if website_id < 0 {
            return Err(Error::InvalidScopeBinding {
                scope: Scope::Website,
                id: website_id,
            });
        }
        if store_id < 0 || (store_id > 0 && website_id == 0) {
            return Err(Error::InvalidScopeBinding {
                scope: Scope::Store,
                id: store_id,
            });
        }
        let scope = if store_id > 0 {
            Scope::Store
        } else if website_id > 0 {
            Scope::Website
        } else {
            Scope::Default
        };
        Ok(Scoped {
            root,
            scope,
            website_id,
            store_id,
        })
    }

    /// The bound scope and its ID.
    pub fn scope(&self) -> (Scope, i64) {
        match self.scope {
            Scope::Store => (Scope::Store, self.store_id),
            Scope::Website => (Scope::Website, self.website_id),
            _ => (Scope::Default, 0),
        }
    }

    /// The next broader scope: a store's website, otherwise default.
    pub fn parent(&self) -> (Scope, i64) {
        if self.store_id > 0 {
            (Scope::Website, self.website_id)
        } else {
            (Scope::Default, 0)
        }
    }

    pub fn website_id(&self) -> i64 {
        self.website_id
    }

    pub fn store_id(&self) -> i64 {
        self.store_id
    }

    pub fn bytes(&self, route: impl AsRef<str>, scope: Option<Scope>) -> Result<Vec<u8>> {
        self.resolve(route.as_ref(), self.effective_perm(scope), |g, p| g.get_bytes(p))
    }

    pub fn string(&self, route: impl AsRef<str>, scope: Option<Scope>) -> Result<String> {
        self.resolve(route.as_ref(), self.effective_perm(scope), |g, p| g.get_string(p))
    }

    pub fn bool(&self, route: impl AsRef<str>, scope: Option<Scope>) -> Result<bool> {
        self.resolve(route.as_ref(), self.effective_perm(scope), |g, p| g.get_bool(p))
    }

    pub fn f64(&self, route: impl AsRef<str>, scope: Option<Scope>) -> Result<f64> {
        self.resolve(route.as_ref(), self.effective_perm(scope), |g, p| g.get_f64(p))
    }

    pub fn int(&self, route: impl AsRef<str>, scope: Option<Scope>) -> Result<i64> {
        self.resolve(route.as_ref(), self.effective_perm(scope), |g, p| g.get_int(p))
    }

    pub fn time(&self, route: impl AsRef<str>, scope: Option<Scope>) -> Result<DateTime<Utc>> {
        self.resolve(route.as_ref(), self.effective_perm(scope), |g, p| g.get_time(p))
    }

    /// Raw value, uncoerced.
    pub fn value(&self, route: impl AsRef<str>, scope: Option<Scope>) -> Result<Value> {
        self.resolve(route.as_ref(), self.effective_perm(scope), |g, p| g.get(p))
    }

    /// Resolve a schema field: only levels its permission names are read, and
    /// its default is returned when none of them holds a value.
    pub fn field(&self, field: &Field) -> Result<Value> {
        let perm = self.effective_perm(None).intersect(field.perm);
        match self.resolve(field.route.as_str(), perm, |g, p| g.get(p)) {
            Err(Error::NotFound(path)) => field.default.clone().ok_or(Error::NotFound(path)),
            other => other,
        }
    }

    /// [`field`](Self::field), coerced to `T`.
    pub fn field_as<T: FromValue>(&self, field: &Field) -> Result<T> {
        let value = self.field(field)?;
        T::from_value(value).map_err(|reason| Error::InvalidValue {
            path: field.route.to_string(),
            reason,
        })
    }

    fn effective_perm(&self, over: Option<Scope>) -> ScopePerm {
        let scope = match over {
            Some(s) if s > Scope::Absent => s,
            _ => self.scope,
        };
        ScopePerm::up_to(scope)
    }

    fn resolve<T>(
        &self,
        route: &str,
        perm: ScopePerm,
        get: impl Fn(&G, &Path) -> Result<T>,
    ) -> Result<T> {
        let default = Path::default_scope(Route::new(route)?);

        if perm.allows_store(self.store_id) {
            let path = default.bind(Scope::Store, self.store_id)?;
            match get(self.root, &path) {
                Err(err) if err.is_not_found() => trace!(%path, "not found, falling back"),
                found => return found,
            }
        }
        if perm.allows_website(self.website_id) {
            let path = default.bind(Scope::Website, self.website_id)?;
            match get(self.root, &path) {
                Err(err) if err.is_not_found() => trace!(%path, "not found, falling back"),
                found => return found,
            }
        }
        trace!(path = %default, "reading default scope");
        get(self.root, &default)
    }
}
