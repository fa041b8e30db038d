//! Capability traits every storage backend implements.
//!
//! A backend only has to answer [`Getter::get`]: return the raw [`Value`] at
//! an exact [`Path`], [`Error::NotFound`] when nothing is stored there, or a
//! backend error for real failures. The typed getters are provided on top of
//! it and may be overridden by backends with native typed columns.
//!
//! The resolver branches on `NotFound` versus everything else, so a backend
//! must never report an I/O failure as `NotFound`.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::path::Path;
use crate::value::{FromValue, Value};

pub trait Getter: Send + Sync {
    /// Raw value at exactly `path`; no fallback to other scopes.
    fn get(&self, path: &Path) -> Result<Value>;

    fn get_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        get_as(self, path)
    }

    fn get_string(&self, path: &Path) -> Result<String> {
        get_as(self, path)
    }

    fn get_bool(&self, path: &Path) -> Result<bool> {
        get_as(self, path)
    }

    fn get_f64(&self, path: &Path) -> Result<f64> {
        get_as(self, path)
    }

    fn get_int(&self, path: &Path) -> Result<i64> {
        get_as(self, path)
    }

    fn get_time(&self, path: &Path) -> Result<DateTime<Utc>> {
        get_as(self, path)
    }
}

/// Write capability, used by tooling and tests rather than the lookup path.
pub trait Setter: Send + Sync {
    fn set(&self, path: &Path, value: Value) -> Result<()>;
}

/// Fetch the value at `path` and coerce it to `T`.
pub fn get_as<T, G>(getter: &G, path: &Path) -> Result<T>
where
    T: FromValue,
    G: Getter + ?Sized,
{
    let value = getter.get(path)?;
    T::from_value(value).map_err(|reason| Error::InvalidValue {
        path: path.to_string(),
        reason,
    })
}

impl<G: Getter + ?Sized> Getter for &G {
    fn get(&self, path: &Path) -> Result<Value> {
        (**self).get(path)
    }
}

impl<G: Getter + ?Sized> Getter for Arc<G> {
    fn get(&self, path: &Path) -> Result<Value> {
        (**self).get(path)
    }
}

impl<S: Setter + ?Sized> Setter for Arc<S> {
    fn set(&self, path: &Path, value: Value) -> Result<()> {
        (**self).set(path, value)
    }
}
