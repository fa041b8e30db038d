//! In-process backend: a path-ordered map behind a reader/writer lock.
//!
//! Used by tests and by small deployments that load their values once at
//! startup. Reads of a single path are linearizable with writes to that path;
//! nothing is held across calls.
//!
//! A store can be seeded from a TOML document laid out by scope:
//!
//! ```toml
//! [default.shipping.origin]
//! country_id = "US"
//!
//! [websites.2.shipping.origin]
//! country_id = "DE"
//!
//! [stores.9.shipping.origin]
//! postcode = "10115"
//! ```

use std::collections::BTreeMap;

use parking_lot::RwLock;
use toml::Table;

use crate::error::{Error, Result};
use crate::path::Path;
use crate::route::Route;
use crate::scope::Scope;
use crate::storage::{Getter, Setter};
use crate::value::Value;

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<BTreeMap<Path, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from fully qualified path strings, e.g. `("stores/5/a/b/c", 1.into())`.
    pub fn with_values<K, I>(pairs: I) -> Result<Self>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let store = Self::new();
        {
            let mut values = store.values.write();
            for (fq, value) in pairs {
                values.insert(Path::parse(fq.as_ref())?, value);
            }
        }
        Ok(store)
    }

    /// Seed from a scope-keyed TOML document (see the module docs).
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: Table = content.parse().map_err(|e| Error::ParseError {
            path: "<inline>".into(),
            source: e,
        })?;
        let store = Self::new();
        {
            let mut values = store.values.write();
            for (path, value) in table_to_paths(table)? {
                values.insert(path, value);
            }
        }
        Ok(store)
    }

    pub fn remove(&self, path: &Path) -> Option<Value> {
        self.values.write().remove(path)
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// All stored paths in key order.
    pub fn paths(&self) -> Vec<Path> {
        self.values.read().keys().cloned().collect()
    }
}

impl Getter for MemoryStore {
    fn get(&self, path: &Path) -> Result<Value> {
        self.values
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }
}

impl Setter for MemoryStore {
    fn set(&self, path: &Path, value: Value) -> Result<()> {
        self.values.write().insert(path.clone(), value);
        Ok(())
    }
}

fn table_to_paths(table: Table) -> Result<Vec<(Path, Value)>> {
    let mut out = Vec::new();
    for (scope_key, scoped) in table {
        let scope = Scope::from_fq_segment(&scope_key)
            .ok_or_else(|| Error::InvalidPath(scope_key.clone()))?;
        let scoped = expect_table(scoped, &scope_key)?;

        if scope == Scope::Default {
            collect_routes(scoped, Scope::Default, 0, &mut out)?;
            continue;
        }
        for (id_key, sections) in scoped {
            let fq = format!("{scope_key}/{id_key}");
            let id: i64 = id_key.parse().map_err(|_| Error::InvalidPath(fq.clone()))?;
            collect_routes(expect_table(sections, &fq)?, scope, id, &mut out)?;
        }
    }
    Ok(out)
}

fn collect_routes(
    sections: Table,
    scope: Scope,
    id: i64,
    out: &mut Vec<(Path, Value)>,
) -> Result<()> {
    for (section, groups) in sections {
        for (group, elements) in expect_table(groups, &section)? {
            for (element, value) in expect_table(elements, &format!("{section}/{group}"))? {
                let route = Route::from_segments(&section, &group, &element)?;
                out.push((Path::bind_route(route, scope, id)?, value));
            }
        }
    }
    Ok(())
}

fn expect_table(value: Value, at: &str) -> Result<Table> {
    match value {
        Value::Table(t) => Ok(t),
        other => Err(Error::InvalidValue {
            path: at.to_string(),
            reason: format!("expected a table, found {}", other.type_str()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::path;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn set_then_get() {
        let store = MemoryStore::new();
        let p = path("stores/3/web/cookie/lifetime");
        store.set(&p, Value::Integer(3600)).unwrap();
        assert_eq!(store.get(&p).unwrap(), Value::Integer(3600));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn scopes_are_separate_keys() {
        let store = MemoryStore::new();
        store
            .set(&path("stores/3/a/b/c"), Value::from("store"))
            .unwrap();
        assert!(store.get(&path("stores/4/a/b/c")).unwrap_err().is_not_found());
        assert!(store.get(&path("default/0/a/b/c")).unwrap_err().is_not_found());
    }

    #[test]
    fn remove_returns_old_value() {
        let store = MemoryStore::with_values([("default/0/a/b/c", Value::Integer(1))]).unwrap();
        assert_eq!(store.remove(&path("default/0/a/b/c")), Some(Value::Integer(1)));
        assert!(store.is_empty());
    }

    #[test]
    fn with_values_rejects_bad_paths() {
        let err = MemoryStore::with_values([("nowhere/1/a/b/c", Value::Integer(1))]).unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[test]
    fn seeds_from_toml() {
        let store = MemoryStore::from_toml_str(
            r#"
            [default.shipping.origin]
            country_id = "US"
            region_id = 12

            [websites.2.shipping.origin]
            country_id = "DE"

            [stores.9.shipping.origin]
            postcode = "10115"
            "#,
        )
        .unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(
            store.get(&path("websites/2/shipping/origin/country_id")).unwrap(),
            Value::from("DE")
        );
        assert_eq!(
            store.get(&path("default/0/shipping/origin/region_id")).unwrap(),
            Value::Integer(12)
        );
    }

    #[test]
    fn toml_seed_rejects_unknown_scope_and_zero_ids() {
        assert!(MemoryStore::from_toml_str("[planets.1.a.b]\nc = 1\n").is_err());
        let err = MemoryStore::from_toml_str("[stores.0.a.b]\nc = 1\n").unwrap_err();
        assert!(matches!(err, Error::InvalidScopeBinding { .. }));
    }

    #[test]
    fn paths_are_key_ordered() {
        let store = MemoryStore::with_values([
            ("stores/1/a/b/c", Value::Integer(3)),
            ("default/0/a/b/c", Value::Integer(1)),
            ("websites/1/a/b/c", Value::Integer(2)),
        ])
        .unwrap();
        let scopes: Vec<Scope> = store.paths().iter().map(Path::scope).collect();
        assert_eq!(scopes, vec![Scope::Default, Scope::Website, Scope::Store]);
    }

    #[test]
    fn concurrent_readers_and_writers() {
        let store = Arc::new(MemoryStore::new());
        let p = path("default/0/a/b/c");
        store.set(&p, Value::Integer(0)).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let p = p.clone();
                thread::spawn(move || {
                    for n in 0..200 {
                        if i % 2 == 0 {
                            store.set(&p, Value::Integer(n)).unwrap();
                        } else {
                            assert!(store.get_int(&p).is_ok());
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(store.get_int(&p).unwrap() >= 0);
    }
}
