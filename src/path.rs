//! A [`Route`] bound to one concrete scope and ID: the physical storage key.
//!
//! Two serializations are available:
//!
//! - the fully qualified string (`Display`/`FromStr`): `default/0/a/b/c`,
//!   `websites/2/a/b/c`, `stores/5/a/b/c`;
//! - [`Path::to_bytes`]: a binary key whose byte order matches `Ord` on `Path`
//!   (scope tag, big-endian ID, route bytes), for ordered key-value engines.
//!
//! Both are injective over `(route, scope, id)`.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::route::{Route, SEPARATOR};
use crate::scope::Scope;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path {
    // field order drives the derived Ord; keep it in sync with to_bytes()
    scope: Scope,
    id: i64,
    route: Route,
}

impl Path {
    /// Validate `route` and bind it to `(scope, id)`.
    ///
    /// `Default` ignores `id` and stores 0. `Website` and `Store` need a
    /// positive ID; `Absent` is never a valid binding.
    pub fn new(route: impl AsRef<str>, scope: Scope, id: i64) -> Result<Self> {
        let route = Route::new(route.as_ref())?;
        Path::bind_route(route, scope, id)
    }

    /// Path at `Default` scope.
    pub fn default_scope(route: Route) -> Self {
        Path {
            scope: Scope::Default,
            id: 0,
            route,
        }
    }

    pub fn bind_route(route: Route, scope: Scope, id: i64) -> Result<Self> {
        match scope {
            Scope::Default => Ok(Path::default_scope(route)),
            Scope::Website | Scope::Store if id > 0 => Ok(Path { scope, id, route }),
            _ => Err(Error::InvalidScopeBinding { scope, id }),
        }
    }

    /// Same route, different binding.
    pub fn bind(&self, scope: Scope, id: i64) -> Result<Self> {
        Path::bind_route(self.route.clone(), scope, id)
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Order-preserving binary key.
    pub fn to_bytes(&self) -> Vec<u8> {
        let tag: u8 = match self.scope {
            Scope::Absent => 0,
            Scope::Default => 1,
            Scope::Website => 2,
            Scope::Store => 3,
        };
        let route = self.route.as_str().as_bytes();
        let mut out = Vec::with_capacity(1 + 8 + route.len());
        out.push(tag);
        // id is never negative once bound
        out.extend_from_slice(&(self.id as u64).to_be_bytes());
        out.extend_from_slice(route);
        out
    }

    /// Parse a fully qualified path such as `stores/5/a/b/c`.
    pub fn parse(fq: &str) -> Result<Self> {
        let invalid = || Error::InvalidPath(fq.to_string());
        let mut parts = fq.splitn(3, SEPARATOR);
        let scope = parts
            .next()
            .and_then(Scope::from_fq_segment)
            .ok_or_else(invalid)?;
        let id: i64 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)?;
        let route = parts.next().ok_or_else(invalid)?;
        if scope == Scope::Default && id != 0 {
            return Err(Error::InvalidScopeBinding { scope, id });
        }
        Path::new(route, scope, id)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.scope.fq_segment(),
            self.id,
            self.route
        )
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE: &str = "shipping/origin/country_id";

    #[test]
    fn default_normalizes_id() {
        let p = Path::new(ROUTE, Scope::Default, 42).unwrap();
        assert_eq!(p.id(), 0);
        assert_eq!(p.to_string(), "default/0/shipping/origin/country_id");
    }

    #[test]
    fn website_and_store_need_positive_ids() {
        for (scope, id) in [(Scope::Website, 0), (Scope::Store, 0), (Scope::Store, -3)] {
            let err = Path::new(ROUTE, scope, id).unwrap_err();
            assert!(matches!(err, Error::InvalidScopeBinding { .. }));
        }
    }

    #[test]
    fn absent_is_not_bindable() {
        assert!(Path::new(ROUTE, Scope::Absent, 1).is_err());
    }

    #[test]
    fn invalid_route_checked_first() {
        let err = Path::new("shipping/origin", Scope::Store, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { .. }));
    }

    #[test]
    fn string_round_trip() {
        let p = Path::new(ROUTE, Scope::Store, 5).unwrap();
        let s = p.to_string();
        assert_eq!(s, "stores/5/shipping/origin/country_id");
        let back: Path = s.parse().unwrap();
        assert_eq!(back.route().as_str(), ROUTE);
        assert_eq!(back.scope(), Scope::Store);
        assert_eq!(back.id(), 5);
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in [
            "",
            "stores",
            "stores/x/a/b/c",
            "planets/1/a/b/c",
            "stores/1/a/b",
            "default/3/a/b/c",
        ] {
            assert!(Path::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn distinct_triples_never_collide() {
        let routes = ["a/b/c", "a/b/c1", "a1/b/c"];
        let bindings = [
            (Scope::Default, 0),
            (Scope::Website, 1),
            (Scope::Website, 11),
            (Scope::Store, 1),
            (Scope::Store, 11),
        ];
        let mut strings = std::collections::HashSet::new();
        let mut keys = std::collections::HashSet::new();
        for r in routes {
            for (s, id) in bindings {
                let p = Path::new(r, s, id).unwrap();
                assert!(strings.insert(p.to_string()));
                assert!(keys.insert(p.to_bytes()));
            }
        }
    }

    #[test]
    fn byte_key_order_matches_ord() {
        let mut paths = vec![
            Path::new("z/z/z", Scope::Default, 0).unwrap(),
            Path::new("a/a/a", Scope::Store, 10).unwrap(),
            Path::new("a/a/a", Scope::Store, 9).unwrap(),
            Path::new("b/b/b", Scope::Website, 1).unwrap(),
            Path::new("a/a/a", Scope::Website, 1).unwrap(),
        ];
        paths.sort();
        let keys: Vec<Vec<u8>> = paths.iter().map(Path::to_bytes).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(paths[0].scope(), Scope::Default);
        assert_eq!(paths[4].id(), 10);
    }

    #[test]
    fn bind_keeps_route() {
        let p = Path::new(ROUTE, Scope::Default, 0).unwrap();
        let w = p.bind(Scope::Website, 2).unwrap();
        assert_eq!(w.route(), p.route());
        assert_eq!(w.to_string(), "websites/2/shipping/origin/country_id");
    }
}
