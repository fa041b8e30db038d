//! Scope-independent setting identifiers of the form `section/group/element`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

pub const SEPARATOR: char = '/';

/// A validated `section/group/element` identifier.
///
/// Exactly two separators, no empty segment, and only ASCII letters, digits
/// and `_`. Equality and ordering are byte-wise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Route(String);

impl Route {
    pub fn new(route: impl Into<String>) -> Result<Self> {
        let route = route.into();
        validate(&route)?;
        Ok(Route(route))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `(section, group, element)`.
    pub fn segments(&self) -> (&str, &str, &str) {
        let mut parts = self.0.splitn(3, SEPARATOR);
        // validated on construction
        let section = parts.next().unwrap_or_default();
        let group = parts.next().unwrap_or_default();
        let element = parts.next().unwrap_or_default();
        (section, group, element)
    }

    /// Join three segments into a route.
    pub fn from_segments(section: &str, group: &str, element: &str) -> Result<Self> {
        Route::new(format!("{section}{SEPARATOR}{group}{SEPARATOR}{element}"))
    }
}

fn validate(route: &str) -> Result<()> {
    let invalid = |reason| Error::InvalidRoute {
        route: route.to_string(),
        reason,
    };

    if route.is_empty() {
        return Err(invalid("empty route"));
    }
    if route.matches(SEPARATOR).count() != 2 {
        return Err(invalid("expected exactly three segments"));
    }
    if route.split(SEPARATOR).any(str::is_empty) {
        return Err(invalid("empty segment"));
    }
    if !route
        .bytes()
        .all(|b| b == b'/' || b == b'_' || b.is_ascii_alphanumeric())
    {
        return Err(invalid("only [A-Za-z0-9_] allowed in segments"));
    }
    Ok(())
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Route {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Route {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Route::new(s)
    }
}

impl TryFrom<&str> for Route {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Route::new(s)
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Route {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Route::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_three_segments() {
        let r = Route::new("shipping/origin/country_id").unwrap();
        assert_eq!(r.segments(), ("shipping", "origin", "country_id"));
        assert_eq!(r.to_string(), "shipping/origin/country_id");
    }

    #[test]
    fn rejects_wrong_segment_count() {
        for bad in ["shipping", "shipping/origin", "a/b/c/d"] {
            let err = Route::new(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidRoute { .. }), "{bad}");
        }
    }

    #[test]
    fn rejects_empty_segments() {
        for bad in ["", "/b/c", "a//c", "a/b/"] {
            assert!(Route::new(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn rejects_foreign_characters() {
        for bad in ["a/b-c/d", "a/b/c d", "a/b/ü", "a/b.c/d"] {
            assert!(Route::new(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn ordering_is_bytewise() {
        let a = Route::new("a/b/C").unwrap();
        let b = Route::new("a/b/c").unwrap();
        assert!(a < b);
    }

    #[test]
    fn from_segments_validates() {
        assert!(Route::from_segments("web", "cookie", "lifetime").is_ok());
        assert!(Route::from_segments("web", "", "lifetime").is_err());
    }

    #[test]
    fn deserializes_with_validation() {
        #[derive(Deserialize)]
        struct Holder {
            route: Route,
        }
        let ok: Holder = toml::from_str(r#"route = "a/b/c""#).unwrap();
        assert_eq!(ok.route.as_str(), "a/b/c");
        assert!(toml::from_str::<Holder>(r#"route = "a/b""#).is_err());
    }
}
