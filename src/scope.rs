//! Tenant levels and the per-route permission bitmask.
//!
//! A [`Scope`] names how specific an override is: `Default` applies to every
//! tenant, `Website` to a group of stores, `Store` to a single storefront.
//! [`ScopePerm`] restricts which of those levels may hold an override for a
//! route. `Default` is always part of a permission set, so every fallback
//! chain ends somewhere resolvable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Tenant level, ordered `Absent < Default < Website < Store`.
///
/// `Absent` is a sentinel for "no override requested" and never appears in a
/// stored [`Path`](crate::Path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Absent,
    Default,
    Website,
    Store,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Absent => "absent",
            Scope::Default => "default",
            Scope::Website => "website",
            Scope::Store => "store",
        }
    }

    /// Plural form used as the first segment of a fully qualified path.
    pub(crate) fn fq_segment(self) -> &'static str {
        match self {
            Scope::Absent => "absent",
            Scope::Default => "default",
            Scope::Website => "websites",
            Scope::Store => "stores",
        }
    }

    pub(crate) fn from_fq_segment(s: &str) -> Option<Scope> {
        match s {
            "default" => Some(Scope::Default),
            "websites" => Some(Scope::Website),
            "stores" => Some(Scope::Store),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Scope::Absent => 0,
            Scope::Default => 1,
            Scope::Website => 1 << 1,
            Scope::Store => 1 << 2,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Scope::Default),
            "website" | "websites" => Ok(Scope::Website),
            "store" | "stores" => Ok(Scope::Store),
            "absent" => Ok(Scope::Absent),
            other => Err(format!("unknown scope '{other}'")),
        }
    }
}

/// Set of scopes permitted to hold an override for a route.
///
/// Serializes as a list of scope names, e.g. `["default", "website"]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopePerm(u8);

impl ScopePerm {
    /// Permission containing `scopes`. `Default` is always added.
    pub fn new(scopes: &[Scope]) -> Self {
        scopes
            .iter()
            .fold(Self::default_only(), |perm, &s| perm.with(s))
    }

    pub fn default_only() -> Self {
        ScopePerm(Scope::Default.bit())
    }

    pub fn all() -> Self {
        Self::new(&[Scope::Website, Scope::Store])
    }

    /// Every level from `Default` up to and including `scope`.
    pub fn up_to(scope: Scope) -> Self {
        match scope {
            Scope::Absent | Scope::Default => Self::default_only(),
            Scope::Website => Self::new(&[Scope::Website]),
            Scope::Store => Self::all(),
        }
    }

    pub fn with(self, scope: Scope) -> Self {
        ScopePerm(self.0 | scope.bit())
    }

    /// Levels present in both sets.
    pub fn intersect(self, other: ScopePerm) -> Self {
        ScopePerm((self.0 & other.0) | Scope::Default.bit())
    }

    pub fn has(self, scope: Scope) -> bool {
        let bit = scope.bit();
        bit != 0 && self.0 & bit == bit
    }

    /// The most specific permitted level.
    pub fn top(self) -> Scope {
        if self.has(Scope::Store) {
            Scope::Store
        } else if self.has(Scope::Website) {
            Scope::Website
        } else {
            Scope::Default
        }
    }

    pub fn allows_store(self, store_id: i64) -> bool {
        store_id > 0 && self.has(Scope::Store)
    }

    pub fn allows_website(self, website_id: i64) -> bool {
        website_id > 0 && self.has(Scope::Website)
    }

    /// Permitted scopes, least specific first.
    pub fn scopes(self) -> Vec<Scope> {
        [Scope::Default, Scope::Website, Scope::Store]
            .into_iter()
            .filter(|s| self.has(*s))
            .collect()
    }
}

impl Default for ScopePerm {
    fn default() -> Self {
        Self::default_only()
    }
}

impl fmt::Debug for ScopePerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.scopes()).finish()
    }
}

impl fmt::Display for ScopePerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.scopes().into_iter().map(Scope::as_str).collect();
        write!(f, "{}", names.join(","))
    }
}

impl Serialize for ScopePerm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.scopes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ScopePerm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let scopes = Vec::<Scope>::deserialize(deserializer)?;
        Ok(ScopePerm::new(&scopes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_are_ordered() {
        assert!(Scope::Absent < Scope::Default);
        assert!(Scope::Default < Scope::Website);
        assert!(Scope::Website < Scope::Store);
    }

    #[test]
    fn default_is_always_permitted() {
        assert!(ScopePerm::new(&[]).has(Scope::Default));
        assert!(ScopePerm::new(&[Scope::Store]).has(Scope::Default));
    }

    #[test]
    fn absent_is_never_a_member() {
        assert!(!ScopePerm::all().has(Scope::Absent));
    }

    #[test]
    fn allows_store_needs_bit_and_id() {
        let perm = ScopePerm::all();
        assert!(perm.allows_store(3));
        assert!(!perm.allows_store(0));
        assert!(!ScopePerm::new(&[Scope::Website]).allows_store(3));
    }

    #[test]
    fn allows_website_needs_bit_and_id() {
        let perm = ScopePerm::new(&[Scope::Website]);
        assert!(perm.allows_website(2));
        assert!(!perm.allows_website(-1));
        assert!(!ScopePerm::default_only().allows_website(2));
    }

    #[test]
    fn up_to_includes_lower_levels() {
        assert_eq!(ScopePerm::up_to(Scope::Store), ScopePerm::all());
        assert_eq!(
            ScopePerm::up_to(Scope::Website).scopes(),
            vec![Scope::Default, Scope::Website]
        );
        assert_eq!(ScopePerm::up_to(Scope::Absent), ScopePerm::default_only());
    }

    #[test]
    fn intersect_keeps_gaps() {
        let perm = ScopePerm::up_to(Scope::Store).intersect(ScopePerm::new(&[Scope::Store]));
        assert_eq!(perm.scopes(), vec![Scope::Default, Scope::Store]);
        assert!(!perm.has(Scope::Website));
        let capped = ScopePerm::up_to(Scope::Website).intersect(ScopePerm::new(&[Scope::Store]));
        assert_eq!(capped, ScopePerm::default_only());
    }

    #[test]
    fn top_is_most_specific() {
        assert_eq!(ScopePerm::all().top(), Scope::Store);
        assert_eq!(ScopePerm::new(&[Scope::Website]).top(), Scope::Website);
        assert_eq!(ScopePerm::default_only().top(), Scope::Default);
    }

    #[test]
    fn parses_singular_and_plural_names() {
        assert_eq!("stores".parse::<Scope>().unwrap(), Scope::Store);
        assert_eq!("Website".parse::<Scope>().unwrap(), Scope::Website);
        assert!("galaxy".parse::<Scope>().is_err());
    }

    #[test]
    fn perm_deserializes_from_list() {
        #[derive(Deserialize)]
        struct Field {
            scope: ScopePerm,
        }
        let f: Field = toml::from_str(r#"scope = ["website"]"#).unwrap();
        assert_eq!(f.scope.scopes(), vec![Scope::Default, Scope::Website]);
    }

    #[test]
    fn perm_displays_names() {
        assert_eq!(ScopePerm::all().to_string(), "default,website,store");
    }
}
