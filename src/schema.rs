//! Route definitions: which scopes may override a route, and its fallback
//! default when nothing is stored.
//!
//! Schemas are written in TOML, one table per `section.group.element`:
//!
//! ```toml
//! [shipping]
//! label = "Shipping Settings"
//! scope = ["default", "website"]
//!
//! [shipping.origin.country_id]
//! label = "Country"
//! default = "US"
//!
//! [shipping.origin.postcode]
//! scope = ["default", "website", "store"]
//! default = 90034
//! ```
//!
//! `scope` is inherited element ← group ← section; without any declaration
//! every scope is permitted. In strict mode unknown keys fail the load with
//! the offending line, so a typo like `scopes = [...]` cannot silently widen
//! a permission.

use std::collections::BTreeMap;
use std::path::Path as FsPath;

use serde::Deserialize;
use toml::Table;

use crate::error::{Error, Result};
use crate::route::Route;
use crate::scope::ScopePerm;
use crate::value::Value;

const SCOPE_KEY: &str = "scope";
const LABEL_KEY: &str = "label";

/// Definition of one route.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub route: Route,
    pub perm: ScopePerm,
    pub default: Option<Value>,
    pub label: Option<String>,
}

impl Field {
    pub fn new(route: Route, perm: ScopePerm) -> Self {
        Field {
            route,
            perm,
            default: None,
            label: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

#[derive(Deserialize)]
struct FieldSpec {
    scope: Option<ScopePerm>,
    default: Option<Value>,
    label: Option<String>,
}

/// Route table keyed by [`Route`].
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: BTreeMap<Route, Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field) -> Option<Field> {
        self.fields.insert(field.route.clone(), field)
    }

    pub fn get(&self, route: &Route) -> Option<&Field> {
        self.fields.get(route)
    }

    /// Permission for `route`, if defined.
    pub fn perm(&self, route: &Route) -> Option<ScopePerm> {
        self.get(route).map(|f| f.perm)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Read and parse a schema file.
    pub fn load(path: &FsPath, strict: bool) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        parse(&content, path, strict)
    }

    /// Parse schema text. `strict` rejects unknown keys.
    pub fn from_toml_str(content: &str, strict: bool) -> Result<Self> {
        parse(content, FsPath::new("<inline>"), strict)
    }
}

fn parse(content: &str, path: &FsPath, strict: bool) -> Result<Schema> {
    let parse_err = |source| Error::ParseError {
        path: path.to_path_buf(),
        source,
    };
    let table: Table = content.parse().map_err(parse_err)?;

    let mut schema = Schema::new();
    let mut unknown: Vec<String> = Vec::new();

    for (section, section_val) in table {
        let Value::Table(section_tbl) = section_val else {
            unknown.push(section);
            continue;
        };
        let (section_perm, groups) = split_level(section_tbl, &section, &mut unknown)
            .map_err(parse_err)?;

        for (group, group_tbl) in groups {
            let prefix = format!("{section}.{group}");
            let (group_perm, elements) =
                split_level(group_tbl, &prefix, &mut unknown).map_err(parse_err)?;

            for (element, element_tbl) in elements {
                let dotted = format!("{prefix}.{element}");
                let spec: FieldSpec =
                    serde_ignored::deserialize(Value::Table(element_tbl), |ignored| {
                        unknown.push(format!("{dotted}.{ignored}"));
                    })
                    .map_err(parse_err)?;

                let route = Route::from_segments(&section, &group, &element)?;
                let perm = spec
                    .scope
                    .or(group_perm)
                    .or(section_perm)
                    .unwrap_or_else(ScopePerm::all);
                schema.insert(Field {
                    route,
                    perm,
                    default: spec.default,
                    label: spec.label,
                });
            }
        }
    }

    if strict && !unknown.is_empty() {
        let errors = unknown
            .into_iter()
            .map(|key| {
                let line = find_key_line(content, &key);
                Error::UnknownKey {
                    key,
                    path: path.to_path_buf(),
                    line,
                }
            })
            .collect();
        return Err(Error::UnknownKeys(errors));
    }
    Ok(schema)
}

/// Split a section or group table into its own `scope` and its child tables.
fn split_level(
    table: Table,
    prefix: &str,
    unknown: &mut Vec<String>,
) -> std::result::Result<(Option<ScopePerm>, Vec<(String, Table)>), toml::de::Error> {
    let mut perm = None;
    let mut children = Vec::new();
    for (key, value) in table {
        match (key.as_str(), value) {
            (SCOPE_KEY, value) => perm = Some(ScopePerm::deserialize(value)?),
            (LABEL_KEY, Value::String(_)) => {}
            (_, Value::Table(child)) => children.push((key, child)),
            _ => unknown.push(format!("{prefix}.{key}")),
        }
    }
    Ok((perm, children))
}

/// 1-indexed line assigning `dotted_key`, following `[table]` headers and
/// dotted keys, quoted segments included. 0 if not found.
fn find_key_line(content: &str, dotted_key: &str) -> usize {
    let target: Vec<&str> = dotted_key.split('.').collect();
    let mut table: Vec<String> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') || trimmed.starts_with("[[") {
            continue;
        }
        if let Some(header) = trimmed.strip_prefix('[') {
            if let Some(end) = find_unquoted(header, ']') {
                table = key_segments(&header[..end]);
            }
            continue;
        }
        let Some(eq) = find_unquoted(trimmed, '=') else {
            continue;
        };
        let key = key_segments(&trimmed[..eq]);
        if table.len() + key.len() == target.len()
            && table.iter().chain(&key).zip(&target).all(|(a, b)| a == b)
        {
            return i + 1;
        }
    }
    0
}

/// Segments of a key or table header with quotes and padding removed.
fn key_segments(key: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quote = None;
    for c in key.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None => match c {
                '"' | '\'' => quote = Some(c),
                '.' => segments.push(std::mem::take(&mut current)),
                c if c.is_whitespace() => {}
                c => current.push(c),
            },
        }
    }
    segments.push(current);
    segments
}

/// Byte offset of the first `target` outside a quoted string.
fn find_unquoted(s: &str, target: char) -> Option<usize> {
    let mut quote = None;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == target => return Some(i),
            None => {}
        }
    }
    None
}
