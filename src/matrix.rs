//! Converter matrix: direct maps for every satellite scheme, plus composition through the
//! primary key for satellite-to-satellite pairs.

use crate::{
    error::{Result, XrefError},
    scheme::{IdentifierScheme, Route, SchemaRegistry, SchemePair},
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Both directions between one satellite scheme and the primary scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectMap {
    pub(crate) to_primary: HashMap<String, String>,
    pub(crate) from_primary: HashMap<String, String>,
}

impl DirectMap {
    pub fn to_primary(&self) -> &HashMap<String, String> {
        &self.to_primary
    }

    pub fn from_primary(&self) -> &HashMap<String, String> {
        &self.from_primary
    }

    /// Canonical column: overwrites any earlier owner of `value`.
    pub(crate) fn insert_canonical(&mut self, value: &str, primary_key: &str) {
        self.to_primary
            .insert(value.to_string(), primary_key.to_string());
    }

    /// Alias column: only claims values nobody owns yet.
    pub(crate) fn insert_alias(&mut self, value: &str, primary_key: &str) {
        if !self.to_primary.contains_key(value) {
            self.to_primary
                .insert(value.to_string(), primary_key.to_string());
        }
    }

    pub(crate) fn set_canonical_value(&mut self, primary_key: &str, value: &str) {
        self.from_primary
            .insert(primary_key.to_string(), value.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeStat {
    pub scheme: IdentifierScheme,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterMatrix {
    registry: SchemaRegistry,
    direct: HashMap<IdentifierScheme, DirectMap>,
    primary_keys: HashSet<String>,
}

impl ConverterMatrix {
    pub(crate) fn empty(registry: SchemaRegistry) -> Self {
        let direct = registry
            .satellites()
            .map(|scheme| (scheme, DirectMap::default()))
            .collect();
        Self {
            registry,
            direct,
            primary_keys: HashSet::new(),
        }
    }

    pub(crate) fn direct_mut(&mut self, scheme: IdentifierScheme) -> &mut DirectMap {
        self.direct.entry(scheme).or_default()
    }

    pub(crate) fn add_primary_key(&mut self, primary_key: &str) {
        if !self.primary_keys.contains(primary_key) {
            self.primary_keys.insert(primary_key.to_string());
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn primary(&self) -> IdentifierScheme {
        self.registry.primary()
    }

    /// Number of distinct primary keys in the table.
    pub fn indexed_genes(&self) -> usize {
        self.primary_keys.len()
    }

    pub fn direct_map(&self, scheme: IdentifierScheme) -> Option<&DirectMap> {
        self.direct.get(&scheme)
    }

    /// Bulk access. Only direct pairs have a backing table; no lookup correction is applied.
    pub fn table(&self, pair: SchemePair) -> Result<&HashMap<String, String>> {
        if self.registry.route(pair)? == Route::Indirect {
            return Err(XrefError::IndirectBulk {
                src: pair.src,
                dst: pair.dst,
                primary: self.primary(),
            });
        }
        let (satellite, towards_primary) = if self.registry.is_primary(pair.dst) {
            (pair.src, true)
        } else {
            (pair.dst, false)
        };
        let map = self
            .direct
            .get(&satellite)
            .ok_or(XrefError::UnregisteredScheme(satellite))?;
        Ok(if towards_primary {
            &map.to_primary
        } else {
            &map.from_primary
        })
    }

    /// Exact satellite → primary lookup.
    pub fn to_primary(&self, scheme: IdentifierScheme, value: &str) -> Option<&str> {
        self.direct
            .get(&scheme)?
            .to_primary
            .get(value)
            .map(String::as_str)
    }

    /// Canonical satellite value for a primary key.
    pub fn from_primary(&self, scheme: IdentifierScheme, primary_key: &str) -> Option<&str> {
        self.direct
            .get(&scheme)?
            .from_primary
            .get(primary_key)
            .map(String::as_str)
    }

    /// Scalar lookup without symbol correction. Misses yield `""`.
    pub fn lookup(&self, pair: SchemePair, key: &str) -> Result<String> {
        self.compose(pair, key, |scheme, key| {
            self.to_primary(scheme, key).unwrap_or_default().to_string()
        })
    }

    /// Runs `pair` as at most one hop into the primary key (via `to_primary`) and at most one hop
    /// out of it. An empty first hop ends the composition with `""`.
    pub(crate) fn compose<F>(&self, pair: SchemePair, key: &str, to_primary: F) -> Result<String>
    where
        F: FnOnce(IdentifierScheme, &str) -> String,
    {
        self.registry.route(pair)?;
        let key = key.trim();
        if key.is_empty() {
            return Ok(String::new());
        }
        if self.registry.is_primary(pair.src) {
            return Ok(self
                .from_primary(pair.dst, key)
                .unwrap_or_default()
                .to_string());
        }
        let primary_key = to_primary(pair.src, key);
        if self.registry.is_primary(pair.dst) || primary_key.is_empty() {
            return Ok(primary_key);
        }
        Ok(self
            .from_primary(pair.dst, &primary_key)
            .unwrap_or_default()
            .to_string())
    }

    pub fn stats(&self) -> Vec<SchemeStat> {
        self.registry
            .schemes()
            .map(|scheme| SchemeStat {
                scheme,
                entries: if self.registry.is_primary(scheme) {
                    self.primary_keys.len()
                } else {
                    self.direct
                        .get(&scheme)
                        .map(|map| map.to_primary.len())
                        .unwrap_or(0)
                },
            })
            .collect()
    }
}
