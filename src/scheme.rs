//! Identifier schemes and the registry that ties them to table columns.
//!
//! Exactly one scheme is primary. Every other scheme is a satellite whose values are stored only
//! against the primary key; conversions between two satellites always go through the primary.

use crate::error::{Result, XrefError};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierScheme {
    HgncId,
    Symbol,
    Entrez,
    RefSeq,
    UniProt,
    Ensembl,
}

impl IdentifierScheme {
    pub const ALL: [IdentifierScheme; 6] = [
        Self::HgncId,
        Self::Symbol,
        Self::Entrez,
        Self::RefSeq,
        Self::UniProt,
        Self::Ensembl,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::HgncId => "hgncid",
            Self::Symbol => "symbol",
            Self::Entrez => "entrez",
            Self::RefSeq => "refseq",
            Self::UniProt => "uniprot",
            Self::Ensembl => "ensembl",
        }
    }
}

impl fmt::Display for IdentifierScheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IdentifierScheme {
    type Err = XrefError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|scheme| scheme.name() == key)
            .ok_or_else(|| XrefError::UnknownScheme(s.to_string()))
    }
}

/// An ordered `(src, dst)` pair, written `<src>2<dst>` (e.g. `symbol2entrez`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemePair {
    pub src: IdentifierScheme,
    pub dst: IdentifierScheme,
}

impl SchemePair {
    pub fn new(src: IdentifierScheme, dst: IdentifierScheme) -> Self {
        Self { src, dst }
    }
}

impl fmt::Display for SchemePair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}2{}", self.src, self.dst)
    }
}

impl FromStr for SchemePair {
    type Err = XrefError;

    fn from_str(s: &str) -> Result<Self> {
        let (src, dst) = s
            .trim()
            .split_once('2')
            .ok_or_else(|| XrefError::InvalidPair(s.to_string()))?;
        if src.is_empty() || dst.is_empty() {
            return Err(XrefError::InvalidPair(s.to_string()));
        }
        Ok(Self::new(src.parse()?, dst.parse()?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// One side is the primary scheme; backed by a loaded table.
    Direct,
    /// Two satellites; composed through the primary scheme.
    Indirect,
}

/// Source columns for one scheme. The first label is the canonical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub scheme: IdentifierScheme,
    pub columns: Vec<String>,
}

impl ColumnSpec {
    pub fn new(scheme: IdentifierScheme, columns: &[&str]) -> Self {
        Self {
            scheme,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRegistry {
    primary: IdentifierScheme,
    specs: Vec<ColumnSpec>,
}

impl SchemaRegistry {
    /// Validates and builds a registry. `primary` must be declared in `specs` with exactly one
    /// column; every scheme needs at least one column and may appear only once.
    pub fn new(primary: IdentifierScheme, specs: Vec<ColumnSpec>) -> Result<Self> {
        for (i, spec) in specs.iter().enumerate() {
            if spec.columns.is_empty() || spec.columns.iter().any(|c| c.trim().is_empty()) {
                return Err(XrefError::InvalidRegistry(format!(
                    "scheme '{}' has no usable source column",
                    spec.scheme
                )));
            }
            if specs[..i].iter().any(|other| other.scheme == spec.scheme) {
                return Err(XrefError::InvalidRegistry(format!(
                    "scheme '{}' is declared more than once",
                    spec.scheme
                )));
            }
        }
        let primary_spec = specs
            .iter()
            .find(|spec| spec.scheme == primary)
            .ok_or_else(|| {
                XrefError::InvalidRegistry(format!("primary scheme '{primary}' has no columns"))
            })?;
        if primary_spec.columns.len() != 1 {
            return Err(XrefError::InvalidRegistry(format!(
                "primary scheme '{primary}' must come from exactly one column, got {}",
                primary_spec.columns.len()
            )));
        }
        Ok(Self { primary, specs })
    }

    /// The HGNC download layout, keyed by `HGNC ID`.
    pub fn hgnc() -> Self {
        Self {
            primary: IdentifierScheme::HgncId,
            specs: vec![
                ColumnSpec::new(IdentifierScheme::HgncId, &["HGNC ID"]),
                ColumnSpec::new(
                    IdentifierScheme::Symbol,
                    &["Approved Symbol", "Previous Symbols", "Synonyms"],
                ),
                ColumnSpec::new(
                    IdentifierScheme::Entrez,
                    &["Entrez Gene ID(supplied by NCBI)"],
                ),
                ColumnSpec::new(
                    IdentifierScheme::RefSeq,
                    &["RefSeq(supplied by NCBI)", "RefSeq IDs"],
                ),
                ColumnSpec::new(
                    IdentifierScheme::UniProt,
                    &["UniProt ID(supplied by UniProt)"],
                ),
                ColumnSpec::new(
                    IdentifierScheme::Ensembl,
                    &["Ensembl ID(supplied by Ensembl)"],
                ),
            ],
        }
    }

    pub fn primary(&self) -> IdentifierScheme {
        self.primary
    }

    pub fn is_primary(&self, scheme: IdentifierScheme) -> bool {
        scheme == self.primary
    }

    pub fn is_registered(&self, scheme: IdentifierScheme) -> bool {
        self.specs.iter().any(|spec| spec.scheme == scheme)
    }

    /// Column labels for `scheme`, canonical first. Empty for undeclared schemes.
    pub fn columns_for(&self, scheme: IdentifierScheme) -> &[String] {
        self.specs
            .iter()
            .find(|spec| spec.scheme == scheme)
            .map(|spec| spec.columns.as_slice())
            .unwrap_or_default()
    }

    pub fn specs(&self) -> &[ColumnSpec] {
        &self.specs
    }

    pub fn schemes(&self) -> impl Iterator<Item = IdentifierScheme> + '_ {
        self.specs.iter().map(|spec| spec.scheme)
    }

    pub fn satellites(&self) -> impl Iterator<Item = IdentifierScheme> + '_ {
        self.schemes().filter(move |scheme| *scheme != self.primary)
    }

    /// Classifies a pair, rejecting unregistered schemes and `src == dst`.
    pub fn route(&self, pair: SchemePair) -> Result<Route> {
        for scheme in [pair.src, pair.dst] {
            if !self.is_registered(scheme) {
                return Err(XrefError::UnregisteredScheme(scheme));
            }
        }
        if pair.src == pair.dst {
            return Err(XrefError::SameScheme(pair.src));
        }
        if self.is_primary(pair.src) || self.is_primary(pair.dst) {
            Ok(Route::Direct)
        } else {
            Ok(Route::Indirect)
        }
    }

    /// Every ordered pair of distinct registered schemes, in declaration order.
    pub fn converter_list(&self) -> Vec<(SchemePair, Route)> {
        let mut out = Vec::new();
        for src in self.schemes() {
            for dst in self.schemes() {
                if src == dst {
                    continue;
                }
                let route = if self.is_primary(src) || self.is_primary(dst) {
                    Route::Direct
                } else {
                    Route::Indirect
                };
                out.push((SchemePair::new(src, dst), route));
            }
        }
        out
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::hgnc()
    }
}
