//! `GeneDictionary` ties a loaded converter matrix to a correction resolver.

use crate::{
    config::XrefConfig,
    correction::{
        correction_settings, CorrectionEntry, CorrectionPrompt, CorrectionResolver,
        CorrectionSettings,
    },
    error::Result,
    matrix::{ConverterMatrix, SchemeStat},
    scheme::{IdentifierScheme, Route, SchemaRegistry, SchemePair},
    source::{self, TableSource},
    table,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::debug;

#[derive(Debug)]
pub struct GeneDictionary {
    matrix: ConverterMatrix,
    resolver: Mutex<CorrectionResolver>,
    settings: Option<CorrectionSettings>,
}

impl GeneDictionary {
    pub fn new(matrix: ConverterMatrix, resolver: CorrectionResolver) -> Self {
        let ret = Self {
            matrix,
            resolver: Mutex::new(resolver),
            settings: None,
        };
        debug!(stats = ?ret.matrix.stats(), "New gene dictionary");
        ret
    }

    /// Loads the table named by `source` with the HGNC registry and attaches the correction log
    /// from `config`. Interactive corrections go to `prompt`.
    pub fn open_with_prompt(
        source: &TableSource,
        config: &XrefConfig,
        prompt: Box<dyn CorrectionPrompt>,
    ) -> Result<Self> {
        let path = source::resolve_table_path(source, config)?;
        let matrix = table::load_path(SchemaRegistry::hgnc(), &path)?;
        let resolver = CorrectionResolver::with_log(&config.correction_log_path(), prompt)?;
        Ok(Self::new(matrix, resolver))
    }

    /// Like [`GeneDictionary::open_with_prompt`], answering interactive corrections on the
    /// terminal when that is compiled in.
    pub fn open(source: &TableSource, config: &XrefConfig) -> Result<Self> {
        Self::open_with_prompt(source, config, default_prompt())
    }

    /// Pins correction settings for this dictionary instead of following the process-wide ones.
    pub fn with_settings(mut self, settings: CorrectionSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn settings(&self) -> CorrectionSettings {
        self.settings.unwrap_or_else(correction_settings)
    }

    pub fn matrix(&self) -> &ConverterMatrix {
        &self.matrix
    }

    pub fn registry(&self) -> &SchemaRegistry {
        self.matrix.registry()
    }

    /// Scalar conversion. A miss yields `""`; only configuration problems are errors.
    pub fn convert(
        &self,
        src: IdentifierScheme,
        dst: IdentifierScheme,
        key: &str,
    ) -> Result<String> {
        self.convert_pair(SchemePair::new(src, dst), key)
    }

    pub fn convert_pair(&self, pair: SchemePair, key: &str) -> Result<String> {
        self.matrix
            .compose(pair, key, |scheme, key| self.to_primary(scheme, key))
    }

    /// Bulk access to a direct pair's table, without correction.
    pub fn table(
        &self,
        src: IdentifierScheme,
        dst: IdentifierScheme,
    ) -> Result<&HashMap<String, String>> {
        self.matrix.table(SchemePair::new(src, dst))
    }

    pub fn converter_list(&self) -> Vec<(SchemePair, Route)> {
        self.registry().converter_list()
    }

    pub fn stats(&self) -> Vec<SchemeStat> {
        self.matrix.stats()
    }

    pub fn corrections(&self) -> Vec<CorrectionEntry> {
        self.lock_resolver().entries()
    }

    /// Registers this dictionary as the process-wide one, returning the one it replaces.
    pub fn as_dictionary(self: Arc<Self>) -> Option<Arc<GeneDictionary>> {
        crate::context::set_active(Some(self))
    }

    fn lock_resolver(&self) -> std::sync::MutexGuard<'_, CorrectionResolver> {
        self.resolver.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn to_primary(&self, scheme: IdentifierScheme, key: &str) -> String {
        if let Some(primary_key) = self.matrix.to_primary(scheme, key) {
            return primary_key.to_string();
        }
        if scheme != IdentifierScheme::Symbol {
            return String::new();
        }
        let settings = self.settings();
        if !settings.enabled {
            return String::new();
        }
        let Some(symbols) = self.matrix.direct_map(scheme).map(|map| map.to_primary()) else {
            return String::new();
        };
        let resolved = self.lock_resolver().resolve(key, symbols, settings.policy);
        self.matrix
            .to_primary(scheme, &resolved)
            .unwrap_or_default()
            .to_string()
    }
}

#[cfg(feature = "terminal-prompt")]
fn default_prompt() -> Box<dyn CorrectionPrompt> {
    Box::new(crate::correction::TerminalPrompt::default())
}

#[cfg(not(feature = "terminal-prompt"))]
fn default_prompt() -> Box<dyn CorrectionPrompt> {
    Box::new(crate::correction::HeadlessPrompt)
}
