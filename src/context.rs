//! The process-wide active dictionary used by ambient conversion helpers.

use crate::{
    dictionary::GeneDictionary,
    error::{Result, XrefError},
};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

static ACTIVE_DICTIONARY: LazyLock<RwLock<Option<Arc<GeneDictionary>>>> =
    LazyLock::new(|| RwLock::new(None));

/// Installs `dictionary` (or clears the slot with `None`) and returns what was there before.
pub fn set_active(dictionary: Option<Arc<GeneDictionary>>) -> Option<Arc<GeneDictionary>> {
    let mut guard = ACTIVE_DICTIONARY
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *guard, dictionary)
}

pub fn active() -> Option<Arc<GeneDictionary>> {
    ACTIVE_DICTIONARY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// The active dictionary, or `DictionaryNotConfigured`.
pub fn require_active() -> Result<Arc<GeneDictionary>> {
    active().ok_or(XrefError::DictionaryNotConfigured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        correction::{CorrectionResolver, CorrectionSettings, HeadlessPrompt},
        extend::ConvertIdentifiers,
        scheme::{IdentifierScheme, SchemaRegistry, SchemePair},
        table,
    };

    fn dictionary(text: &str) -> Arc<GeneDictionary> {
        let matrix = table::load(SchemaRegistry::hgnc(), text.lines()).unwrap();
        let resolver = CorrectionResolver::in_memory(Box::new(HeadlessPrompt));
        Arc::new(GeneDictionary::new(matrix, resolver).with_settings(CorrectionSettings::default()))
    }

    // The slot is process-wide, so every assertion about it lives in this one test.
    #[test]
    fn test_active_dictionary_swap() {
        let pair = SchemePair::new(IdentifierScheme::Symbol, IdentifierScheme::Entrez);
        let first = dictionary(include_str!("../assets/hgnc_sample.txt"));
        let second = dictionary(
            "HGNC ID\tApproved Symbol\tEntrez Gene ID(supplied by NCBI)\nHGNC:1\tASIC1\t999\n",
        );

        set_active(None);
        assert!(active().is_none());
        assert!(matches!(
            "ASIC1".convert_ids(pair),
            Err(XrefError::DictionaryNotConfigured)
        ));

        assert!(first.clone().as_dictionary().is_none());
        assert_eq!("ASIC1".convert_ids(pair).unwrap(), "41");

        let previous = set_active(Some(second.clone())).unwrap();
        assert!(Arc::ptr_eq(&previous, &first));
        assert_eq!("ASIC1".convert_ids(pair).unwrap(), "999");

        // scoped save/restore
        let saved = set_active(None);
        assert!(matches!(
            require_active(),
            Err(XrefError::DictionaryNotConfigured)
        ));
        set_active(saved);
        assert!(Arc::ptr_eq(&require_active().unwrap(), &second));

        let cleared = set_active(None).unwrap();
        assert!(Arc::ptr_eq(&cleared, &second));
        assert!(matches!(
            ["ASIC1", "RGS4"].convert_ids(pair),
            Err(XrefError::DictionaryNotConfigured)
        ));
    }
}
