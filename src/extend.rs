//! Conversion helpers on strings and string collections.
//!
//! `convert_in` takes the dictionary explicitly; `convert_ids` reads the process-wide active
//! dictionary at the call and fails with `DictionaryNotConfigured` when none is set.

use crate::{
    context,
    dictionary::GeneDictionary,
    error::Result,
    scheme::SchemePair,
};

pub trait ConvertIdentifiers {
    type Output;

    fn convert_in(&self, dictionary: &GeneDictionary, pair: SchemePair) -> Result<Self::Output>;

    fn convert_ids(&self, pair: SchemePair) -> Result<Self::Output> {
        let dictionary = context::require_active()?;
        self.convert_in(&dictionary, pair)
    }
}

impl ConvertIdentifiers for str {
    type Output = String;

    fn convert_in(&self, dictionary: &GeneDictionary, pair: SchemePair) -> Result<String> {
        dictionary.convert_pair(pair, self)
    }
}

impl<S: AsRef<str>> ConvertIdentifiers for [S] {
    type Output = Vec<String>;

    fn convert_in(&self, dictionary: &GeneDictionary, pair: SchemePair) -> Result<Vec<String>> {
        self.iter()
            .map(|item| dictionary.convert_pair(pair, item.as_ref()))
            .collect()
    }
}

/// In-place variants; the value is left untouched when an error is returned.
pub trait ConvertIdentifiersInPlace {
    fn convert_in_place_with(
        &mut self,
        dictionary: &GeneDictionary,
        pair: SchemePair,
    ) -> Result<()>;

    fn convert_in_place(&mut self, pair: SchemePair) -> Result<()> {
        let dictionary = context::require_active()?;
        self.convert_in_place_with(&dictionary, pair)
    }
}

impl ConvertIdentifiersInPlace for String {
    fn convert_in_place_with(
        &mut self,
        dictionary: &GeneDictionary,
        pair: SchemePair,
    ) -> Result<()> {
        *self = self.as_str().convert_in(dictionary, pair)?;
        Ok(())
    }
}

impl ConvertIdentifiersInPlace for Vec<String> {
    fn convert_in_place_with(
        &mut self,
        dictionary: &GeneDictionary,
        pair: SchemePair,
    ) -> Result<()> {
        *self = self.as_slice().convert_in(dictionary, pair)?;
        Ok(())
    }
}
