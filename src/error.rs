use crate::scheme::IdentifierScheme;
use std::path::PathBuf;

pub type Result<T, E = XrefError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum XrefError {
    #[error("identifier scheme '{0}' is not declared in the schema registry")]
    UnregisteredScheme(IdentifierScheme),

    #[error("cannot convert '{0}' into itself")]
    SameScheme(IdentifierScheme),

    #[error(
        "bulk access to '{src}2{dst}' is not supported; request '{src}2{primary}' and '{primary}2{dst}' instead"
    )]
    IndirectBulk {
        src: IdentifierScheme,
        dst: IdentifierScheme,
        primary: IdentifierScheme,
    },

    #[error("gene table '{}' does not exist", .0.display())]
    TableNotFound(PathBuf),

    #[error("invalid schema registry: {0}")]
    InvalidRegistry(String),

    #[error("gene table header lacks the primary column '{0}'")]
    MissingPrimaryColumn(String),

    #[error("gene table has no header line")]
    MissingHeader,

    #[error("unknown identifier scheme '{0}'")]
    UnknownScheme(String),

    #[error("malformed converter name '{0}', expected <src>2<dst>")]
    InvalidPair(String),

    #[error("no gene dictionary configured")]
    DictionaryNotConfigured,

    #[error("could not fetch '{source_url}': {message}")]
    Fetch { source_url: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl XrefError {
    /// Fatal setup problems that retrying cannot fix.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnregisteredScheme(_)
                | Self::SameScheme(_)
                | Self::IndirectBulk { .. }
                | Self::TableNotFound(_)
                | Self::InvalidRegistry(_)
                | Self::MissingPrimaryColumn(_)
                | Self::MissingHeader
                | Self::UnknownScheme(_)
                | Self::InvalidPair(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(XrefError::SameScheme(IdentifierScheme::Symbol).is_configuration());
        assert!(XrefError::MissingHeader.is_configuration());
        assert!(!XrefError::DictionaryNotConfigured.is_configuration());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert!(!XrefError::from(io).is_configuration());
    }

    #[test]
    fn test_indirect_bulk_message_names_route() {
        let err = XrefError::IndirectBulk {
            src: IdentifierScheme::Symbol,
            dst: IdentifierScheme::Entrez,
            primary: IdentifierScheme::HgncId,
        };
        let text = err.to_string();
        assert!(text.contains("symbol2entrez"));
        assert!(text.contains("symbol2hgncid"));
        assert!(text.contains("hgncid2entrez"));
    }
}
