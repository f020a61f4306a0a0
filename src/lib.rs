//! Gene identifier cross-references.
//!
//! A [`GeneDictionary`] converts between HGNC IDs, gene symbols, Entrez, RefSeq, UniProt and
//! Ensembl identifiers. Conversions that do not involve the primary key are composed through it,
//! and symbols missing from the table are corrected once and remembered in a log.
//!
//! ```no_run
//! use gene_xref::{GeneDictionary, IdentifierScheme, TableSource, XrefConfig};
//!
//! let config = XrefConfig::load(None)?;
//! let hgnc = GeneDictionary::open(&TableSource::Default, &config)?;
//! assert_eq!(hgnc.convert(IdentifierScheme::Entrez, IdentifierScheme::Symbol, "100")?, "ADA");
//! # Ok::<(), gene_xref::XrefError>(())
//! ```

pub mod config;
pub mod context;
pub mod correction;
pub mod dictionary;
pub mod error;
pub mod extend;
pub mod matrix;
pub mod scheme;
pub mod source;
pub mod table;

pub use config::XrefConfig;
pub use correction::{CorrectionPolicy, CorrectionPrompt, CorrectionResolver, CorrectionSettings};
pub use dictionary::GeneDictionary;
pub use error::XrefError;
pub use extend::{ConvertIdentifiers, ConvertIdentifiersInPlace};
pub use matrix::ConverterMatrix;
pub use scheme::{IdentifierScheme, Route, SchemaRegistry, SchemePair};
pub use source::TableSource;
