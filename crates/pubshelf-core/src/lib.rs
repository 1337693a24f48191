//! pubshelf-core: normalized publication records and bibliography maintenance
//!
//! Builds on `pubshelf-bibtex` to turn a hand-edited publication list into
//! [`Publication`] records with legacy field names repaired, LaTeX escapes
//! decoded and category codes split into [`CodeList`]s.
//!
//! The same parsed records drive the maintenance tooling:
//! - [`sort_verbatim`] and [`cleanup_document`] rewrite the document in order
//! - [`tag_document`] recomputes site tags from an author mapping
//! - [`check_braces`] locates unbalanced entries
//! - [`export_subset`] returns selected entries exactly as written

pub mod bibliography;
pub mod cleanup;
pub mod codes;
pub mod config;
pub mod error;
pub mod export;
pub mod lint;
pub mod normalizer;
pub mod publication;
pub mod sites;
pub mod sort;

pub use bibliography::{read_document, Bibliography, CodeCount};
pub use cleanup::{cleanup_document, cleanup_entries, migrate_ieee_url};
pub use codes::{CodeList, CodeTable, CodeTables, CODE_SEPARATOR};
pub use config::{ConfigError, PubshelfConfig};
pub use error::{PubshelfError, Result};
pub use export::{export_all, export_subset};
pub use lint::{check_braces, BraceImbalance};
pub use normalizer::{canonicalize_code_list, resolve_aliases, FieldClass, FieldNormalizer};
pub use publication::Publication;
pub use sites::{name_variants, tag_document, SiteChange, SiteMapping, SiteTagger};
pub use sort::{sort_entries, sort_publications, sort_verbatim, YearKey};
