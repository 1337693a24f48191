//! Canonical rewrite of the bibliography document
//!
//! Cleanup works on raw field values: it renames legacy keys, collapses
//! whitespace, optionally migrates IEEE Xplore URLs, sorts, and writes every
//! entry in the canonical layout. LaTeX escapes are left as written, and the
//! document's non-entry blocks and skipped entries are copied through.

use pubshelf_bibtex::{collapse_whitespace, format_entries, parse, BibEntry};
use tracing::{debug, info};

use crate::config::PubshelfConfig;
use crate::error::Result;
use crate::export::assemble_document;
use crate::normalizer::{resolve_aliases, FieldNormalizer};
use crate::sort::sort_entries;

const IEEE_XPLORE_HOST: &str = "ieeexplore.ieee.org";

/// Move a `url` pointing at IEEE Xplore into an `ieeexplore` field.
///
/// Returns whether the entry changed. An existing `ieeexplore` field is
/// never overwritten.
pub fn migrate_ieee_url(entry: &mut BibEntry) -> bool {
    let is_ieee = entry
        .get_field("url")
        .map(|url| url.to_lowercase().contains(IEEE_XPLORE_HOST))
        .unwrap_or(false);
    if !is_ieee || entry.get_field("ieeexplore").is_some() {
        return false;
    }
    if let Some(field) = entry.fields.iter_mut().find(|f| f.key == "url") {
        field.key = "ieeexplore".to_string();
    }
    debug!(cite_key = %entry.cite_key, "Moved IEEE Xplore url");
    true
}

/// Apply the cleanup steps to parsed entries, leaving them sorted
pub fn cleanup_entries(entries: &mut [BibEntry], config: &PubshelfConfig) {
    let normalizer = FieldNormalizer::from_config(config);
    let mut migrated = 0;

    for entry in entries.iter_mut() {
        resolve_aliases(entry, normalizer.aliases());
        for field in &mut entry.fields {
            field.value = collapse_whitespace(&field.value);
        }
        if config.format.migrate_ieee_urls && migrate_ieee_url(entry) {
            migrated += 1;
        }
    }

    sort_entries(entries);
    info!(entries = entries.len(), migrated, "Cleaned up entries");
}

/// Rewrite a whole document in canonical form
pub fn cleanup_document(text: &str, config: &PubshelfConfig) -> Result<String> {
    let mut outcome = parse(text)?;
    let mut entries = std::mem::take(&mut outcome.entries);
    cleanup_entries(&mut entries, config);
    let formatted = format_entries(&entries, &config.format.options());
    Ok(assemble_document(&outcome, formatted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_ieee_url() {
        let mut entry = BibEntry::new("K", "article");
        entry.set_field("title", "T");
        entry.set_field("url", "https://IEEEXplore.ieee.org/document/123");
        assert!(migrate_ieee_url(&mut entry));
        assert_eq!(entry.get_field("url"), None);
        assert_eq!(
            entry.get_field("ieeexplore"),
            Some("https://IEEEXplore.ieee.org/document/123")
        );
        assert_eq!(entry.fields[1].key, "ieeexplore");
        assert!(!migrate_ieee_url(&mut entry));
    }

    #[test]
    fn test_migrate_skips_other_urls_and_existing_field() {
        let mut entry = BibEntry::new("K", "article");
        entry.set_field("url", "https://arxiv.org/abs/1");
        assert!(!migrate_ieee_url(&mut entry));

        entry.set_field("url", "https://ieeexplore.ieee.org/document/2");
        entry.set_field("ieeexplore", "https://ieeexplore.ieee.org/document/1");
        assert!(!migrate_ieee_url(&mut entry));
        assert!(entry.get_field("url").is_some());
    }

    #[test]
    fn test_cleanup_document() {
        let doc = r#"
@article{Old,
  dvrk_sites = {JHU},
  title = {An   old
      {Title}},
  year = {2012},
  url = {https://ieeexplore.ieee.org/document/9}
}
@inproceedings{New, year = 2020, title = {Newer}}
"#;
        let mut config = PubshelfConfig::default();
        config.format.migrate_ieee_urls = true;
        let out = cleanup_document(doc, &config).unwrap();
        assert_eq!(
            out,
            "@inproceedings{New,\n  title = {Newer},\n  year = {2020},\n}\n\n\
             @article{Old,\n  title = {An old {Title}},\n  year = {2012},\n  ieeexplore = {https://ieeexplore.ieee.org/document/9},\n  dvrk_site = {JHU},\n}\n"
        );
    }

    #[test]
    fn test_cleanup_keeps_other_blocks() {
        let doc = "@string{ral = {IEEE RA-L}}\n\
                   @article{A, journal = ral, year = 2020}\n\
                   @comment{checked 2024}\n\
                   @misc{no key here, title = {Lost?}}\n";
        let config = PubshelfConfig::default();
        let out = cleanup_document(doc, &config).unwrap();
        assert_eq!(
            out,
            "@string{ral = {IEEE RA-L}}\n\n@comment{checked 2024}\n\n\
             @article{A,\n  journal = {IEEE RA-L},\n  year = {2020},\n}\n\n\
             @misc{no key here, title = {Lost?}}\n"
        );
        assert_eq!(cleanup_document(&out, &config).unwrap(), out);
    }

    #[test]
    fn test_cleanup_is_stable() {
        let config = PubshelfConfig::default();
        let doc = "@misc{A, title = {x}, year = 1999}\n@misc{B, title = {y}}\n";
        let once = cleanup_document(doc, &config).unwrap();
        let twice = cleanup_document(&once, &config).unwrap();
        assert_eq!(once, twice);
    }
}
