//! The parse-and-normalize pipeline
//!
//! Every consumer of the bibliography (listing, filtering, charts, export)
//! goes through [`Bibliography::parse`], so they all see the same records.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use pubshelf_bibtex::{parse, SkippedEntry};
use serde::Serialize;
use tracing::debug;

use crate::codes::CodeTables;
use crate::error::{PubshelfError, Result};
use crate::normalizer::FieldNormalizer;
use crate::publication::Publication;

/// Read a bibliography document from disk
pub fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| PubshelfError::io(path, e))
}

/// Frequency of one code across the bibliography
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeCount {
    pub code: String,
    pub name: String,
    pub count: usize,
}

/// Parsed and normalized bibliography
#[derive(Debug, Clone, Default)]
pub struct Bibliography {
    publications: Vec<Publication>,
    skipped: Vec<SkippedEntry>,
    preambles: Vec<String>,
}

impl Bibliography {
    /// Parse a whole document and normalize every entry, in document order
    pub fn parse(text: &str, normalizer: &FieldNormalizer) -> Result<Self> {
        let outcome = parse(text)?;

        let publications: Vec<Publication> = outcome
            .entries
            .iter()
            .map(|entry| {
                let mut publication = normalizer.normalize_entry(entry);
                publication.definitions = outcome
                    .definitions_for(entry)
                    .into_iter()
                    .cloned()
                    .collect();
                publication
            })
            .collect();

        debug!(
            publications = publications.len(),
            skipped = outcome.skipped.len(),
            "Parsed bibliography"
        );

        Ok(Self {
            publications,
            skipped: outcome.skipped,
            preambles: outcome.preambles,
        })
    }

    /// Read and parse a document from disk
    pub fn load(path: &Path, normalizer: &FieldNormalizer) -> Result<Self> {
        Self::parse(&read_document(path)?, normalizer)
    }

    pub fn publications(&self) -> &[Publication] {
        &self.publications
    }

    pub fn into_publications(self) -> Vec<Publication> {
        self.publications
    }

    /// Entries that were recognized but dropped (missing key or type)
    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    pub fn preambles(&self) -> &[String] {
        &self.preambles
    }

    pub fn len(&self) -> usize {
        self.publications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publications.is_empty()
    }

    /// Index by citation key; with duplicates the last occurrence wins
    pub fn by_key(&self) -> HashMap<&str, &Publication> {
        self.publications
            .iter()
            .map(|p| (p.cite_key.as_str(), p))
            .collect()
    }

    /// Last publication with this citation key
    pub fn get(&self, cite_key: &str) -> Option<&Publication> {
        self.publications.iter().rev().find(|p| p.cite_key == cite_key)
    }

    /// Citation keys used by more than one entry, sorted
    pub fn duplicate_keys(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for publication in &self.publications {
            if !seen.insert(publication.cite_key.as_str()) {
                duplicates.insert(publication.cite_key.as_str());
            }
        }
        duplicates.into_iter().collect()
    }

    /// How many publications carry each code of `field`, most frequent first.
    ///
    /// A code repeated within one publication counts once.
    pub fn code_counts(&self, field: &str, tables: &CodeTables) -> Vec<CodeCount> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for publication in &self.publications {
            let codes = publication.codes(field);
            let distinct: BTreeSet<&str> = codes.iter().collect();
            for code in distinct {
                *counts.entry(code.to_string()).or_default() += 1;
            }
        }

        let mut result: Vec<CodeCount> = counts
            .into_iter()
            .map(|(code, count)| CodeCount {
                name: tables.display(field, &code).to_string(),
                code,
                count,
            })
            .collect();
        result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.code.cmp(&b.code)));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
@article{A, title = {One}, research_field = {AU and TR}, year = 2020}
@inproceedings{B, title = {Two}, research_field = {AU and AU}}
@misc{A, title = {Three}}
@misc{, title = {Lost}}
"#;

    #[test]
    fn test_parse_in_document_order() {
        let bib = Bibliography::parse(DOC, &FieldNormalizer::default()).unwrap();
        let titles: Vec<_> = bib.publications().iter().filter_map(|p| p.title()).collect();
        assert_eq!(titles, ["One", "Two", "Three"]);
        assert_eq!(bib.skipped().len(), 1);
        assert_eq!(bib.skipped()[0].line, 5);
    }

    #[test]
    fn test_duplicates_last_wins() {
        let bib = Bibliography::parse(DOC, &FieldNormalizer::default()).unwrap();
        assert_eq!(bib.duplicate_keys(), vec!["A"]);
        assert_eq!(bib.by_key()["A"].title(), Some("Three"));
        assert_eq!(bib.get("A").and_then(|p| p.title()), Some("Three"));
        assert_eq!(bib.len(), 3);
    }

    #[test]
    fn test_code_counts() {
        let normalizer = FieldNormalizer::default();
        let bib = Bibliography::parse(DOC, &normalizer).unwrap();
        let counts = bib.code_counts("research_field", normalizer.tables());
        assert_eq!(
            counts,
            vec![
                CodeCount {
                    code: "AU".to_string(),
                    name: "Automation".to_string(),
                    count: 2
                },
                CodeCount {
                    code: "TR".to_string(),
                    name: "Training and Skill Assessment".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_empty_document() {
        let bib = Bibliography::parse("", &FieldNormalizer::default()).unwrap();
        assert!(bib.is_empty());
        assert!(bib.skipped().is_empty());
        assert!(bib.duplicate_keys().is_empty());
    }

    #[test]
    fn test_malformed_document_fails_whole() {
        let err = Bibliography::parse("@article{A, title = {x}", &FieldNormalizer::default())
            .unwrap_err();
        assert!(matches!(err, PubshelfError::Parse(_)));
    }
}
