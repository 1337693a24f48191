//! Field normalization
//!
//! Turns parser output into [`Publication`]s: legacy keys are renamed,
//! prose fields are whitespace-collapsed and LaTeX-decoded, code-list fields
//! lose stray grouping braces. Any other field is copied through unchanged.
//! Normalization never fails.

use std::collections::{BTreeMap, BTreeSet};

use pubshelf_bibtex::{collapse_whitespace, decode_latex, BibEntry, BibField};

use crate::codes::CodeTables;
use crate::config::{NormalizeConfig, PubshelfConfig};
use crate::publication::Publication;

/// How a field's value is normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    Text,
    CodeList,
    Verbatim,
}

/// Immutable normalizer built from configuration and injected code tables
///
/// Code-list values are canonicalized without consulting the tables; they are
/// carried so that consumers resolving codes to names (charts, filters, the
/// `codes` report) use the same tables the normalizer was configured with.
#[derive(Debug, Clone)]
pub struct FieldNormalizer {
    text_fields: BTreeSet<String>,
    code_fields: BTreeSet<String>,
    aliases: BTreeMap<String, String>,
    tables: CodeTables,
}

impl FieldNormalizer {
    pub fn new(config: &PubshelfConfig, tables: CodeTables) -> Self {
        Self::with_aliases(&config.normalize, &config.aliases, tables)
    }

    pub fn with_aliases(
        normalize: &NormalizeConfig,
        aliases: &BTreeMap<String, String>,
        tables: CodeTables,
    ) -> Self {
        Self {
            text_fields: normalize.text_fields.iter().map(|f| f.to_lowercase()).collect(),
            code_fields: normalize.code_fields.iter().map(|f| f.to_lowercase()).collect(),
            aliases: aliases
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.to_lowercase()))
                .collect(),
            tables,
        }
    }

    /// Normalizer for a configuration, using its merged code tables
    pub fn from_config(config: &PubshelfConfig) -> Self {
        Self::new(config, config.code_tables())
    }

    pub fn tables(&self) -> &CodeTables {
        &self.tables
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// Canonical name for a (lowercase) field key
    pub fn canonical_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.aliases.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn classify(&self, canonical_key: &str) -> FieldClass {
        if self.code_fields.contains(canonical_key) {
            FieldClass::CodeList
        } else if self.text_fields.contains(canonical_key) {
            FieldClass::Text
        } else {
            FieldClass::Verbatim
        }
    }

    /// Normalize one field, returning its canonical key and value
    pub fn normalize_field(&self, key: &str, value: &str) -> (String, String) {
        let key = key.to_lowercase();
        let canonical = self.canonical_key(&key).to_string();
        let value = match self.classify(&canonical) {
            // Decoding can leave doubled spaces where a group or command was removed
            FieldClass::Text => collapse_whitespace(&decode_latex(&collapse_whitespace(value))),
            FieldClass::CodeList => canonicalize_code_list(value),
            FieldClass::Verbatim => value.to_string(),
        };
        (canonical, value)
    }

    /// Build the normalized record for a parsed entry
    pub fn normalize_entry(&self, entry: &BibEntry) -> Publication {
        let mut resolved = entry.clone();
        resolve_aliases(&mut resolved, &self.aliases);

        let normalized_fields = resolved
            .fields
            .iter()
            .map(|field| {
                let (key, value) = self.normalize_field(&field.key, &field.value);
                BibField { key, value }
            })
            .collect();

        Publication {
            cite_key: entry.cite_key.clone(),
            entry_type: entry.entry_type.clone(),
            kind: entry.kind(),
            fields: entry.fields.clone(),
            normalized_fields,
            verbatim_text: entry.verbatim.clone(),
            line: entry.line,
            definitions: Vec::new(),
        }
    }
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::from_config(&PubshelfConfig::default())
    }
}

/// Rename legacy keys on an entry in place.
///
/// When both keys are present the canonical field keeps its position and
/// takes the legacy value.
pub fn resolve_aliases(entry: &mut BibEntry, aliases: &BTreeMap<String, String>) {
    for (legacy, canonical) in aliases {
        let Some(legacy_pos) = entry.fields.iter().position(|f| &f.key == legacy) else {
            continue;
        };
        match entry.fields.iter().position(|f| &f.key == canonical) {
            Some(canonical_pos) => {
                let value = entry.fields.remove(legacy_pos).value;
                let canonical_pos = if canonical_pos > legacy_pos {
                    canonical_pos - 1
                } else {
                    canonical_pos
                };
                entry.fields[canonical_pos].value = value;
            }
            None => entry.fields[legacy_pos].key = canonical.clone(),
        }
    }
}

/// Strip grouping braces from a code-list value and collapse whitespace.
///
/// Codes are bare identifiers, so every brace is an artifact.
pub fn canonicalize_code_list(value: &str) -> String {
    let unbraced: String = value.chars().filter(|c| *c != '{' && *c != '}').collect();
    collapse_whitespace(&unbraced)
}
