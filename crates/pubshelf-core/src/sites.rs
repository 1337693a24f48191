//! Site tagging from an author mapping
//!
//! The mapping is a JSON object from an author's full name to the sites they
//! belong to, e.g. `{"Kazanzides, Peter": "JHU"}`. An entry gets every site
//! of every mapped author found in its `author` field. Sites that appear in
//! the mapping are "managed" and recomputed from scratch; any other site
//! already on the entry is kept.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use pubshelf_bibtex::{collapse_whitespace, format_entries, parse, BibEntry};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cleanup::cleanup_entries;
use crate::codes::{CodeList, CODE_SEPARATOR};
use crate::config::PubshelfConfig;
use crate::error::{PubshelfError, Result};
use crate::export::assemble_document;
use crate::normalizer::canonicalize_code_list;

/// Author full name -> `" and "`-joined site codes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteMapping(BTreeMap<String, String>);

impl SiteMapping {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| PubshelfError::io(path, e))?;
        Self::from_json(&content)
    }

    pub fn insert(&mut self, author: impl Into<String>, sites: impl Into<String>) {
        self.0.insert(author.into(), sites.into());
    }

    /// Every site named anywhere in the mapping
    pub fn managed_sites(&self) -> BTreeSet<String> {
        self.0
            .values()
            .flat_map(|sites| CodeList::parse(sites).codes().to_vec())
            .collect()
    }
}

/// Spellings under which an author may appear in an `author` field.
///
/// For `"Last, First Middle"`: the full name both ways round, spaced
/// initials (`F. M.`), compact initials (`F.M.`) and, with more than one
/// given name, the first initial alone. A name without a comma is used as is.
pub fn name_variants(full_name: &str) -> Vec<String> {
    let Some((last, given)) = full_name.split_once(',') else {
        return vec![full_name.trim().to_string()];
    };
    let last = last.trim();
    let given = given.trim();

    let mut variants = vec![format!("{}, {}", last, given), format!("{} {}", given, last)];

    let initials: Vec<String> = given
        .split_whitespace()
        .filter_map(|name| name.chars().next())
        .map(|c| format!("{}.", c))
        .collect();
    if !initials.is_empty() {
        let spaced = initials.join(" ");
        let compact = initials.concat();
        variants.push(format!("{}, {}", last, spaced));
        variants.push(format!("{} {}", spaced, last));
        variants.push(format!("{}, {}", last, compact));
        variants.push(format!("{} {}", compact, last));
        if initials.len() > 1 {
            variants.push(format!("{}, {}", last, initials[0]));
            variants.push(format!("{} {}", initials[0], last));
        }
    }

    let mut seen = BTreeSet::new();
    variants.retain(|v| seen.insert(v.clone()));
    variants
}

/// Sites added or removed on one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteChange {
    pub cite_key: String,
    pub before: Vec<String>,
    pub after: Vec<String>,
}

struct AuthorMatcher {
    patterns: Vec<Regex>,
    sites: Vec<String>,
}

impl AuthorMatcher {
    fn matches(&self, authors: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(authors))
    }
}

/// Compiled mapping plus the field and ordering to write
pub struct SiteTagger {
    matchers: Vec<AuthorMatcher>,
    managed: BTreeSet<String>,
    field: String,
    pinned: Option<String>,
}

impl SiteTagger {
    pub fn new(
        mapping: &SiteMapping,
        field: impl Into<String>,
        pinned: Option<String>,
    ) -> Result<Self> {
        let mut matchers = Vec::with_capacity(mapping.0.len());
        for (author, sites) in &mapping.0 {
            let patterns = name_variants(author)
                .iter()
                .map(|variant| {
                    // Case-insensitive whole-name match: no word character on either side
                    Regex::new(&format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(variant)))
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            matchers.push(AuthorMatcher {
                patterns,
                sites: CodeList::parse(sites).codes().to_vec(),
            });
        }

        Ok(Self {
            matchers,
            managed: mapping.managed_sites(),
            field: field.into(),
            pinned,
        })
    }

    pub fn from_config(mapping: &SiteMapping, config: &PubshelfConfig) -> Result<Self> {
        Self::new(mapping, config.sites.field.clone(), config.sites.pinned.clone())
    }

    /// Sites an `author` field earns from the mapping
    pub fn sites_for(&self, authors: &str) -> BTreeSet<String> {
        let authors = collapse_whitespace(authors);
        if authors.is_empty() {
            return BTreeSet::new();
        }
        self.matchers
            .iter()
            .filter(|m| m.matches(&authors))
            .flat_map(|m| m.sites.iter().cloned())
            .collect()
    }

    /// Alphabetical, with the pinned site first
    fn ordered(&self, sites: BTreeSet<String>) -> Vec<String> {
        let mut ordered: Vec<String> = sites.into_iter().collect();
        if let Some(pinned) = &self.pinned {
            if let Some(pos) = ordered.iter().position(|s| s == pinned) {
                let site = ordered.remove(pos);
                ordered.insert(0, site);
            }
        }
        ordered
    }

    /// Retag one entry; returns the change if its site set differs
    pub fn tag_entry(&self, entry: &mut BibEntry) -> Option<SiteChange> {
        let current_value = entry
            .get_field(&self.field)
            .map(canonicalize_code_list)
            .unwrap_or_default();
        let current: BTreeSet<String> =
            CodeList::parse(&current_value).codes().iter().cloned().collect();

        let mut target: BTreeSet<String> = current.difference(&self.managed).cloned().collect();
        target.extend(self.sites_for(entry.author().unwrap_or_default()));

        if target == current {
            return None;
        }

        let before = self.ordered(current);
        let after = self.ordered(target);
        if after.is_empty() {
            entry.remove_field(&self.field);
        } else {
            entry.set_field(self.field.clone(), after.join(CODE_SEPARATOR));
        }
        debug!(cite_key = %entry.cite_key, ?before, ?after, "Updated sites");

        Some(SiteChange {
            cite_key: entry.cite_key.clone(),
            before,
            after,
        })
    }

    /// Retag every entry, returning the changes in entry order
    pub fn apply(&self, entries: &mut [BibEntry]) -> Vec<SiteChange> {
        entries
            .iter_mut()
            .filter_map(|entry| self.tag_entry(entry))
            .collect()
    }
}

/// Clean up, retag and re-format a whole document
pub fn tag_document(
    text: &str,
    mapping: &SiteMapping,
    config: &PubshelfConfig,
) -> Result<(String, Vec<SiteChange>)> {
    let tagger = SiteTagger::from_config(mapping, config)?;
    let mut outcome = parse(text)?;
    let mut entries = std::mem::take(&mut outcome.entries);
    cleanup_entries(&mut entries, config);
    let changes = tagger.apply(&mut entries);
    info!(changed = changes.len(), "Site tagging finished");
    let formatted = format_entries(&entries, &config.format.options());
    Ok((assemble_document(&outcome, formatted), changes))
}
