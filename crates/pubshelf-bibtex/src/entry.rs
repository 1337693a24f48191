//! BibTeX entry data structures

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Presentation category of an entry
///
/// The source document keeps its type tags verbatim; this groups them into the
/// handful of categories the publication list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Article,
    ConferencePaper,
    BookChapter,
    Other,
}

impl EntryKind {
    /// Classify an entry type tag (case-insensitive)
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_lowercase().as_str() {
            "article" => Self::Article,
            "inproceedings" | "conference" | "proceedings" => Self::ConferencePaper,
            "incollection" | "inbook" => Self::BookChapter,
            _ => Self::Other,
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::ConferencePaper => "conference paper",
            Self::BookChapter => "book chapter",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single BibTeX field (key-value pair)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibField {
    pub key: String,
    pub value: String,
}

/// A parsed BibTeX entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibEntry {
    pub cite_key: String,
    /// Type tag exactly as written after `@`
    pub entry_type: String,
    pub fields: Vec<BibField>,
    /// Source text from `@` through the closing delimiter
    pub verbatim: String,
    /// Byte offset of the `@` in the parsed document
    pub offset: usize,
    /// 1-based line of the `@`
    pub line: u32,
    /// Lowercase names of the @string macros the field values expanded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub macros: Vec<String>,
}

impl BibEntry {
    /// Create a new BibTeX entry
    pub fn new(cite_key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            cite_key: cite_key.into(),
            entry_type: entry_type.into(),
            fields: Vec::new(),
            verbatim: String::new(),
            offset: 0,
            line: 1,
            macros: Vec::new(),
        }
    }

    /// Set a field, lowercasing the key.
    ///
    /// A key that is already present keeps its position and takes the new value.
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into().to_lowercase();
        let value = value.into();
        match self.fields.iter_mut().find(|f| f.key == key) {
            Some(existing) => existing.value = value,
            None => self.fields.push(BibField { key, value }),
        }
    }

    /// Remove a field, returning its value
    pub fn remove_field(&mut self, key: &str) -> Option<String> {
        let key_lower = key.to_lowercase();
        let pos = self.fields.iter().position(|f| f.key == key_lower)?;
        Some(self.fields.remove(pos).value)
    }

    /// Get a field value by key (case-insensitive)
    pub fn get_field(&self, key: &str) -> Option<&str> {
        let key_lower = key.to_lowercase();
        self.fields
            .iter()
            .find(|f| f.key == key_lower)
            .map(|f| f.value.as_str())
    }

    /// Get all fields as a HashMap for convenient access
    pub fn fields_map(&self) -> HashMap<String, String> {
        self.fields
            .iter()
            .map(|f| (f.key.clone(), f.value.clone()))
            .collect()
    }

    pub fn kind(&self) -> EntryKind {
        EntryKind::from_tag(&self.entry_type)
    }

    pub fn title(&self) -> Option<&str> {
        self.get_field("title")
    }

    pub fn author(&self) -> Option<&str> {
        self.get_field("author")
    }

    pub fn year(&self) -> Option<&str> {
        self.get_field("year")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_classification() {
        assert_eq!(EntryKind::from_tag("article"), EntryKind::Article);
        assert_eq!(EntryKind::from_tag("ARTICLE"), EntryKind::Article);
        assert_eq!(
            EntryKind::from_tag("InProceedings"),
            EntryKind::ConferencePaper
        );
        assert_eq!(
            EntryKind::from_tag("conference"),
            EntryKind::ConferencePaper
        );
        assert_eq!(EntryKind::from_tag("incollection"), EntryKind::BookChapter);
        assert_eq!(EntryKind::from_tag("phdthesis"), EntryKind::Other);
        assert_eq!(EntryKind::ConferencePaper.label(), "conference paper");
    }

    #[test]
    fn test_entry_field_access() {
        let mut entry = BibEntry::new("Smith2024", "article");
        entry.set_field("title", "A Great Paper");
        entry.set_field("Author", "John Smith");
        entry.set_field("YEAR", "2024");

        assert_eq!(entry.title(), Some("A Great Paper"));
        assert_eq!(entry.author(), Some("John Smith"));
        assert_eq!(entry.get_field("Year"), Some("2024"));
        assert_eq!(entry.get_field("doi"), None);
        assert_eq!(entry.fields[1].key, "author");
    }

    #[test]
    fn test_set_field_overwrites_in_place() {
        let mut entry = BibEntry::new("Smith2024", "article");
        entry.set_field("title", "First");
        entry.set_field("year", "2020");
        entry.set_field("TITLE", "Second");

        assert_eq!(entry.fields.len(), 2);
        assert_eq!(entry.fields[0].key, "title");
        assert_eq!(entry.title(), Some("Second"));
    }

    #[test]
    fn test_remove_field() {
        let mut entry = BibEntry::new("Smith2024", "article");
        entry.set_field("dvrk_sites", "JHU");
        assert_eq!(entry.remove_field("DVRK_SITES"), Some("JHU".to_string()));
        assert!(entry.fields.is_empty());
        assert_eq!(entry.remove_field("dvrk_sites"), None);
    }
}
