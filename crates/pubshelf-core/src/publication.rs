//! Normalized bibliography records

use pubshelf_bibtex::{BibField, Directive, EntryKind};
use serde::{Deserialize, Serialize};

use crate::codes::CodeList;

/// One entry of the bibliography as consumers see it
///
/// `fields` are exactly what the parser produced; `normalized_fields` have
/// aliases resolved, prose decoded and code lists canonicalized.
/// `verbatim_text` is the entry's source text, byte for byte, and
/// `definitions` are the @string blocks it needs to parse on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub cite_key: String,
    pub entry_type: String,
    pub kind: EntryKind,
    pub fields: Vec<BibField>,
    pub normalized_fields: Vec<BibField>,
    pub verbatim_text: String,
    /// 1-based source line of the entry
    pub line: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub definitions: Vec<Directive>,
}

impl Publication {
    /// Normalized value of a field
    pub fn field(&self, key: &str) -> Option<&str> {
        lookup(&self.normalized_fields, key)
    }

    /// Value of a field as written in the source
    pub fn raw_field(&self, key: &str) -> Option<&str> {
        lookup(&self.fields, key)
    }

    pub fn title(&self) -> Option<&str> {
        self.field("title")
    }

    pub fn author(&self) -> Option<&str> {
        self.field("author")
    }

    pub fn year(&self) -> Option<&str> {
        self.field("year")
    }

    /// Code list held by a normalized field; empty when absent
    pub fn codes(&self, field: &str) -> CodeList {
        CodeList::from_field(self.field(field))
    }
}

fn lookup<'a>(fields: &'a [BibField], key: &str) -> Option<&'a str> {
    let key_lower = key.to_lowercase();
    fields
        .iter()
        .find(|f| f.key == key_lower)
        .map(|f| f.value.as_str())
}
