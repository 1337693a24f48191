//! BibTeX formatting module
//!
//! Writes entries back out in the canonical layout used for the publication
//! list: a fixed field order, braced values and a trailing comma after every
//! field so that appending a field by hand never breaks the entry.

use serde::{Deserialize, Serialize};

use super::entry::{BibEntry, BibField};

/// Field order applied by [`FormatOptions::default`]
pub const DEFAULT_FIELD_ORDER: &[&str] = &[
    "author",
    "title",
    "journal",
    "booktitle",
    "year",
    "volume",
    "number",
    "pages",
    "month",
    "publisher",
    "doi",
    "url",
    "ieeexplore",
    "semanticscholar",
    "arxiv",
    "pdf",
    "openaccesspdf",
    "research_field",
    "data_type",
    "dvrk_site",
    "abstract",
    "keywords",
];

/// Layout options for canonical output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Spaces before each field
    pub indent: usize,
    /// Fields written first, in this order; the rest follow alphabetically
    pub field_order: Vec<String>,
    pub trailing_comma: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            field_order: DEFAULT_FIELD_ORDER.iter().map(|s| s.to_string()).collect(),
            trailing_comma: true,
        }
    }
}

/// Format a single BibTeX entry to string
pub fn format_entry(entry: &BibEntry, options: &FormatOptions) -> String {
    let mut result = String::new();

    // Entry type and cite key
    result.push('@');
    result.push_str(&entry.entry_type);
    result.push('{');
    result.push_str(&entry.cite_key);
    result.push(',');
    result.push('\n');

    let indent = " ".repeat(options.indent);
    let ordered = ordered_fields(entry, &options.field_order);
    let last = ordered.len().saturating_sub(1);

    for (i, field) in ordered.into_iter().enumerate() {
        result.push_str(&indent);
        result.push_str(&field.key);
        result.push_str(" = {");
        result.push_str(&field.value);
        result.push('}');
        if i < last || options.trailing_comma {
            result.push(',');
        }
        result.push('\n');
    }

    result.push('}');
    result
}

/// Format multiple entries, separated by a blank line
pub fn format_entries(entries: &[BibEntry], options: &FormatOptions) -> String {
    let mut out = entries
        .iter()
        .map(|e| format_entry(e, options))
        .collect::<Vec<_>>()
        .join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Collapse runs of whitespace (including newlines) to a single space and trim
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn ordered_fields<'a>(
    entry: &'a BibEntry,
    field_order: &[String],
) -> Vec<&'a BibField> {
    let mut ordered: Vec<_> = field_order
        .iter()
        .filter_map(|key| entry.fields.iter().find(|f| &f.key == key))
        .collect();

    let mut rest: Vec<_> = entry
        .fields
        .iter()
        .filter(|f| !field_order.contains(&f.key))
        .collect();
    rest.sort_by(|a, b| a.key.cmp(&b.key));

    ordered.extend(rest);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BibEntry {
        let mut entry = BibEntry::new("Chen2021", "inproceedings");
        entry.set_field("year", "2021");
        entry.set_field("zotero", "x");
        entry.set_field("title", "A {dVRK} Study");
        entry.set_field("author", "Chen, Z.");
        entry.set_field("custom", "y");
        entry
    }

    #[test]
    fn test_field_order_then_alphabetical() {
        let out = format_entry(&sample(), &FormatOptions::default());
        assert_eq!(
            out,
            "@inproceedings{Chen2021,\n  author = {Chen, Z.},\n  title = {A {dVRK} Study},\n  year = {2021},\n  custom = {y},\n  zotero = {x},\n}"
        );
    }

    #[test]
    fn test_without_trailing_comma() {
        let options = FormatOptions {
            indent: 4,
            trailing_comma: false,
            ..FormatOptions::default()
        };
        let mut entry = BibEntry::new("K", "misc");
        entry.set_field("title", "T");
        entry.set_field("year", "2000");
        assert_eq!(
            format_entry(&entry, &options),
            "@misc{K,\n    title = {T},\n    year = {2000}\n}"
        );
    }

    #[test]
    fn test_format_entries_separator() {
        let a = BibEntry::new("A", "misc");
        let b = BibEntry::new("B", "misc");
        let out = format_entries(&[a, b], &FormatOptions::default());
        assert_eq!(out, "@misc{A,\n}\n\n@misc{B,\n}\n");
        assert_eq!(format_entries(&[], &FormatOptions::default()), "");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  A\n   multi-line\ttitle "), "A multi-line title");
        assert_eq!(collapse_whitespace(""), "");
    }
}
