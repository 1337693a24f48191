//! Subset export
//!
//! Exported text is the concatenation of the selected entries' source text,
//! never a re-serialization, so whatever a reader downloads is exactly what
//! the maintainers wrote. Each entry is preceded by the @string definitions it
//! uses that have not been written yet, so the export parses on its own.

use std::collections::HashSet;

use pubshelf_bibtex::ParseOutcome;

use crate::publication::Publication;

/// Join verbatim entry texts with a blank line, newline-terminated
pub(crate) fn join_verbatim<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = texts.into_iter().collect::<Vec<_>>().join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Surround rewritten entries with the rest of a parsed document.
///
/// @string, @preamble and @comment blocks come first in their original order
/// and entries the parser skipped come last, all exactly as written. Free text
/// between blocks is not carried over.
pub(crate) fn assemble_document(outcome: &ParseOutcome, entries: String) -> String {
    let head = join_verbatim(outcome.directives.iter().map(|d| d.verbatim.as_str()));
    let tail = join_verbatim(outcome.skipped.iter().map(|s| s.verbatim.as_str()));
    [head, entries, tail]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn export_publications<'a>(selected: impl IntoIterator<Item = &'a Publication>) -> String {
    let mut written = HashSet::new();
    let mut blocks = Vec::new();
    for publication in selected {
        for definition in &publication.definitions {
            if written.insert((definition.offset, definition.verbatim.as_str())) {
                blocks.push(definition.verbatim.as_str());
            }
        }
        blocks.push(publication.verbatim_text.as_str());
    }
    join_verbatim(blocks)
}

/// Export the publications whose citation key is in `keys`, in document order.
///
/// Every publication sharing a selected key is included.
pub fn export_subset<S: AsRef<str>>(publications: &[Publication], keys: &[S]) -> String {
    let wanted: HashSet<&str> = keys.iter().map(AsRef::as_ref).collect();
    export_publications(
        publications
            .iter()
            .filter(|p| wanted.contains(p.cite_key.as_str())),
    )
}

/// Export every publication
pub fn export_all(publications: &[Publication]) -> String {
    export_publications(publications)
}
