//! BibTeX parsing and formatting for pubshelf
//!
//! Turns a hand-edited publication list into typed entries while keeping each
//! entry's exact source text for lossless re-export.
//!
//! Features:
//! - Balanced-delimiter entry scanning with nom-based field values
//! - LaTeX accent-escape decoding
//! - Canonical formatting with a fixed field order

mod entry;
mod formatter;
mod latex_decoder;
pub mod parser;

pub use entry::{BibEntry, BibField, EntryKind};
pub use formatter::{
    collapse_whitespace, format_entries, format_entry, FormatOptions, DEFAULT_FIELD_ORDER,
};
pub use latex_decoder::decode_latex;
pub use parser::{
    parse, parse_entry, Directive, DirectiveKind, ParseError, ParseOutcome, SkipReason,
    SkippedEntry,
};
