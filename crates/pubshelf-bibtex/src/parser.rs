//! BibTeX parser implementation using nom
//!
//! Entry boundaries are found with an explicit balanced-delimiter scan, so
//! field values containing nested braces (case protection, math in titles)
//! never truncate an entry. The parser handles:
//! - All entry types, delimited by `{...}` or `(...)`
//! - @string definitions and the standard month macros
//! - @preamble declarations and @comment sections, kept as [`Directive`]s
//! - Braced and quoted field values, string concatenation with #
//!
//! Field values keep their inner braces and escapes verbatim; decoding them is
//! left to [`crate::decode_latex`].

use std::collections::{BTreeMap, BTreeSet};

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0, one_of},
    combinator::map,
    error::{Error, ErrorKind},
    IResult,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::entry::BibEntry;

/// Standard BibTeX month macros
const MONTH_MACROS: [(&str, &str); 12] = [
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// Error type for parsing failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The entry's delimiters never balance before the end of the document
    #[error("Unterminated @{entry_type} entry starting at line {line} (byte {offset})")]
    MalformedEntry {
        line: u32,
        offset: usize,
        entry_type: String,
    },
}

/// Why an entry was left out of the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingCiteKey,
    MissingEntryType,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingCiteKey => f.write_str("missing citation key"),
            SkipReason::MissingEntryType => f.write_str("missing entry type"),
        }
    }
}

/// An entry that was well-formed but could not be identified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub line: u32,
    pub offset: usize,
    pub reason: SkipReason,
    pub verbatim: String,
}

/// Kind of a non-entry block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveKind {
    String,
    Preamble,
    Comment,
}

/// An @string, @preamble or @comment block with its source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Lowercase macro name of an @string definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// @string macros expanded in this block's value
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub macros: Vec<String>,
    pub line: u32,
    pub offset: usize,
    pub verbatim: String,
}

/// Result of parsing a BibTeX document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOutcome {
    /// Entries in document order
    pub entries: Vec<BibEntry>,
    pub skipped: Vec<SkippedEntry>,
    /// @string definitions, keyed by lowercase name
    pub strings: BTreeMap<String, String>,
    pub preambles: Vec<String>,
    /// Non-entry blocks in document order
    pub directives: Vec<Directive>,
}

impl ParseOutcome {
    /// The @string definitions an entry depends on, directly or through other
    /// definitions, in document order.
    ///
    /// A name resolves to its last definition before the point of use.
    pub fn definitions_for(&self, entry: &BibEntry) -> Vec<&Directive> {
        let mut needed: BTreeMap<usize, &Directive> = BTreeMap::new();
        let mut pending: Vec<(&str, usize)> = entry
            .macros
            .iter()
            .map(|name| (name.as_str(), entry.offset))
            .collect();

        while let Some((name, before)) = pending.pop() {
            let Some(definition) = self.directives.iter().rev().find(|d| {
                d.kind == DirectiveKind::String
                    && d.offset < before
                    && d.name.as_deref() == Some(name)
            }) else {
                continue;
            };
            if needed.insert(definition.offset, definition).is_none() {
                pending.extend(
                    definition
                        .macros
                        .iter()
                        .map(|m| (m.as_str(), definition.offset)),
                );
            }
        }

        needed.into_values().collect()
    }
}

/// Parse a BibTeX document
pub fn parse(input: &str) -> Result<ParseOutcome, ParseError> {
    let mut outcome = ParseOutcome::default();
    let mut lines = LineCounter::default();
    let mut pos = 0;

    while let Some(rel) = input[pos..].find('@') {
        let start = pos + rel;
        let rest = &input[start..];

        let (after_header, (tag, open)) = match entry_header(rest) {
            Ok(parsed) => parsed,
            Err(_) => {
                // A stray '@' in free text between entries
                pos = start + 1;
                continue;
            }
        };

        let body_start = start + (rest.len() - after_header.len());
        let line = lines.line_at(input, start);
        let close = find_close(input, body_start, open as u8).ok_or_else(|| {
            ParseError::MalformedEntry {
                line,
                offset: start,
                entry_type: tag.to_string(),
            }
        })?;

        let verbatim = &input[start..=close];
        let body = &input[body_start..close];
        pos = close + 1;

        let directive = |kind, name, macros: BTreeSet<String>| Directive {
            kind,
            name,
            macros: macros.into_iter().collect(),
            line,
            offset: start,
            verbatim: verbatim.to_string(),
        };

        match tag.to_lowercase().as_str() {
            "comment" => {
                let block = directive(DirectiveKind::Comment, None, BTreeSet::new());
                outcome.directives.push(block);
            }
            "string" => {
                let mut macros = BTreeSet::new();
                let name = parse_string_definition(body, &mut outcome.strings, &mut macros);
                let block = directive(DirectiveKind::String, name, macros);
                outcome.directives.push(block);
            }
            "preamble" => {
                let mut macros = BTreeSet::new();
                let text = value_or_raw(body.trim(), &outcome.strings, &mut macros);
                outcome.preambles.push(text);
                let block = directive(DirectiveKind::Preamble, None, macros);
                outcome.directives.push(block);
            }
            _ => match parse_entry_body(tag, body, &outcome.strings) {
                Ok(mut entry) => {
                    entry.verbatim = verbatim.to_string();
                    entry.offset = start;
                    entry.line = line;
                    outcome.entries.push(entry);
                }
                Err(reason) => {
                    warn!(line, %reason, "Skipping bibliography entry");
                    outcome.skipped.push(SkippedEntry {
                        line,
                        offset: start,
                        reason,
                        verbatim: verbatim.to_string(),
                    });
                }
            },
        }
    }

    debug!(
        entries = outcome.entries.len(),
        skipped = outcome.skipped.len(),
        directives = outcome.directives.len(),
        "Parsed bibliography"
    );
    Ok(outcome)
}

/// Parse the first entry of a BibTeX snippet
pub fn parse_entry(input: &str) -> Result<Option<BibEntry>, ParseError> {
    Ok(parse(input)?.entries.into_iter().next())
}

/// Tracks line numbers incrementally as the scan moves forward
#[derive(Default)]
struct LineCounter {
    pos: usize,
    newlines: u32,
}

impl LineCounter {
    fn line_at(&mut self, input: &str, offset: usize) -> u32 {
        if offset >= self.pos {
            self.newlines += input[self.pos..offset].matches('\n').count() as u32;
            self.pos = offset;
        }
        self.newlines + 1
    }
}

/// `@type{` or `@type(`; the type may be empty so it can be reported
fn entry_header(input: &str) -> IResult<&str, (&str, char)> {
    let (rest, _) = char('@')(input)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, tag) = take_while(|c: char| c.is_ascii_alphanumeric() || c == '_')(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, open) = one_of("{(")(rest)?;
    Ok((rest, (tag, open)))
}

/// Find the delimiter closing a group whose opening delimiter precedes `from`.
///
/// Braces nest; escaped characters are skipped. For `(` groups the close is
/// the first `)` outside any braces or quoted value.
fn find_close(text: &str, from: usize, open: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut pos = from;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 1,
            b'{' => depth += 1,
            b'}' if depth > 0 => depth -= 1,
            b'}' if open == b'{' => return Some(pos),
            b'"' if open == b'(' && depth == 0 => in_quote = !in_quote,
            b')' if open == b'(' && depth == 0 && !in_quote => return Some(pos),
            _ => {}
        }
        pos += 1;
    }

    None
}

/// Split on commas that are outside braces and quotes
fn split_top_level(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut seg_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 1,
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'"' if depth == 0 => in_quote = !in_quote,
            b',' if depth == 0 && !in_quote => {
                segments.push(&body[seg_start..pos]);
                seg_start = pos + 1;
            }
            _ => {}
        }
        pos += 1;
    }
    segments.push(&body[seg_start.min(body.len())..]);

    segments
}

fn parse_entry_body(
    tag: &str,
    body: &str,
    strings: &BTreeMap<String, String>,
) -> Result<BibEntry, SkipReason> {
    if tag.is_empty() {
        return Err(SkipReason::MissingEntryType);
    }

    let mut macros = BTreeSet::new();
    let segments = split_top_level(body);
    let cite_key = segments.first().map(|s| s.trim()).unwrap_or_default();
    if !is_valid_cite_key(cite_key) {
        return Err(SkipReason::MissingCiteKey);
    }

    let mut entry = BibEntry::new(cite_key, tag);
    for segment in &segments[1..] {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let Some((name, value)) = segment.split_once('=') else {
            debug!(cite_key, segment, "Ignoring field without '='");
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            debug!(cite_key, segment, "Ignoring field without a name");
            continue;
        }
        entry.set_field(name, value_or_raw(value.trim(), strings, &mut macros));
    }
    entry.macros = macros.into_iter().collect();

    Ok(entry)
}

fn is_valid_cite_key(key: &str) -> bool {
    !key.is_empty()
        && !key
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '=' | '{' | '}' | '"' | '#'))
}

/// Parse a @string body into the macro table, returning the defined name
fn parse_string_definition(
    body: &str,
    strings: &mut BTreeMap<String, String>,
    used: &mut BTreeSet<String>,
) -> Option<String> {
    let Some((name, value)) = body.split_once('=') else {
        debug!(body, "Ignoring malformed @string definition");
        return None;
    };
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }
    let value = value_or_raw(value.trim(), strings, used);
    strings.insert(name.clone(), value);
    Some(name)
}

/// Evaluate a value expression, or keep the raw text when it does not parse
/// as one cleanly
fn value_or_raw(
    raw: &str,
    strings: &BTreeMap<String, String>,
    used: &mut BTreeSet<String>,
) -> String {
    match field_value(raw, strings, used) {
        Ok((rest, value)) if rest.trim().is_empty() => value,
        _ => {
            debug!(raw, "Keeping unparseable field value verbatim");
            raw.to_string()
        }
    }
}

/// One operand of a `#` concatenation
enum Piece<'a> {
    Literal(&'a str),
    Macro(&'a str),
}

/// Parse a field value (braced, quoted, number, or string reference).
///
/// Names of the @string macros that were expanded are added to `used`.
fn field_value<'a>(
    input: &'a str,
    strings: &BTreeMap<String, String>,
    used: &mut BTreeSet<String>,
) -> IResult<&'a str, String> {
    let mut result = String::new();
    let mut remaining = input;

    loop {
        let (rest, _) = multispace0(remaining)?;

        let (rest, piece) = alt((
            map(braced_value, Piece::Literal),
            map(quoted_value, Piece::Literal),
            map(take_while1(|c: char| c.is_ascii_digit()), Piece::Literal),
            map(take_while1(is_macro_char), Piece::Macro),
        ))(rest)?;

        match piece {
            Piece::Literal(text) => result.push_str(text),
            Piece::Macro(name) => result.push_str(&expand_macro(name, strings, used)),
        }
        remaining = rest;

        // Check for concatenation
        let (rest, _) = multispace0(remaining)?;
        if let Some(stripped) = rest.strip_prefix('#') {
            remaining = stripped;
        } else {
            return Ok((rest, result));
        }
    }
}

fn is_macro_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '+' | '/')
}

fn expand_macro(
    name: &str,
    strings: &BTreeMap<String, String>,
    used: &mut BTreeSet<String>,
) -> String {
    let key = name.to_lowercase();
    if let Some(value) = strings.get(&key) {
        let value = value.clone();
        used.insert(key);
        return value;
    }
    MONTH_MACROS
        .iter()
        .find(|(abbrev, _)| *abbrev == key)
        .map(|(_, month)| month.to_string())
        .unwrap_or_else(|| name.to_string())
}

/// `{content}` with one layer of braces removed, nested braces kept
fn braced_value(input: &str) -> IResult<&str, &str> {
    let (rest, _) = char('{')(input)?;
    let offset = input.len() - rest.len();
    match find_close(input, offset, b'{') {
        Some(end) => Ok((&input[end + 1..], &input[offset..end])),
        None => Err(nom::Err::Error(Error::new(input, ErrorKind::Char))),
    }
}

/// `"content"`; quotes inside braces do not terminate the value
fn quoted_value(input: &str) -> IResult<&str, &str> {
    let (rest, _) = char('"')(input)?;
    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut pos = input.len() - rest.len();

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 1,
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'"' if depth == 0 => return Ok((&input[pos + 1..], &input[1..pos])),
            _ => {}
        }
        pos += 1;
    }

    Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}
