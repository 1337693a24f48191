//! Brace-balance lint
//!
//! A quick check that works even when the parser gives up: the document is
//! cut at every line starting with `@` and each chunk's `{` and `}` counts are
//! compared. It points at the entry to fix when parsing reports
//! `MalformedEntry`, and catches a stray brace that the parser would
//! otherwise absorb into a neighbouring entry.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

lazy_static! {
    static ref ENTRY_START: Regex = Regex::new(r"(?m)^@").unwrap();
    static ref ENTRY_HEADER: Regex = Regex::new(r"^@\w+\{(.+?),").unwrap();
}

/// A chunk whose brace counts differ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BraceImbalance {
    /// Citation key from the chunk header, or `"unknown"`
    pub cite_key: String,
    /// 1-based line where the chunk starts
    pub line: u32,
    pub opened: usize,
    pub closed: usize,
}

impl std::fmt::Display for BraceImbalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: entry '{}' has unbalanced braces: {} opened, {} closed",
            self.line, self.cite_key, self.opened, self.closed
        )
    }
}

/// Report every chunk of `text` with unbalanced braces
pub fn check_braces(text: &str) -> Vec<BraceImbalance> {
    let mut starts: Vec<usize> = ENTRY_START.find_iter(text).map(|m| m.start()).collect();
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }

    let mut problems = Vec::new();
    let mut line = 1u32;
    let mut counted_to = 0;

    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        let chunk = &text[start..end];

        line += text[counted_to..start].matches('\n').count() as u32;
        counted_to = start;

        if chunk.trim().is_empty() {
            continue;
        }

        let opened = chunk.matches('{').count();
        let closed = chunk.matches('}').count();
        if opened != closed {
            let cite_key = ENTRY_HEADER
                .captures(chunk)
                .map(|caps| caps[1].trim().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            warn!(%cite_key, line, opened, closed, "Unbalanced braces");
            problems.push(BraceImbalance {
                cite_key,
                line,
                opened,
                closed,
            });
        }
    }

    problems
}
