//! LaTeX character decoding
//!
//! Decodes the accent-escape notation found in hand-edited bibliographies
//! (`\'e`, `{\"u}`, `\c{c}`, `{\ss}`, ...) to Unicode and drops the braces that
//! only protect capitalization.
//!
//! Decoding is total: an escape whose accent/letter pair is not in the tables
//! is left exactly as written.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Decode LaTeX accent escapes and capitalization braces to plain text.
///
/// Each pass applies, in order: double-wrapped escapes, single escapes,
/// named commands, brace stripping and escaped specials. Passes repeat until
/// the text stops changing, so decoding an already decoded string is a no-op.
pub fn decode_latex(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = decode_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn decode_pass(input: &str) -> String {
    if !input.contains(&['\\', '{', '}'][..]) {
        return input.to_string();
    }

    let mut result = replace_accents(input, &DOUBLE_WRAPPED);
    for pattern in SINGLE_ACCENTS.iter() {
        result = replace_accents(&result, pattern);
    }
    for pattern in SPACED_ACCENTS.iter() {
        result = replace_accents(&result, pattern);
    }
    for pattern in NAMED_COMMANDS.iter() {
        result = replace_named(&result, pattern);
    }
    result = strip_grouping(&result);
    ESCAPED_SPECIAL.replace_all(&result, "$1").into_owned()
}

// ===== Accent tables =====

/// (accent, base letters, accented letters); the two strings align by char
const ACCENT_ROWS: &[(char, &str, &str)] = &[
    // Acute
    ('\'', "aeiouyAEIOUYcnszlrCNSZLRgG", "áéíóúýÁÉÍÓÚÝćńśźĺŕĆŃŚŹĹŔǵǴ"),
    // Grave
    ('`', "aeiouAEIOU", "àèìòùÀÈÌÒÙ"),
    // Circumflex
    ('^', "aeiouAEIOU", "âêîôûÂÊÎÔÛ"),
    // Diaeresis
    ('"', "aeiouyAEIOUY", "äëïöüÿÄËÏÖÜŸ"),
    // Tilde
    ('~', "anoANO", "ãñõÃÑÕ"),
    // Macron
    ('=', "aeiouAEIOU", "āēīōūĀĒĪŌŪ"),
    // Dot above
    ('.', "zZeEcCgGI", "żŻėĖċĊġĠİ"),
    // Cedilla
    ('c', "cCsStT", "çÇşŞţŢ"),
    // Ring
    ('r', "auAU", "åůÅŮ"),
    // Caron
    ('v', "cCsSzZrReEnNdD", "čČšŠžŽřŘěĚňŇďĎ"),
    // Breve
    ('u', "aAgGuU", "ăĂğĞŭŬ"),
    // Double acute
    ('H', "oOuU", "őŐűŰ"),
    // Ogonek
    ('k', "aAeEiIuU", "ąĄęĘįĮųŲ"),
];

/// Commands that stand for a character on their own
const NAMED_CHARACTERS: &[(&str, char)] = &[
    ("ae", 'æ'),
    ("AE", 'Æ'),
    ("oe", 'œ'),
    ("OE", 'Œ'),
    ("ss", 'ß'),
    ("aa", 'å'),
    ("AA", 'Å'),
    ("o", 'ø'),
    ("O", 'Ø'),
    ("l", 'ł'),
    ("L", 'Ł'),
    ("i", 'ı'),
    ("j", 'ȷ'),
];

lazy_static! {
    static ref ACCENTS: HashMap<(char, char), char> = {
        let mut m = HashMap::new();
        for (accent, bases, accented) in ACCENT_ROWS {
            for (base, out) in bases.chars().zip(accented.chars()) {
                m.insert((*accent, base), out);
            }
        }
        m
    };

    static ref NAMED: HashMap<&'static str, char> = NAMED_CHARACTERS.iter().copied().collect();
}

// ===== Patterns =====

lazy_static! {
    // {\'{e}}  {\c{c}}
    static ref DOUBLE_WRAPPED: Regex =
        Regex::new(r#"\{\\([\x27`^"~=.]|[crvuHk])\{(\\?[A-Za-z])\}\}"#).unwrap();

    static ref SINGLE_ACCENTS: Vec<Regex> = vec![
        // {\'e}  {\'\i}
        Regex::new(r#"\{\\([\x27`^"~=.])(\\?[A-Za-z])\}"#).unwrap(),
        // \'{e}  \c{c}  \'{\i}
        Regex::new(r#"\\([\x27`^"~=.]|[crvuHk])\{(\\?[A-Za-z])\}"#).unwrap(),
        // \'e  \'\i  (a dotless-i control word swallows one following space)
        Regex::new(r#"\\([\x27`^"~=.])(\\[ij]\s?|[A-Za-z])"#).unwrap(),
    ];

    // Letter-named accents separated from their argument: {\c c}  \c c
    static ref SPACED_ACCENTS: Vec<Regex> = vec![
        Regex::new(r"\{\\([crvuHk])\s+([A-Za-z])\}").unwrap(),
        Regex::new(r"\\([crvuHk])\s+([A-Za-z])").unwrap(),
    ];

    static ref NAMED_COMMANDS: Vec<Regex> = vec![
        // {\ss}
        Regex::new(r"\{\\([A-Za-z]+)\}").unwrap(),
        // \ss{}  \ss  (a control word swallows one following space)
        Regex::new(r"\\([A-Za-z]+)(?:\{\}|\s)?").unwrap(),
    ];

    // A brace group with no escape inside; kept when it is a command argument
    static ref PLAIN_GROUP: Regex =
        Regex::new(r#"(\\(?:[A-Za-z]+|[\x27`^"~=.]))?\{([^{}\\]*)\}"#).unwrap();

    static ref ESCAPED_SPECIAL: Regex = Regex::new(r"\\([&%$#_])").unwrap();
}

fn accent_char(accent: &str, base: &str) -> Option<char> {
    let accent = accent.chars().next()?;
    let base = match base.trim_end() {
        r"\i" => 'i',
        r"\j" => 'j',
        other => {
            let mut chars = other.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            c
        }
    };
    ACCENTS.get(&(accent, base)).copied()
}

fn replace_accents(input: &str, pattern: &Regex) -> String {
    pattern
        .replace_all(input, |caps: &Captures| match accent_char(&caps[1], &caps[2]) {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn replace_named(input: &str, pattern: &Regex) -> String {
    pattern
        .replace_all(input, |caps: &Captures| match NAMED.get(&caps[1]) {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// `{Robot}` -> `Robot`, repeated until no plain group is left
fn strip_grouping(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = PLAIN_GROUP
            .replace_all(&current, |caps: &Captures| {
                if caps.get(1).is_some() {
                    caps[0].to_string()
                } else {
                    caps[2].to_string()
                }
            })
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}
