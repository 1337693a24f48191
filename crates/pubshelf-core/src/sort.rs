//! Publication ordering
//!
//! Newest first, then by title. Forthcoming work ("to appear") goes above
//! every dated entry; entries with no usable year go to the bottom.

use std::cmp::Reverse;

use pubshelf_bibtex::{collapse_whitespace, decode_latex, parse, BibEntry};

use crate::error::Result;
use crate::export::{assemble_document, join_verbatim};
use crate::publication::Publication;

/// Sort position derived from a `year` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum YearKey {
    Forthcoming,
    Year(Reverse<i64>),
    Unknown,
}

impl YearKey {
    pub fn from_field(year: Option<&str>) -> Self {
        let Some(year) = year.map(str::trim) else {
            return Self::Unknown;
        };
        if let Ok(n) = year.parse::<i64>() {
            return Self::Year(Reverse(n));
        }
        if year.to_lowercase().contains("appear") {
            Self::Forthcoming
        } else {
            Self::Unknown
        }
    }
}

fn title_key(title: Option<&str>) -> String {
    title.unwrap_or_default().to_lowercase()
}

/// Sort normalized publications in place (stable)
pub fn sort_publications(publications: &mut [Publication]) {
    publications.sort_by_cached_key(|p| (YearKey::from_field(p.year()), title_key(p.title())));
}

/// Sort raw entries in place (stable); titles are compared decoded
pub fn sort_entries(entries: &mut [BibEntry]) {
    entries.sort_by_cached_key(|e| {
        let title = e.title().map(|t| decode_latex(&collapse_whitespace(t)));
        (YearKey::from_field(e.year()), title_key(title.as_deref()))
    });
}

/// Re-emit a document's entries in sorted order, each exactly as written.
///
/// @string, @preamble and @comment blocks lead the output and skipped entries
/// trail it.
pub fn sort_verbatim(text: &str) -> Result<String> {
    let mut outcome = parse(text)?;
    let mut entries = std::mem::take(&mut outcome.entries);
    sort_entries(&mut entries);
    let sorted = join_verbatim(entries.iter().map(|e| e.verbatim.as_str()));
    Ok(assemble_document(&outcome, sorted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_key_order() {
        let mut keys = vec![
            YearKey::from_field(Some("2019")),
            YearKey::from_field(None),
            YearKey::from_field(Some("to appear")),
            YearKey::from_field(Some("2021")),
            YearKey::from_field(Some("n.d.")),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                YearKey::Forthcoming,
                YearKey::Year(Reverse(2021)),
                YearKey::Year(Reverse(2019)),
                YearKey::Unknown,
                YearKey::Unknown,
            ]
        );
        assert_eq!(YearKey::from_field(Some("To Appear")), YearKey::Forthcoming);
    }

    #[test]
    fn test_sort_entries_year_then_title() {
        let doc = r#"
@article{Old, title = {Zebra}, year = {2015}}
@article{NoYear, title = {Alpha}}
@article{NewB, title = {beta}, year = {2021}}
@article{Soon, title = {Later}, year = {to appear}}
@article{NewA, title = {{A}lpha}, year = {2021}}
"#;
        let mut entries = parse(doc).unwrap().entries;
        sort_entries(&mut entries);
        let keys: Vec<_> = entries.iter().map(|e| e.cite_key.as_str()).collect();
        assert_eq!(keys, ["Soon", "NewA", "NewB", "Old", "NoYear"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let doc = "@misc{First, title = {Same}, year = 2020}\n@misc{Second, title = {same}, year = 2020}\n";
        let mut entries = parse(doc).unwrap().entries;
        sort_entries(&mut entries);
        assert_eq!(entries[0].cite_key, "First");
        assert_eq!(entries[1].cite_key, "Second");
    }

    #[test]
    fn test_sort_verbatim_keeps_other_blocks() {
        let doc = r#"@string{ral = "IEEE RA-L"}
@article{Old, journal = ral, title = {T}, year = 2015}
@preamble{"\newcommand{\dvrk}{dVRK}"}
@article{, title = {Typo key}, year = 2022}
@comment{end of list}
@article{New, journal = ral, title = {U}, year = 2021}
"#;
        let sorted = sort_verbatim(doc).unwrap();
        assert_eq!(
            sorted,
            "@string{ral = \"IEEE RA-L\"}\n\n\
             @preamble{\"\\newcommand{\\dvrk}{dVRK}\"}\n\n\
             @comment{end of list}\n\n\
             @article{New, journal = ral, title = {U}, year = 2021}\n\n\
             @article{Old, journal = ral, title = {T}, year = 2015}\n\n\
             @article{, title = {Typo key}, year = 2022}\n"
        );
        assert_eq!(sort_verbatim(&sorted).unwrap(), sorted);
        assert_eq!(parse(&sorted).unwrap().entries[0].get_field("journal"), Some("IEEE RA-L"));
    }

    #[test]
    fn test_sort_verbatim_keeps_source_text() {
        let doc = "@misc{A,\n  year = {2001}, title = {Old}}\n\n% note\n@misc{B, year = 2020,\n title={New}}\n";
        let sorted = sort_verbatim(doc).unwrap();
        assert_eq!(
            sorted,
            "@misc{B, year = 2020,\n title={New}}\n\n@misc{A,\n  year = {2001}, title = {Old}}\n"
        );
    }
}
