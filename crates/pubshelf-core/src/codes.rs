//! Category codes and their display names
//!
//! Several fields hold short category codes joined by `" and "`
//! (`research_field = {AU and TR}`). [`CodeList`] splits such a value and
//! [`CodeTable`] maps each code to the name shown to readers.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Separator between codes in a code-list field
pub const CODE_SEPARATOR: &str = " and ";

const BUILTIN_TABLES: &str = include_str!("../data/code_tables.toml");

lazy_static! {
    static ref BUILTIN: CodeTables =
        toml::from_str(BUILTIN_TABLES).expect("bundled code tables are valid TOML");
}

/// Ordered sequence of codes parsed from one field value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeList(Vec<String>);

impl CodeList {
    /// Split a field value on the code separator.
    ///
    /// Tokens are trimmed and empty tokens dropped; order and duplicates are kept.
    pub fn parse(value: &str) -> Self {
        Self(
            value
                .split(CODE_SEPARATOR)
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Parse an optional field; a missing field is an empty list
    pub fn from_field(value: Option<&str>) -> Self {
        value.map(Self::parse).unwrap_or_default()
    }

    pub fn codes(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.iter().any(|c| c == code)
    }

    /// Display names for each code, in list order
    pub fn resolve<'a>(&'a self, table: &'a CodeTable) -> Vec<&'a str> {
        self.iter().map(|code| table.display(code)).collect()
    }

    /// Join back into a field value
    pub fn to_field_value(&self) -> String {
        self.0.join(CODE_SEPARATOR)
    }
}

impl From<Vec<String>> for CodeList {
    fn from(codes: Vec<String>) -> Self {
        Self(codes)
    }
}

impl<'a> IntoIterator for &'a CodeList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Code to display-name mapping for one field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeTable(BTreeMap<String, String>);

impl CodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, name: impl Into<String>) {
        self.0.insert(code.into(), name.into());
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    /// Display name for a code; unknown codes display as themselves
    pub fn display<'a>(&'a self, code: &'a str) -> &'a str {
        self.get(code).unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CodeTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Code tables keyed by the field they describe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeTables(BTreeMap<String, CodeTable>);

impl CodeTables {
    /// The tables bundled with the crate
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Parse tables from a TOML document of `[field]` tables
    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn table(&self, field: &str) -> Option<&CodeTable> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, table: CodeTable) {
        self.0.insert(field.into(), table);
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Display name of `code` in the table for `field`
    pub fn display<'a>(&'a self, field: &str, code: &'a str) -> &'a str {
        match self.table(field) {
            Some(table) => table.display(code),
            None => code,
        }
    }

    /// Layer `overrides` on top: entries of a table present in both are
    /// replaced one code at a time, new tables are added whole.
    pub fn merge(&mut self, overrides: &CodeTables) {
        for (field, table) in &overrides.0 {
            let target = self.0.entry(field.clone()).or_default();
            for (code, name) in table.iter() {
                target.insert(code, name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code_list() {
        assert_eq!(CodeList::parse("AU and TR").codes(), ["AU", "TR"]);
        assert_eq!(CodeList::parse("KD").codes(), ["KD"]);
        assert!(CodeList::parse("").is_empty());
        assert!(CodeList::from_field(None).is_empty());
    }

    #[test]
    fn test_parse_drops_empty_tokens_keeps_duplicates() {
        let list = CodeList::parse(" AU and  and AU and TR ");
        assert_eq!(list.codes(), ["AU", "AU", "TR"]);
        assert_eq!(list.to_field_value(), "AU and AU and TR");
    }

    #[test]
    fn test_separator_is_literal() {
        // "andrew" must not split, nor "AND"
        assert_eq!(CodeList::parse("Sandrew").codes(), ["Sandrew"]);
        assert_eq!(CodeList::parse("AU AND TR").codes(), ["AU AND TR"]);
    }

    #[test]
    fn test_resolve_unknown_passes_through() {
        let table: CodeTable = [("AU", "Automation")].into_iter().collect();
        let list = CodeList::parse("AU and ZZ");
        assert_eq!(list.resolve(&table), vec!["Automation", "ZZ"]);
    }

    #[test]
    fn test_builtin_tables() {
        let tables = CodeTables::builtin();
        assert_eq!(tables.display("research_field", "AU"), "Automation");
        assert_eq!(tables.display("data_type", "KD"), "Kinematic Data");
        assert_eq!(tables.display("dvrk_site", "JHU"), "Johns Hopkins University");
        assert_eq!(tables.display("no_such_field", "AU"), "AU");
    }

    #[test]
    fn test_merge_overrides_codes() {
        let mut tables = CodeTables::builtin();
        let overrides = CodeTables::from_toml(
            r#"
[research_field]
AU = "Autonomy"
XR = "Extended Reality"

[venue]
RAL = "Robotics and Automation Letters"
"#,
        )
        .unwrap();
        tables.merge(&overrides);

        assert_eq!(tables.display("research_field", "AU"), "Autonomy");
        assert_eq!(tables.display("research_field", "XR"), "Extended Reality");
        assert_eq!(tables.display("research_field", "TR"), "Training and Skill Assessment");
        assert!(tables.contains_field("venue"));
    }
}
