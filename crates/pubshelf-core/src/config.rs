//! Configuration for pubshelf
//!
//! Everything that shapes normalization and maintenance lives here: which
//! fields are prose and which hold code lists, the legacy key aliases, the
//! canonical layout and the code tables. Defaults reproduce the behavior of
//! the publication list; a TOML file can override any section.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pubshelf_bibtex::{FormatOptions, DEFAULT_FIELD_ORDER};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codes::CodeTables;
use crate::error::{PubshelfError, Result};

/// Widest indent accepted by [`PubshelfConfig::validate`]
pub const MAX_INDENT: usize = 8;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PubshelfConfig {
    pub normalize: NormalizeConfig,
    /// Legacy field name -> canonical field name
    pub aliases: BTreeMap<String, String>,
    pub format: FormatConfig,
    pub sites: SitesConfig,
    /// Code table overrides, layered over the bundled tables
    pub codes: CodeTables,
}

impl Default for PubshelfConfig {
    fn default() -> Self {
        Self {
            normalize: NormalizeConfig::default(),
            aliases: [("dvrk_sites".to_string(), "dvrk_site".to_string())]
                .into_iter()
                .collect(),
            format: FormatConfig::default(),
            sites: SitesConfig::default(),
            codes: CodeTables::default(),
        }
    }
}

/// Which fields get which normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Prose fields: whitespace collapsed, then LaTeX escapes decoded
    pub text_fields: Vec<String>,
    /// Fields holding `" and "`-separated category codes
    pub code_fields: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            text_fields: ["title", "author", "journal", "booktitle", "publisher", "abstract"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            code_fields: ["research_field", "data_type", "dvrk_site"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Canonical layout written by `cleanup`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub indent: usize,
    pub field_order: Vec<String>,
    pub trailing_comma: bool,
    /// Move `url` values pointing at IEEE Xplore into an `ieeexplore` field
    pub migrate_ieee_urls: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            field_order: DEFAULT_FIELD_ORDER.iter().map(|s| s.to_string()).collect(),
            trailing_comma: true,
            migrate_ieee_urls: false,
        }
    }
}

impl FormatConfig {
    pub fn options(&self) -> FormatOptions {
        FormatOptions {
            indent: self.indent,
            field_order: self.field_order.clone(),
            trailing_comma: self.trailing_comma,
        }
    }
}

/// Site tagging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitesConfig {
    /// Field holding the site code list
    pub field: String,
    /// Site listed first whenever present
    pub pinned: Option<String>,
}

impl Default for SitesConfig {
    fn default() -> Self {
        Self {
            field: "dvrk_site".to_string(),
            pinned: Some("JHU".to_string()),
        }
    }
}

impl PubshelfConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Read and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| PubshelfError::io(path, e))?;
        let config = Self::from_toml(&content)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// `<config dir>/pubshelf/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pubshelf").join("config.toml"))
    }

    /// Load an explicit path, or the default path when it exists, or defaults.
    ///
    /// A missing explicit path is an error; a missing default file is not.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Bundled code tables with this configuration's overrides applied
    pub fn code_tables(&self) -> CodeTables {
        let mut tables = CodeTables::builtin();
        tables.merge(&self.codes);
        tables
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.format.indent > MAX_INDENT {
            return Err(ConfigError::OutOfRange(format!(
                "format.indent must be at most {}, got {}",
                MAX_INDENT, self.format.indent
            )));
        }

        for (legacy, canonical) in &self.aliases {
            if legacy.eq_ignore_ascii_case(canonical) {
                return Err(ConfigError::InvalidAlias(format!(
                    "{} maps to itself",
                    legacy
                )));
            }
        }

        let tables = self.code_tables();
        for field in &self.normalize.code_fields {
            if !tables.contains_field(field) {
                return Err(ConfigError::MissingTable(field.clone()));
            }
        }

        Ok(())
    }
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Value is out of valid range
    OutOfRange(String),
    InvalidAlias(String),
    /// A code field has no code table
    MissingTable(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::OutOfRange(msg) => write!(f, "Value out of range: {}", msg),
            ConfigError::InvalidAlias(msg) => write!(f, "Invalid alias: {}", msg),
            ConfigError::MissingTable(field) => {
                write!(f, "Code field {} has no code table", field)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
