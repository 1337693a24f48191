//! Error types for pubshelf-core

use std::path::PathBuf;

use pubshelf_bibtex::ParseError;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for pubshelf operations
pub type Result<T> = std::result::Result<T, PubshelfError>;

/// Main error type for pubshelf operations
#[derive(Error, Debug)]
pub enum PubshelfError {
    /// The document could not be parsed as a whole
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// An author pattern could not be compiled
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl PubshelfError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
