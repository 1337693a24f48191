//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parse, check and maintain a BibTeX publication list.
#[derive(Parser, Debug)]
#[command(name = "pubshelf")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to <config dir>/pubshelf/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the publications as JSON
    Parse {
        file: PathBuf,
        /// Print parser output without normalization
        #[arg(long)]
        raw: bool,
    },
    /// Lint brace balance and parse; exits non-zero on problems
    Check { file: PathBuf },
    /// Print the source text of selected entries
    Export {
        file: PathBuf,
        /// Citation key to include (repeatable)
        #[arg(short, long = "key", required = true)]
        keys: Vec<String>,
    },
    /// Reorder entries newest first, keeping their source text
    Sort {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rewrite the document in canonical form
    Cleanup {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Recompute site tags from an author mapping
    Sites {
        file: PathBuf,
        /// JSON object of "Last, First" -> "SITE and SITE"
        #[arg(short, long)]
        mapping: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Count the codes of one field
    Codes {
        file: PathBuf,
        #[arg(short, long, default_value = "research_field")]
        field: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_subcommand() {
        let args = Args::try_parse_from(["pubshelf", "parse", "pubs.bib"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(
            args.command,
            Command::Parse {
                file: PathBuf::from("pubs.bib"),
                raw: false
            }
        );
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["pubshelf", "-v", "check", "a.bib"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["pubshelf", "check", "a.bib", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_and_config() {
        let args =
            Args::try_parse_from(["pubshelf", "-q", "--config", "c.toml", "sort", "a.bib"]).unwrap();
        assert!(args.quiet);
        assert_eq!(args.config, Some(PathBuf::from("c.toml")));
        assert_eq!(
            args.command,
            Command::Sort {
                file: PathBuf::from("a.bib"),
                output: None
            }
        );
    }

    #[test]
    fn test_cli_export_repeated_keys() {
        let args = Args::try_parse_from([
            "pubshelf", "export", "a.bib", "--key", "A", "-k", "B",
        ])
        .unwrap();
        match args.command {
            Command::Export { keys, .. } => assert_eq!(keys, vec!["A", "B"]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_export_requires_key() {
        let err = Args::try_parse_from(["pubshelf", "export", "a.bib"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_sites_arguments() {
        let args = Args::try_parse_from([
            "pubshelf", "sites", "a.bib", "-m", "authors.json", "-o", "out.bib",
        ])
        .unwrap();
        assert_eq!(
            args.command,
            Command::Sites {
                file: PathBuf::from("a.bib"),
                mapping: PathBuf::from("authors.json"),
                output: Some(PathBuf::from("out.bib")),
            }
        );
    }

    #[test]
    fn test_cli_codes_default_field() {
        let args = Args::try_parse_from(["pubshelf", "codes", "a.bib"]).unwrap();
        assert_eq!(
            args.command,
            Command::Codes {
                file: PathBuf::from("a.bib"),
                field: "research_field".to_string()
            }
        );
    }

    #[test]
    fn test_cli_missing_subcommand() {
        assert!(Args::try_parse_from(["pubshelf"]).is_err());
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["pubshelf", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
