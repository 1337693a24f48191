//! pubshelf command-line entry point

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use pubshelf_bibtex::parse;
use pubshelf_core::{
    check_braces, cleanup_document, export_subset, read_document, sort_verbatim, tag_document,
    Bibliography, FieldNormalizer, PubshelfConfig, PubshelfError, SiteMapping, CODE_SEPARATOR,
};
use tracing::{debug, info, warn};

mod cli;

use cli::{Args, Command};

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = PubshelfConfig::load_or_default(args.config.as_deref())?;
    run(args.command, &config)
}

fn run(command: Command, config: &PubshelfConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Command::Parse { file, raw } => {
            let text = read_document(&file)?;
            let json = if raw {
                serde_json::to_string_pretty(&parse(&text)?)?
            } else {
                let normalizer = FieldNormalizer::from_config(config);
                let bibliography = Bibliography::parse(&text, &normalizer)?;
                serde_json::to_string_pretty(bibliography.publications())?
            };
            println!("{}", json);
        }
        Command::Check { file } => {
            let text = read_document(&file)?;
            let mut ok = true;

            for problem in check_braces(&text) {
                println!("FAILED: {}", problem);
                ok = false;
            }

            match Bibliography::parse(&text, &FieldNormalizer::from_config(config)) {
                Ok(bibliography) => {
                    for skipped in bibliography.skipped() {
                        println!("SKIPPED: line {}: {}", skipped.line, skipped.reason);
                        ok = false;
                    }
                    for key in bibliography.duplicate_keys() {
                        warn!(cite_key = key, "Duplicate citation key");
                    }
                    info!(entries = bibliography.len(), "Parsed");
                }
                Err(e) => {
                    println!("FAILED: {}", e);
                    ok = false;
                }
            }

            if !ok {
                return Ok(ExitCode::FAILURE);
            }
            info!("No problems found");
        }
        Command::Export { file, keys } => {
            let normalizer = FieldNormalizer::from_config(config);
            let bibliography = Bibliography::load(&file, &normalizer)?;
            let exported = export_subset(bibliography.publications(), &keys);
            if exported.is_empty() {
                warn!("No entries matched the given keys");
            }
            print!("{}", exported);
        }
        Command::Sort { file, output } => {
            let sorted = sort_verbatim(&read_document(&file)?)?;
            write_output(output.as_deref(), &sorted)?;
        }
        Command::Cleanup { file, output } => {
            let cleaned = cleanup_document(&read_document(&file)?, config)?;
            write_output(output.as_deref(), &cleaned)?;
        }
        Command::Sites {
            file,
            mapping,
            output,
        } => {
            let mapping = SiteMapping::load(&mapping)?;
            let (tagged, changes) = tag_document(&read_document(&file)?, &mapping, config)?;
            for change in &changes {
                info!(
                    cite_key = %change.cite_key,
                    before = %change.before.join(CODE_SEPARATOR),
                    after = %change.after.join(CODE_SEPARATOR),
                    "Sites updated"
                );
            }
            if changes.is_empty() {
                info!("No updates to sites needed");
            }
            write_output(output.as_deref(), &tagged)?;
        }
        Command::Codes { file, field } => {
            let normalizer = FieldNormalizer::from_config(config);
            let bibliography = Bibliography::load(&file, &normalizer)?;
            for count in bibliography.code_counts(&field, normalizer.tables()) {
                println!("{}\t{}\t{}", count.count, count.code, count.name);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Write to `path`, or stdout when no path is given
fn write_output(path: Option<&Path>, content: &str) -> Result<(), PubshelfError> {
    match path {
        Some(path) => {
            std::fs::write(path, content).map_err(|e| PubshelfError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            info!(path = %path.display(), "Wrote output");
        }
        None => print!("{}", content),
    }
    Ok(())
}
