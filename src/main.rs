//! changelog-normalize CLI
//!
//! Entry point for the command-line tool.
//!
//! Exit codes:
//! - 0: Every changelog was normalized and written
//! - 2: Tool error (config error, unreadable input, parse failure, write failure)

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use changelog_normalize::{BatchProcessor, Config, DirectorySink, DirectorySource};

#[derive(Parser, Debug)]
#[command(name = "changelog-normalize")]
#[command(about = "Normalizes Liquibase XML changelogs into canonical form", long_about = None)]
struct Args {
    /// Directory containing the input changelogs
    #[arg(long)]
    input: PathBuf,

    /// Directory the normalized changelogs are written to
    #[arg(long)]
    output: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    init_logging();
    let args = Args::parse();

    if let Err(err) = run(args) {
        eprintln!("Error: {:#}", err);
        std::process::exit(2);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

/// Run one batch from `--input` to `--output`.
fn run(args: Args) -> Result<()> {
    let config = load_config(&args.config)?;

    let source = DirectorySource::new(&args.input);
    let mut sink = DirectorySink::create(&args.output).context("Failed to prepare output")?;

    let report = BatchProcessor::new(&config)
        .run(&source, &mut sink)
        .context("Failed to normalize changelogs")?;

    let totals = report.totals();
    tracing::info!(
        "changelog-normalize: {} file(s), {} changeset id(s), {} name(s), {} type(s) capped",
        report.files.len(),
        totals.synthesized_ids,
        totals.synthesized_names,
        totals.capped_types
    );
    Ok(())
}

/// Load configuration from file.
///
/// Without `--config` the built-in defaults apply. An explicit path that
/// does not exist is a tool error.
fn load_config(config_path: &Option<PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Config::from_file(path).context("Failed to load configuration")
        }
        None => Ok(Config::default()),
    }
}
