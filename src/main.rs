//! Main entry point for the gotar CLI application.
//!
//! `gotar -cf <archive>.tar <dir>` archives a directory,
//! `gotar -xf <archive>.tar` and `gotar -xf -` restore one into the current
//! working directory.

use anyhow::{Context, Result};
use clap::Parser;

use gotar::cli::init_tracing;
use gotar::{Cli, Mode, create_archive, extract_archive};

/// Application entry point.
///
/// Parses arguments, dispatches to creation or extraction and turns any
/// failure into a message on stderr and exit status 1.
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    if let Err(e) = run(&cli) {
        tracing::error!("gotar failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match cli.mode()? {
        Mode::Create {
            archive,
            source,
            naming,
        } => {
            create_archive(&archive, &source, naming).with_context(|| {
                format!(
                    "Failed to archive '{}' into '{}'",
                    source.display(),
                    archive.display()
                )
            })?;
        }
        Mode::Extract { source } => {
            // Restoration target is always the working directory
            let cwd = std::env::current_dir().context("Cannot determine working directory")?;
            extract_archive(&source, &cwd)
                .with_context(|| format!("Failed to extract '{}'", source))?;
        }
    }

    Ok(())
}
