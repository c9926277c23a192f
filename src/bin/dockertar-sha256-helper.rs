//! Prints the sha256 of the gzip-compressed form of one file as lowercase
//! hex followed by a newline. Nothing is printed when the file cannot be
//! read.

use anyhow::Context;
use clap::Parser;

use gotar::HashCli;
use gotar::cli::init_tracing;
use gotar::hash::compressed_file_digest;

fn main() {
    let cli = HashCli::parse();
    init_tracing(cli.verbose);

    match compressed_file_digest(&cli.input)
        .with_context(|| format!("Failed to hash '{}'", cli.input.display()))
    {
        Ok(digest) => println!("{:x}", digest),
        Err(e) => {
            tracing::error!("{:?}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
