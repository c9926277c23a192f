use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{Result, TarError};
use crate::io::{ArchiveSource, check_archive_extension};
use crate::tar::EntryNaming;

#[derive(Parser, Debug)]
#[command(name = "gotar")]
#[command(version)]
#[command(about = "Deterministic tar archiver for image migration", long_about = None)]
#[command(after_help = "Examples:\n  \
  gotar -cf /var/tmp/export.tar /var/lib/containers   archive a directory\n  \
  gotar -xf /var/tmp/export.tar                       extract into the current directory\n  \
  cat export.tar | gotar -xf -                        extract from standard input")]
pub struct Cli {
    /// Create an archive from SOURCE_DIR
    #[arg(short = 'c')]
    pub create: bool,

    /// Extract an archive into the current directory
    #[arg(short = 'x')]
    pub extract: bool,

    /// Archive file (`-` reads standard input when extracting)
    #[arg(short = 'f', value_name = "ARCHIVE")]
    pub file: Option<String>,

    /// Directory to archive
    #[arg(value_name = "SOURCE_DIR")]
    pub source: Option<String>,

    /// How entry names are derived from the source path
    #[arg(long, value_enum, env = "GOTAR_NAMING", default_value = "relative")]
    pub naming: EntryNaming,

    /// Report progress on stderr (-vv for every entry)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Validated operation selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Create {
        archive: PathBuf,
        source: PathBuf,
        naming: EntryNaming,
    },
    Extract {
        source: ArchiveSource,
    },
}

impl Cli {
    /// Check the argument combination and resolve it into a [`Mode`].
    ///
    /// Nothing is touched on disk before this succeeds.
    pub fn mode(&self) -> Result<Mode> {
        let usage = |msg: &str| TarError::Usage(msg.to_string());

        let file = match (self.create, self.extract) {
            (false, false) => {
                return Err(usage(
                    "tar flag cannot be empty. Please use -cf for creation or -xf for extraction",
                ));
            }
            (true, true) => return Err(usage("-c and -x cannot be combined")),
            _ => self.file.as_deref().ok_or_else(|| usage("Missing arguments"))?,
        };
        if file.is_empty() {
            return Err(usage("Destination filename cannot be empty"));
        }

        if self.create {
            let source = match self.source.as_deref() {
                Some(s) if !s.is_empty() => s,
                _ => return Err(usage("Source directory cannot be empty")),
            };
            let archive = PathBuf::from(file);
            check_archive_extension(&archive)?;
            Ok(Mode::Create {
                archive,
                source: PathBuf::from(source),
                naming: self.naming,
            })
        } else {
            if self.source.is_some() {
                return Err(usage("Extraction takes no source directory"));
            }
            Ok(Mode::Extract {
                source: ArchiveSource::parse(file)?,
            })
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "dockertar-sha256-helper")]
#[command(version)]
#[command(about = "Print the sha256 of the gzip-compressed form of a file", long_about = None)]
pub struct HashCli {
    /// File to compress and hash
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Log progress on stderr
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
