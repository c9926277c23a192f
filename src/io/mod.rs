mod local;

pub use local::{check_archive_extension, create_archive_file, open_archive_file};

use std::fmt;
use std::io::Read;
use std::path::PathBuf;

use crate::error::{Result, TarError};

/// Archive argument meaning "read the archive from standard input".
pub const STDIN_SENTINEL: &str = "-";

/// Where an archive is read from during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    Stdin,
    File(PathBuf),
}

impl ArchiveSource {
    /// Interpret an archive argument. `-` selects standard input, anything
    /// else must be a path with the `.tar` extension.
    pub fn parse(arg: &str) -> Result<Self> {
        if arg.is_empty() {
            return Err(TarError::Usage(
                "Destination filename cannot be empty".to_string(),
            ));
        }
        if arg == STDIN_SENTINEL {
            return Ok(ArchiveSource::Stdin);
        }
        let path = PathBuf::from(arg);
        check_archive_extension(&path)?;
        Ok(ArchiveSource::File(path))
    }

    /// Open the source for sequential reading.
    pub fn open(&self) -> Result<Box<dyn Read>> {
        match self {
            ArchiveSource::Stdin => Ok(Box::new(std::io::stdin().lock())),
            ArchiveSource::File(path) => Ok(Box::new(open_archive_file(path)?)),
        }
    }
}

impl fmt::Display for ArchiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveSource::Stdin => write!(f, "<stdin>"),
            ArchiveSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}
