//! Error types shared by the archiver, the extractor and the digest helper.
//!
//! Every failure is one of the kinds below. Nothing is retried: usage and
//! destination problems are detected before any side effect, everything else
//! aborts the pass it happened in.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the `gotar` library.
#[derive(Error, Debug)]
pub enum TarError {
    /// Bad or missing command-line arguments.
    #[error("{0}")]
    Usage(String),

    /// The archive path does not carry the `.tar` extension.
    #[error("Please provide a valid tar filename: {0}")]
    InvalidDestination(String),

    /// The source directory cannot be used as an archive root.
    #[error("Invalid source directory: {0}")]
    InvalidSource(String),

    /// open/stat/read/write/mkdir failure on a specific path.
    #[error("{}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O failure on the archive stream itself.
    #[error("archive stream: {0}")]
    Io(#[from] io::Error),

    /// The entry does not fit into a ustar header.
    #[error("header too large for '{name}': {reason}")]
    HeaderTooLarge { name: String, reason: String },

    /// A header block is truncated or cannot be parsed.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// An entry name would escape the extraction root.
    #[error("refusing to restore unsafe path '{0}'")]
    UnsafePath(String),

    /// A write was attempted after the archive was finalized.
    #[error("archive stream already closed")]
    StreamClosed,
}

impl TarError {
    /// Wrap an `io::Error` with the path it happened on.
    pub fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TarError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, TarError>;
