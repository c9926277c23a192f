//! # gotar
//!
//! Build-time helpers for migrating container images between storage
//! backends.
//!
//! This library backs two small command-line tools:
//!
//! - `gotar` serializes a directory tree into a single ustar archive and
//!   restores it byte-for-byte, permission bits included. Archives are
//!   deterministic: entries are visited in sorted pre-order, so archiving an
//!   unchanged tree twice gives identical bytes, and they can be inspected
//!   with any tar implementation that understands ustar.
//! - `dockertar-sha256-helper` gzips a file on the fly and prints the sha256
//!   of the compressed bytes, the digest a layer is known by once compressed.
//!
//! ## Features
//!
//! - Pre-order traversal, directories always precede their contents
//! - Extraction from a file or from standard input
//! - Typed errors for every failure kind
//! - Entry names relative to the source root, or the legacy
//!   drop-the-first-character naming for compatibility with older archives
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use gotar::{ArchiveSource, EntryNaming, create_archive, extract_archive};
//!
//! fn main() -> gotar::Result<()> {
//!     // Archive ./rootfs into layer.tar
//!     let entries = create_archive(Path::new("layer.tar"), Path::new("./rootfs"), EntryNaming::Relative)?;
//!     println!("{entries} entries");
//!
//!     // Restore it somewhere else
//!     let source = ArchiveSource::parse("layer.tar")?;
//!     let summary = extract_archive(&source, Path::new("/var/tmp/restore"))?;
//!     println!("{} files", summary.files);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod hash;
pub mod io;
pub mod tar;

pub use cli::{Cli, HashCli, Mode};
pub use error::{Result, TarError};
pub use io::ArchiveSource;
pub use crate::tar::{
    ArchiveEntry, ArchiveReader, ArchiveWriter, DirectoryWalker, EntryKind, EntryNaming,
    RestoreSummary, create_archive, extract_archive,
};
