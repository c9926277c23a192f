//! ustar archive creation and extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: block constants and the [`ArchiveEntry`] record
//! - [`header`]: encoding and decoding of 512-byte ustar header blocks
//! - [`walker`]: deterministic pre-order traversal of a source directory
//! - [`writer`]: sequential archive writer with end-of-archive finalization
//! - [`reader`]: sequential record reader over a file or standard input
//! - [`extractor`]: restoration of a record stream below a target directory
//!
//! ## Stream format
//!
//! An archive is a sequence of records, each a header block followed (for
//! regular files) by the payload padded with zeros to a multiple of 512
//! bytes, terminated by two all-zero blocks. Directories always precede
//! their contents so extraction can create them before writing into them.
//!
//! ## Limitations
//!
//! - No symbolic links, hard links or special files
//! - No ownership; uid and gid are always written as 0
//! - No compression of the archive itself

pub mod extractor;
pub mod header;
pub mod reader;
pub mod structures;
pub mod walker;
pub mod writer;

pub use extractor::{RestoreSummary, restore_all};
pub use reader::{ArchiveReader, Entry};
pub use structures::*;
pub use walker::{DirectoryWalker, EntrySink};
pub use writer::ArchiveWriter;

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::io::ArchiveSource;

/// Archive `source_dir` into the file `archive`.
///
/// Returns the number of entries written. On failure after the archive file
/// was created the partial file is removed; a failed creation never leaves
/// something that looks like a complete archive.
pub fn create_archive(archive: &Path, source_dir: &Path, naming: EntryNaming) -> Result<u64> {
    let mut writer = ArchiveWriter::create(archive)?;
    info!(
        "creating {} from {}",
        archive.display(),
        source_dir.display()
    );

    let result = DirectoryWalker::new(naming)
        .walk(source_dir, &mut writer)
        .and_then(|()| writer.finish().map(drop));

    match result {
        Ok(()) => {
            info!("wrote {} entries to {}", writer.entries(), archive.display());
            Ok(writer.entries())
        }
        Err(e) => {
            drop(writer);
            if let Err(rm) = fs::remove_file(archive) {
                warn!("could not remove partial archive {}: {}", archive.display(), rm);
            }
            Err(e)
        }
    }
}

/// Restore the archive read from `source` below `target_root`.
pub fn extract_archive(source: &ArchiveSource, target_root: &Path) -> Result<RestoreSummary> {
    let mut reader = ArchiveReader::open(source)?;
    info!("extracting {} into {}", source, target_root.display());

    let summary = restore_all(&mut reader, target_root)?;
    info!(
        "restored {} directories and {} files ({} skipped)",
        summary.directories, summary.files, summary.skipped
    );
    Ok(summary)
}
