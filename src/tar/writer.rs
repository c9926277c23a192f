use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TarError};
use crate::io::create_archive_file;

use super::header;
use super::structures::{ArchiveEntry, BLOCK_SIZE, END_BLOCKS, EntryKind};
use super::walker::EntrySink;

const ZEROS: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

/// Sequential ustar archive writer.
///
/// Entries are appended with [`write_entry`](Self::write_entry);
/// [`finish`](Self::finish) writes the end-of-archive marker and hands the
/// underlying stream back. The writer refuses further entries afterwards.
pub struct ArchiveWriter<W: Write> {
    inner: Option<W>,
    entries: u64,
}

impl ArchiveWriter<BufWriter<File>> {
    /// Create the archive file at `path`.
    ///
    /// # Errors
    ///
    /// [`TarError::InvalidDestination`] if `path` does not end in `.tar` (no
    /// file is created in that case), [`TarError::Filesystem`] if the file
    /// cannot be created.
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(create_archive_file(path)?))
    }
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Some(inner),
            entries: 0,
        }
    }

    /// Number of entries written so far.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Append one header and, for anything but a directory, exactly
    /// `entry.size` bytes of payload followed by zero padding up to the
    /// block boundary.
    pub fn write_entry(
        &mut self,
        entry: &ArchiveEntry,
        payload: Option<&mut dyn Read>,
    ) -> Result<()> {
        let inner = self.inner.as_mut().ok_or(TarError::StreamClosed)?;

        let block = header::encode(entry)?;
        inner.write_all(&block)?;

        if entry.kind != EntryKind::Directory {
            let copied = match payload {
                Some(reader) => io::copy(&mut reader.take(entry.size), inner)?,
                None => 0,
            };
            if copied != entry.size {
                return Err(TarError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "{}: expected {} bytes of content, got {}",
                        entry.name, entry.size, copied
                    ),
                )));
            }
            let padding = entry.padding() as usize;
            inner.write_all(&ZEROS[..padding])?;
        }

        self.entries += 1;
        Ok(())
    }

    /// Write the two terminating zero blocks, flush and return the stream.
    ///
    /// # Errors
    ///
    /// [`TarError::StreamClosed`] when called a second time.
    pub fn finish(&mut self) -> Result<W> {
        let mut inner = self.inner.take().ok_or(TarError::StreamClosed)?;
        for _ in 0..END_BLOCKS {
            inner.write_all(&ZEROS)?;
        }
        inner.flush()?;
        debug!("archive finished after {} entries", self.entries);
        Ok(inner)
    }
}

impl<W: Write> EntrySink for ArchiveWriter<W> {
    fn write_entry(
        &mut self,
        entry: &ArchiveEntry,
        payload: Option<&mut dyn Read>,
    ) -> Result<()> {
        ArchiveWriter::write_entry(self, entry, payload)
    }
}
