use std::io::{self, Read};

use tracing::trace;

use crate::error::{Result, TarError};
use crate::io::ArchiveSource;

use super::header;
use super::structures::{ArchiveEntry, BLOCK_SIZE};

/// Sequential reader over an archive stream.
///
/// Records are visited strictly in stream order. Payload that the caller
/// does not consume is skipped when advancing to the next record.
pub struct ArchiveReader<R: Read> {
    inner: R,
    /// Unread payload bytes of the current record.
    remaining: u64,
    /// Padding after the current record's payload.
    padding: u64,
    done: bool,
}

/// A record of the archive together with its payload.
pub struct Entry<'a, R: Read> {
    pub header: ArchiveEntry,
    archive: &'a mut ArchiveReader<R>,
}

impl ArchiveReader<Box<dyn Read>> {
    /// Open an archive file or standard input.
    pub fn open(source: &ArchiveSource) -> Result<Self> {
        Ok(Self::new(source.open()?))
    }
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            remaining: 0,
            padding: 0,
            done: false,
        }
    }

    /// Advance to the next record, or `None` at the end of the archive.
    ///
    /// # Errors
    ///
    /// [`TarError::MalformedHeader`] if the stream ends inside a header or the
    /// header cannot be parsed, [`TarError::Io`] if the stream ends inside
    /// the previous record's payload.
    pub fn next_entry(&mut self) -> Result<Option<Entry<'_, R>>> {
        if self.done {
            return Ok(None);
        }

        self.skip(self.remaining + self.padding)?;
        self.remaining = 0;
        self.padding = 0;

        let mut block = [0u8; BLOCK_SIZE];
        let filled = read_block(&mut self.inner, &mut block)?;
        if filled == 0 {
            // EOF on a block boundary without terminator
            self.done = true;
            return Ok(None);
        }
        if filled < BLOCK_SIZE {
            return Err(TarError::MalformedHeader(format!(
                "unexpected end of archive: header has {filled} of {BLOCK_SIZE} bytes"
            )));
        }
        if header::is_zero_block(&block) {
            // The second terminator block is optional for readers.
            read_block(&mut self.inner, &mut block)?;
            self.done = true;
            return Ok(None);
        }

        let entry = header::decode(&block)?;
        trace!("read header {:?}", entry);
        self.remaining = entry.size;
        self.padding = entry.padding();

        Ok(Some(Entry {
            header: entry,
            archive: self,
        }))
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let skipped = io::copy(&mut (&mut self.inner).take(len), &mut io::sink())?;
        if skipped < len {
            return Err(unexpected_eof(len - skipped));
        }
        Ok(())
    }

    fn read_payload(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..want])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("archive ends {} bytes before end of entry", self.remaining),
            ));
        }
        self.remaining -= n as u64;
        Ok(n)
    }
}

impl<R: Read> Read for Entry<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.archive.read_payload(buf)
    }
}

/// Fill `buf` as far as the stream allows and return the byte count.
fn read_block(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn unexpected_eof(missing: u64) -> TarError {
    TarError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("archive ends {missing} bytes early"),
    ))
}
