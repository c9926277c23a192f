//! ustar header encoding and decoding.
//!
//! A header is a single 512-byte block. Field layout, octal formatting and
//! the checksum are handled by [`tar::Header`]; this module maps it to and
//! from [`ArchiveEntry`] and applies the limits of the archive format.
//!
//! ```text
//! offset  width  field
//!      0    100  name
//!    100      8  mode
//!    108      8  uid
//!    116      8  gid
//!    124     12  size
//!    136     12  mtime
//!    148      8  checksum
//!    156      1  typeflag
//!    257      6  magic ("ustar\0")
//!    263      2  version ("00")
//!    345    155  prefix
//! ```

use std::io;

use ::tar::Header;

use crate::error::{Result, TarError};

use super::structures::*;

/// Largest value of an 11-digit octal field.
pub const MAX_OCTAL: u64 = 0o77777777777;

/// Serialize `entry` into a header block.
///
/// The entry name must already be in its archived form. Names longer than
/// 100 bytes are split into prefix and name at a `/`; when no split fits the
/// entry is rejected instead of being truncated.
///
/// # Errors
///
/// Returns [`TarError::HeaderTooLarge`] if the name or one of the numeric
/// fields does not fit its field.
pub fn encode(entry: &ArchiveEntry) -> Result<[u8; BLOCK_SIZE]> {
    let too_large = |reason: String| TarError::HeaderTooLarge {
        name: entry.name.clone(),
        reason,
    };

    let size = if entry.is_directory() { 0 } else { entry.size };
    if size > MAX_OCTAL {
        return Err(too_large(format!("size {size} exceeds 11 octal digits")));
    }
    if entry.mtime > MAX_OCTAL {
        return Err(too_large(format!(
            "mtime {} exceeds 11 octal digits",
            entry.mtime
        )));
    }

    let mut header = Header::new_ustar();
    // Legacy names may start with '/' and are stored as given.
    if !entry.name.is_empty() {
        header
            .set_path_absolute(&entry.name)
            .map_err(|e| too_large(e.to_string()))?;
    }
    header.set_mode(entry.mode & 0o7777);
    header.set_uid(0);
    header.set_gid(0);
    header.set_size(size);
    header.set_mtime(entry.mtime);
    header.set_entry_type(entry.kind.entry_type());
    header.set_cksum();

    Ok(*header.as_bytes())
}

/// Parse a header block.
///
/// # Errors
///
/// Returns [`TarError::MalformedHeader`] if the block is shorter than
/// [`BLOCK_SIZE`], the checksum does not match, a numeric field is not
/// valid, the name is not UTF-8 or the size cannot be addressed in a stream.
pub fn decode(block: &[u8]) -> Result<ArchiveEntry> {
    if block.len() < BLOCK_SIZE {
        return Err(TarError::MalformedHeader(format!(
            "truncated header: {} of {} bytes",
            block.len(),
            BLOCK_SIZE
        )));
    }
    let header = Header::from_byte_slice(&block[..BLOCK_SIZE]);
    verify_checksum(header)?;

    // path_bytes joins the ustar prefix; GNU headers keep times there instead.
    let raw_name = String::from_utf8(header.path_bytes().into_owned()).map_err(|e| {
        TarError::MalformedHeader(format!(
            "entry name is not valid UTF-8: {:?}",
            String::from_utf8_lossy(e.as_bytes())
        ))
    })?;

    let kind = EntryKind::from_entry_type(header.entry_type(), &raw_name);
    let name = match kind {
        EntryKind::Directory => raw_name.trim_end_matches('/').to_string(),
        _ => raw_name,
    };

    let mode = header.mode().map_err(malformed)?;
    let size = header.entry_size().map_err(malformed)?;
    if size.checked_next_multiple_of(BLOCK_SIZE as u64).is_none() {
        return Err(TarError::MalformedHeader(format!(
            "size {size} of '{name}' overflows the archive stream"
        )));
    }
    let mtime = header.mtime().map_err(malformed)?;

    Ok(ArchiveEntry {
        name,
        kind,
        mode: mode & 0o7777,
        size,
        mtime,
    })
}

/// True when `block` consists of zero bytes only.
pub fn is_zero_block(block: &[u8]) -> bool {
    block.iter().all(|b| *b == 0)
}

fn verify_checksum(header: &Header) -> Result<()> {
    let stored = header.cksum().map_err(malformed)?;
    let mut expected = header.clone();
    expected.set_cksum();
    let computed = expected.cksum().map_err(malformed)?;
    if stored != computed {
        return Err(TarError::MalformedHeader(format!(
            "checksum mismatch: stored {stored:o}, computed {computed:o}"
        )));
    }
    Ok(())
}

fn malformed(e: io::Error) -> TarError {
    TarError::MalformedHeader(e.to_string())
}
