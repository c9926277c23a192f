//! Digest of the gzip-compressed form of a file.
//!
//! Container layers are identified by the sha256 of their compressed bytes.
//! The input is streamed through a gzip encoder whose output goes straight
//! into the hasher, so nothing but the digest is kept.
//!
//! ```no_run
//! let digest = gotar::hash::compressed_file_digest("layer.tar").unwrap();
//! println!("{:x}", digest);
//! ```

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Result, TarError};

/// Output of a SHA-256 hash.
pub type Sha256Hash = sha2::digest::Output<Sha256>;

/// Gzip everything `reader` yields and hash the compressed bytes.
///
/// The gzip header carries no file name and a zero timestamp, so the digest
/// depends on the input bytes only.
pub fn compressed_digest<R: Read>(mut reader: R) -> io::Result<Sha256Hash> {
    let mut encoder = GzEncoder::new(Sha256::new(), Compression::default());
    let read = io::copy(&mut reader, &mut encoder)?;
    // finish() writes the gzip trailer; the hasher must not be read before.
    let hasher = encoder.finish()?;
    debug!("compressed {} input bytes", read);
    Ok(hasher.finalize())
}

/// [`compressed_digest`] of the file at `path`.
///
/// # Errors
///
/// [`TarError::Filesystem`] if the file cannot be opened or read.
pub fn compressed_file_digest(path: impl AsRef<Path>) -> Result<Sha256Hash> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| TarError::fs(path, e))?;
    compressed_digest(BufReader::new(file)).map_err(|e| TarError::fs(path, e))
}
