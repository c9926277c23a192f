use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{Result, TarError};

/// Fail with [`TarError::InvalidDestination`] unless `path` ends in `.tar`.
pub fn check_archive_extension(path: &Path) -> Result<()> {
    match path.extension() {
        Some(ext) if ext == "tar" => Ok(()),
        _ => Err(TarError::InvalidDestination(path.display().to_string())),
    }
}

/// Create (or truncate) a local archive file for writing.
///
/// The extension is checked before anything touches the filesystem.
pub fn create_archive_file(path: &Path) -> Result<BufWriter<File>> {
    check_archive_extension(path)?;
    let file = File::create(path).map_err(|e| TarError::fs(path, e))?;
    Ok(BufWriter::new(file))
}

/// Open a local archive file for reading.
pub fn open_archive_file(path: &Path) -> Result<BufReader<File>> {
    check_archive_extension(path)?;
    let file = File::open(path).map_err(|e| TarError::fs(path, e))?;
    Ok(BufReader::new(file))
}
