use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, TarError};

use super::reader::ArchiveReader;
use super::structures::EntryKind;

/// Counts of what a restore pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RestoreSummary {
    pub directories: u64,
    pub files: u64,
    pub skipped: u64,
}

/// Restore every record of `reader` below `target_root`.
///
/// Directories are created with missing parents; existing directories are
/// left as they are. Files are created or truncated and receive exactly the
/// declared payload. Stored modes are applied to files right away and to the
/// directories created by this pass once the whole stream was restored.
///
/// The first error aborts the pass. Entries restored before it stay in place.
pub fn restore_all<R: Read>(
    reader: &mut ArchiveReader<R>,
    target_root: &Path,
) -> Result<RestoreSummary> {
    let mut summary = RestoreSummary::default();
    let mut created_dirs: Vec<(PathBuf, u32)> = Vec::new();

    // An error returns before the modes below are applied; directories
    // created so far keep the mode they were created with.
    while let Some(mut entry) = reader.next_entry()? {
        let header = entry.header.clone();

        if let EntryKind::Other(flag) = header.kind {
            warn!(
                "skipping '{}': unsupported entry type '{}'",
                header.name,
                char::from(flag)
            );
            summary.skipped += 1;
            continue;
        }

        let dest = target_root.join(sanitize(&header.name)?);

        match header.kind {
            EntryKind::Directory => {
                if !dest.is_dir() {
                    fs::create_dir_all(&dest).map_err(|e| TarError::fs(&dest, e))?;
                    created_dirs.push((dest.clone(), header.mode));
                }
                debug!("restored directory {}", dest.display());
                summary.directories += 1;
            }
            _ => {
                if let Some(parent) = dest.parent() {
                    if !parent.as_os_str().is_empty() && !parent.is_dir() {
                        fs::create_dir_all(parent).map_err(|e| TarError::fs(parent, e))?;
                    }
                }

                let file = File::create(&dest).map_err(|e| TarError::fs(&dest, e))?;
                let mut out = BufWriter::new(file);
                io::copy(&mut entry, &mut out).map_err(|e| TarError::fs(&dest, e))?;
                out.flush().map_err(|e| TarError::fs(&dest, e))?;
                drop(out);

                set_mode(&dest, header.mode)?;
                debug!("restored file {} ({} bytes)", dest.display(), header.size);
                summary.files += 1;
            }
        }
    }

    // Deepest first, so read-only parents do not block their children.
    for (dir, mode) in created_dirs.iter().rev() {
        set_mode(dir, *mode)?;
    }

    Ok(summary)
}

/// Turn an archived name into a relative path below the restore root.
///
/// Leading slashes and `.` components are dropped; `..` is refused.
fn sanitize(name: &str) -> Result<PathBuf> {
    let mut path = PathBuf::new();
    for component in name.split('/') {
        match component {
            "" | "." => {}
            ".." => return Err(TarError::UnsafePath(name.to_string())),
            part => path.push(part),
        }
    }
    Ok(path)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| TarError::fs(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
