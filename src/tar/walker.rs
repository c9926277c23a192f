//! Deterministic pre-order traversal of a source directory.
//!
//! Every directory is reported before anything it contains and siblings are
//! visited in byte order of their file names, so archiving an unchanged tree
//! twice yields identical streams. The traversal keeps its own work stack
//! instead of recursing, which bounds native stack use on deep trees.

use std::ffi::OsStr;
use std::fs::{self, File, Metadata};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::{debug, warn};

use crate::error::{Result, TarError};

use super::structures::{ArchiveEntry, EntryNaming};

/// Consumer of the entries produced by [`DirectoryWalker::walk`].
pub trait EntrySink {
    /// Accept one entry. Regular files come with a reader yielding exactly
    /// `entry.size` bytes; directories come without payload.
    fn write_entry(&mut self, entry: &ArchiveEntry, payload: Option<&mut dyn Read>)
        -> Result<()>;
}

/// `trail` is the slash-separated traversal path entry names derive from.
enum Visit {
    Dir { path: PathBuf, trail: String },
    File { path: PathBuf, trail: String },
}

/// Walks a directory tree and emits one entry per directory and regular file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryWalker {
    naming: EntryNaming,
}

impl DirectoryWalker {
    pub fn new(naming: EntryNaming) -> Self {
        Self { naming }
    }

    /// Traverse `root`, sending every entry to `sink` in pre-order.
    ///
    /// Symbolic links and special files are skipped. Any filesystem error
    /// aborts the walk; open handles are released on every path. A file name
    /// that is not valid UTF-8 aborts the walk with
    /// [`TarError::InvalidSource`].
    pub fn walk(&self, root: &Path, sink: &mut dyn EntrySink) -> Result<()> {
        let meta = fs::metadata(root).map_err(|e| TarError::fs(root, e))?;
        if !meta.is_dir() {
            return Err(TarError::InvalidSource(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let mut stack = vec![Visit::Dir {
            path: root.to_path_buf(),
            trail: self.root_trail(root)?,
        }];

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Dir { path, trail } => {
                    let meta = fs::metadata(&path).map_err(|e| TarError::fs(&path, e))?;
                    let entry =
                        ArchiveEntry::directory(self.entry_name(&trail), mode_of(&meta, true))
                            .with_mtime(mtime_of(&meta));
                    debug!("archiving {}", entry.name);
                    sink.write_entry(&entry, None)?;

                    // Reverse so that the smallest name is popped first.
                    for child in list_children(&path)?.into_iter().rev() {
                        stack.push(child.into_visit(&trail));
                    }
                }
                Visit::File { path, trail } => {
                    let file = File::open(&path).map_err(|e| TarError::fs(&path, e))?;
                    let meta = file.metadata().map_err(|e| TarError::fs(&path, e))?;
                    let name = self.entry_name(&trail);
                    let entry = ArchiveEntry::file(name, mode_of(&meta, false), meta.len())
                        .with_mtime(mtime_of(&meta));
                    debug!("archiving {}", entry.name);

                    let mut payload = BufReader::new(file).take(entry.size);
                    sink.write_entry(&entry, Some(&mut payload))?;
                }
            }
        }

        Ok(())
    }

    /// Traversal path of the walk root.
    fn root_trail(&self, root: &Path) -> Result<String> {
        match self.naming {
            EntryNaming::Legacy => utf8_name(root.as_os_str(), root),
            EntryNaming::Relative => {
                let canonical = root.canonicalize().map_err(|e| TarError::fs(root, e))?;
                let name = canonical.file_name().ok_or_else(|| {
                    TarError::InvalidSource(format!(
                        "{} has no name to archive it under",
                        root.display()
                    ))
                })?;
                utf8_name(name, root)
            }
        }
    }

    fn entry_name(&self, trail: &str) -> String {
        match self.naming {
            EntryNaming::Relative => trail.to_string(),
            EntryNaming::Legacy => strip_first_char(trail),
        }
    }
}

struct Child {
    path: PathBuf,
    file_name: String,
    is_dir: bool,
}

impl Child {
    /// Subdirectories continue from the cleaned joined path, files from the
    /// parent path as it was reached.
    fn into_visit(self, parent: &str) -> Visit {
        if self.is_dir {
            Visit::Dir {
                path: self.path,
                trail: join_clean(parent, &self.file_name),
            }
        } else {
            Visit::File {
                path: self.path,
                trail: format!("{}/{}", parent, self.file_name),
            }
        }
    }
}

/// Directories and regular files directly below `dir`, sorted by name.
fn list_children(dir: &Path) -> Result<Vec<Child>> {
    let read_dir = fs::read_dir(dir).map_err(|e| TarError::fs(dir, e))?;

    let mut children = Vec::new();
    for dirent in read_dir {
        let dirent = dirent.map_err(|e| TarError::fs(dir, e))?;
        let path = dirent.path();
        let file_type = dirent.file_type().map_err(|e| TarError::fs(&path, e))?;

        if !file_type.is_dir() && !file_type.is_file() {
            warn!("skipping {}: not a regular file or directory", path.display());
            continue;
        }

        children.push(Child {
            file_name: utf8_name(&dirent.file_name(), &path)?,
            is_dir: file_type.is_dir(),
            path,
        });
    }

    children.sort_by(|a, b| a.file_name.as_bytes().cmp(b.file_name.as_bytes()));
    Ok(children)
}

fn utf8_name(name: &OsStr, path: &Path) -> Result<String> {
    name.to_str().map(str::to_string).ok_or_else(|| {
        TarError::InvalidSource(format!("{} is not valid UTF-8", path.display()))
    })
}

/// Drop exactly the first character of a traversal path.
pub(crate) fn strip_first_char(path: &str) -> String {
    let mut chars = path.chars();
    chars.next();
    chars.as_str().to_string()
}

/// Join `parent` and `name` with `/` and clean the result lexically.
fn join_clean(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        return clean(name);
    }
    clean(&format!("{parent}/{name}"))
}

/// Shortest equivalent of a slash-separated path: repeated slashes and `.`
/// elements are dropped, `..` removes the element before it.
fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                // `..` at the root stays at the root
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

#[cfg(unix)]
fn mode_of(meta: &Metadata, _is_dir: bool) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_of(meta: &Metadata, is_dir: bool) -> u32 {
    match (is_dir, meta.permissions().readonly()) {
        (true, _) => 0o755,
        (false, true) => 0o444,
        (false, false) => 0o644,
    }
}

fn mtime_of(meta: &Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tar::structures::EntryKind;

    /// Records entries and payloads in emission order.
    #[derive(Default)]
    struct Collect(Vec<(ArchiveEntry, Vec<u8>)>);

    impl EntrySink for Collect {
        fn write_entry(
            &mut self,
            entry: &ArchiveEntry,
            payload: Option<&mut dyn Read>,
        ) -> Result<()> {
            let mut data = Vec::new();
            if let Some(reader) = payload {
                reader.read_to_end(&mut data)?;
            }
            self.0.push((entry.clone(), data));
            Ok(())
        }
    }

    fn sample_tree() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("root");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.txt"), "hi").unwrap();
        fs::write(root.join("sub/b.txt"), "bye").unwrap();
        fs::write(root.join("z.txt"), "last").unwrap();
        tmp
    }

    #[test]
    fn test_preorder_sorted_relative_names() {
        let tmp = sample_tree();
        let mut sink = Collect::default();
        DirectoryWalker::new(EntryNaming::Relative)
            .walk(&tmp.path().join("root"), &mut sink)
            .unwrap();

        let names: Vec<_> = sink.0.iter().map(|(e, _)| e.name.as_str()).collect();
        assert_eq!(
            names,
            ["root", "root/a.txt", "root/sub", "root/sub/b.txt", "root/z.txt"]
        );

        let kinds: Vec<_> = sink.0.iter().map(|(e, _)| e.kind).collect();
        assert_eq!(kinds[0], EntryKind::Directory);
        assert_eq!(kinds[2], EntryKind::Directory);
        assert_eq!(kinds[3], EntryKind::RegularFile);

        assert_eq!(sink.0[1].0.size, 2);
        assert_eq!(sink.0[1].1, b"hi");
        assert_eq!(sink.0[3].1, b"bye");
    }

    #[test]
    fn test_legacy_names_strip_first_char() {
        let tmp = sample_tree();
        let root = tmp.path().join("root");
        let mut sink = Collect::default();
        DirectoryWalker::new(EntryNaming::Legacy)
            .walk(&root, &mut sink)
            .unwrap();

        let root_str = root.to_string_lossy().to_string();
        assert_eq!(sink.0[0].0.name, root_str[1..]);
        assert_eq!(sink.0[1].0.name, format!("{}/a.txt", &root_str[1..]));
        assert_eq!(sink.0[3].0.name, format!("{}/sub/b.txt", &root_str[1..]));
    }

    #[test]
    fn test_legacy_directories_continue_from_cleaned_path() {
        let tmp = sample_tree();
        // traversal path with a `.` element, like `./root`
        let root = tmp.path().join(".").join("root");
        let mut sink = Collect::default();
        DirectoryWalker::new(EntryNaming::Legacy)
            .walk(&root, &mut sink)
            .unwrap();

        let given = root.to_str().unwrap();
        let cleaned = tmp.path().join("root");
        let cleaned = cleaned.to_str().unwrap();
        let names: Vec<_> = sink.0.iter().map(|(e, _)| e.name.clone()).collect();
        assert_eq!(
            names,
            [
                given[1..].to_string(),
                format!("{}/a.txt", &given[1..]),
                format!("{}/sub", &cleaned[1..]),
                format!("{}/sub/b.txt", &cleaned[1..]),
                format!("{}/z.txt", &given[1..]),
            ]
        );
    }

    #[test]
    fn test_join_clean() {
        assert_eq!(join_clean("./root", "sub"), "root/sub");
        assert_eq!(join_clean("/abs/root", "sub"), "/abs/root/sub");
        assert_eq!(join_clean("root//x/", "sub"), "root/x/sub");
        assert_eq!(join_clean("../root", "sub"), "../root/sub");
        assert_eq!(join_clean("a/../b", "sub"), "b/sub");
        assert_eq!(join_clean("/..", "sub"), "/sub");
        assert_eq!(join_clean("", "sub"), "sub");
        assert_eq!(clean("./."), ".");
    }

    #[test]
    fn test_strip_first_char() {
        assert_eq!(strip_first_char("./root"), "/root");
        assert_eq!(strip_first_char("/tmp/x"), "tmp/x");
        assert_eq!(strip_first_char("."), "");
        assert_eq!(strip_first_char(""), "");
    }

    #[test]
    fn test_empty_directory_yields_only_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("empty");
        fs::create_dir(&root).unwrap();

        let mut sink = Collect::default();
        DirectoryWalker::default().walk(&root, &mut sink).unwrap();
        assert_eq!(sink.0.len(), 1);
        assert_eq!(sink.0[0].0.name, "empty");
        assert!(sink.0[0].0.is_directory());
    }

    #[test]
    fn test_missing_root_is_filesystem_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sink = Collect::default();
        let err = DirectoryWalker::default()
            .walk(&tmp.path().join("nope"), &mut sink)
            .unwrap_err();
        assert!(matches!(err, TarError::Filesystem { .. }));
        assert!(sink.0.is_empty());
    }

    #[test]
    fn test_file_root_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("f");
        fs::write(&file, "x").unwrap();
        let err = DirectoryWalker::default()
            .walk(&file, &mut Collect::default())
            .unwrap_err();
        assert!(matches!(err, TarError::InvalidSource(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_modes_and_symlinks() {
        use std::os::unix::fs::{symlink, PermissionsExt};

        let tmp = sample_tree();
        let root = tmp.path().join("root");
        fs::set_permissions(root.join("a.txt"), fs::Permissions::from_mode(0o640)).unwrap();
        symlink(root.join("a.txt"), root.join("link")).unwrap();

        let mut sink = Collect::default();
        DirectoryWalker::default().walk(&root, &mut sink).unwrap();

        assert_eq!(sink.0[1].0.mode, 0o640);
        assert!(sink.0.iter().all(|(e, _)| !e.name.ends_with("link")));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_abort_walk() {
        use std::os::unix::ffi::OsStrExt;

        let tmp = sample_tree();
        let root = tmp.path().join("root");
        fs::write(root.join(OsStr::from_bytes(b"a\xff")), "first").unwrap();
        fs::write(root.join(OsStr::from_bytes(b"a\xfe")), "second").unwrap();

        let mut sink = Collect::default();
        let err = DirectoryWalker::default()
            .walk(&root, &mut sink)
            .unwrap_err();
        assert!(matches!(err, TarError::InvalidSource(_)));
        assert!(sink.0.iter().all(|(e, _)| !e.name.contains('\u{fffd}')));
    }
}
