use ::tar::EntryType;

/// Size of a tar block. Headers occupy one block, payloads are padded to it.
pub const BLOCK_SIZE: usize = 512;

/// Number of all-zero blocks terminating an archive.
pub const END_BLOCKS: usize = 2;

/// Kind of an archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    RegularFile,
    /// Any other type flag (links, devices, extension headers). Never written.
    Other(u8),
}

impl EntryKind {
    pub fn from_entry_type(ty: EntryType, name: &str) -> Self {
        match ty {
            EntryType::Directory => EntryKind::Directory,
            // pre-POSIX archives mark directories with a trailing slash only
            EntryType::Regular if name.ends_with('/') => EntryKind::Directory,
            EntryType::Regular => EntryKind::RegularFile,
            other => EntryKind::Other(other.as_byte()),
        }
    }

    pub fn entry_type(&self) -> EntryType {
        match self {
            EntryKind::Directory => EntryType::Directory,
            EntryKind::RegularFile => EntryType::Regular,
            EntryKind::Other(v) => EntryType::new(*v),
        }
    }
}

/// Metadata of one record in the archive stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Permission bits (`0o7777` at most).
    pub mode: u32,
    /// Payload length; always 0 for directories.
    pub size: u64,
    /// Modification time, seconds since the epoch.
    pub mtime: u64,
}

impl ArchiveEntry {
    pub fn directory(name: impl Into<String>, mode: u32) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            mode,
            size: 0,
            mtime: 0,
        }
    }

    pub fn file(name: impl Into<String>, mode: u32, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::RegularFile,
            mode,
            size,
            mtime: 0,
        }
    }

    pub fn with_mtime(mut self, mtime: u64) -> Self {
        self.mtime = mtime;
        self
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Zero bytes following the payload in the stream.
    pub fn padding(&self) -> u64 {
        padding(self.size)
    }
}

/// Number of zero bytes that pad a payload of `len` bytes to a block boundary.
pub fn padding(len: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    (block - len % block) % block
}

/// How entry names are derived from traversal paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum EntryNaming {
    /// Name of the source root followed by the path below it.
    #[default]
    Relative,
    /// Traversal path with its first character removed.
    Legacy,
}
