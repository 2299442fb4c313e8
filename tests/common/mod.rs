#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use du_dedup::{EntryKind, EntryMetadata, FileIdentity, Filesystem, UsageRecord};

pub const DEVICE: u64 = 1;

/// Filesystem fixture with exact block and link counts.
#[derive(Default)]
pub struct MemoryFs {
    entries: BTreeMap<PathBuf, EntryMetadata>,
    unlistable: BTreeSet<PathBuf>,
    broken_metadata: BTreeSet<PathBuf>,
    broken_entries: BTreeSet<PathBuf>,
    dot_entries: bool,
    next_inode: u64,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self {
            next_inode: 1000,
            ..Self::default()
        }
    }

    fn fresh_identity(&mut self) -> FileIdentity {
        self.next_inode += 1;
        FileIdentity::new(DEVICE, self.next_inode)
    }

    pub fn dir(mut self, path: &str, blocks: u64) -> Self {
        let identity = self.fresh_identity();
        self.entries.insert(
            PathBuf::from(path),
            EntryMetadata {
                kind: EntryKind::Directory,
                blocks,
                nlink: 2,
                identity,
            },
        );
        self
    }

    pub fn file(mut self, path: &str, blocks: u64) -> Self {
        let identity = self.fresh_identity();
        self.entries.insert(
            PathBuf::from(path),
            EntryMetadata {
                kind: EntryKind::Other,
                blocks,
                nlink: 1,
                identity,
            },
        );
        self
    }

    /// One name of a file with `nlink` names, all sharing `inode`.
    pub fn hardlink(mut self, path: &str, blocks: u64, inode: u64, nlink: u64) -> Self {
        self.entries.insert(
            PathBuf::from(path),
            EntryMetadata {
                kind: EntryKind::Other,
                blocks,
                nlink,
                identity: FileIdentity::new(DEVICE, inode),
            },
        );
        self
    }

    pub fn raw(mut self, path: &str, metadata: EntryMetadata) -> Self {
        self.entries.insert(PathBuf::from(path), metadata);
        self
    }

    /// Listing `path` fails as if permission were denied.
    pub fn deny_listing(mut self, path: &str) -> Self {
        self.unlistable.insert(PathBuf::from(path));
        self
    }

    /// `path` shows up in its parent's listing but its metadata cannot be read.
    pub fn break_metadata(mut self, path: &str) -> Self {
        self.broken_metadata.insert(PathBuf::from(path));
        self
    }

    /// Listing `path` yields one unreadable entry before the real ones.
    pub fn break_entry(mut self, path: &str) -> Self {
        self.broken_entries.insert(PathBuf::from(path));
        self
    }

    /// Listings start with `.` and `..` like readdir(3).
    pub fn with_dot_entries(mut self) -> Self {
        self.dot_entries = true;
        self
    }

    pub fn blocks(&self, path: &str) -> u64 {
        self.entries[Path::new(path)].blocks
    }
}

impl Filesystem for MemoryFs {
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
        if self.broken_metadata.contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied"));
        }
        self.entries
            .get(path)
            .copied()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "No such file or directory"))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<io::Result<OsString>>> {
        if self.unlistable.contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied"));
        }
        match self.entries.get(path) {
            Some(metadata) if metadata.kind == EntryKind::Directory => {}
            Some(_) => return Err(io::Error::other("Not a directory")),
            None => return Err(io::Error::new(io::ErrorKind::NotFound, "No such file or directory")),
        }

        let mut names = Vec::new();
        if self.dot_entries {
            names.push(Ok(OsString::from(".")));
            names.push(Ok(OsString::from("..")));
        }
        if self.broken_entries.contains(path) {
            names.push(Err(io::Error::other("Input/output error")));
        }
        let children = self
            .entries
            .keys()
            .chain(self.broken_metadata.iter())
            .filter(|child| child.parent() == Some(path))
            .filter_map(|child| child.file_name().map(|n| n.to_os_string()))
            .collect::<BTreeSet<_>>();
        names.extend(children.into_iter().map(Ok));
        Ok(names)
    }
}

/// Three levels, one singly-linked file, one file linked from two directories.
///
/// ```text
/// root/            4
/// root/F1         10   nlink 1
/// root/a/          4
/// root/a/F2a      20   inode 77, nlink 2
/// root/a/b/        4
/// root/a/b/deep    8   nlink 1
/// root/c/          4
/// root/c/F2b      20   inode 77, nlink 2
/// ```
pub fn nested_fixture() -> MemoryFs {
    MemoryFs::new()
        .dir("root", 4)
        .file("root/F1", 10)
        .dir("root/a", 4)
        .hardlink("root/a/F2a", 20, 77, 2)
        .dir("root/a/b", 4)
        .file("root/a/b/deep", 8)
        .dir("root/c", 4)
        .hardlink("root/c/F2b", 20, 77, 2)
}

pub fn record(blocks: u64, path: &str) -> UsageRecord {
    UsageRecord::new(blocks, Path::new(path))
}

pub fn paths(records: &[UsageRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.path.to_string_lossy().into_owned())
        .collect()
}
