use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::identity::FileIdentity;

#[cfg(target_os = "linux")]
pub const PATH_MAX: usize = 4096;
#[cfg(not(target_os = "linux"))]
pub const PATH_MAX: usize = 1024;

/// Size of the unit `EntryMetadata::blocks` is counted in.
pub const RAW_BLOCK_SIZE: u64 = 512;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    /// Regular files, symlinks, devices, sockets: anything that is not walked into.
    Other,
}

/// What the walker needs to know about one entry, from a query that does
/// not follow symbolic links.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryMetadata {
    pub kind: EntryKind,
    /// Allocated storage in 512-byte units.
    pub blocks: u64,
    pub nlink: u64,
    pub identity: FileIdentity,
}

impl EntryMetadata {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    #[cfg(unix)]
    pub fn from_std(metadata: &fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            kind: Self::kind_of(metadata),
            blocks: metadata.blocks(),
            nlink: metadata.nlink(),
            identity: FileIdentity::new(metadata.dev(), metadata.ino()),
        }
    }

    #[cfg(not(unix))]
    pub fn from_std(metadata: &fs::Metadata) -> Self {
        // No block or link information; every entry is its own identity.
        Self {
            kind: Self::kind_of(metadata),
            blocks: metadata.len().div_ceil(RAW_BLOCK_SIZE),
            nlink: 1,
            identity: FileIdentity::new(0, 0),
        }
    }

    fn kind_of(metadata: &fs::Metadata) -> EntryKind {
        if metadata.file_type().is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        }
    }
}

/// Metadata queries and directory listings the walker depends on.
pub trait Filesystem {
    /// Metadata of `path` itself; symbolic links are not followed.
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata>;

    /// Names of the entries in directory `path`, in a stable order.
    ///
    /// The outer error means the directory could not be opened; an inner
    /// error is one entry that could not be read.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<io::Result<OsString>>>;
}

/// The real filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
        fs::symlink_metadata(path).map(|m| EntryMetadata::from_std(&m))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<io::Result<OsString>>> {
        let walker = WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false);

        let mut names = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => names.push(Ok(entry.file_name().to_os_string())),
                // Depth 0 is the directory itself: opening it failed.
                Err(err) if err.depth() == 0 => return Err(into_io_error(err)),
                Err(err) => names.push(Err(into_io_error(err))),
            }
        }
        names.sort_by(|a, b| match (a, b) {
            (Ok(a), Ok(b)) => a.cmp(b),
            (Ok(_), Err(_)) => std::cmp::Ordering::Greater,
            (Err(_), Ok(_)) => std::cmp::Ordering::Less,
            (Err(_), Err(_)) => std::cmp::Ordering::Equal,
        });
        Ok(names)
    }
}

fn into_io_error(err: walkdir::Error) -> io::Error {
    let message = err.to_string();
    err.into_io_error().unwrap_or_else(|| io::Error::other(message))
}

/// Joins `name` onto `parent` with exactly one separator.
pub fn join_child(parent: &Path, name: &OsStr) -> Result<PathBuf> {
    let path = parent.join(name);
    // PATH_MAX counts the terminating NUL.
    if path.as_os_str().len() >= PATH_MAX {
        return Err(Error::PathTooLong { path });
    }
    Ok(path)
}
