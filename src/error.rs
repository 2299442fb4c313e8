use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// The non-following metadata query on a path failed.
    MetadataUnavailable { path: PathBuf, source: io::Error },
    /// A path known to be a directory could not be opened for listing.
    DirectoryUnreadable { path: PathBuf, source: io::Error },
    /// A single entry of an opened listing could not be read.
    EntryUnreadable { path: PathBuf, source: io::Error },
    /// Joining a child name onto its parent would exceed the platform limit.
    PathTooLong { path: PathBuf },
    /// The identity set could not grow.
    AllocationFailure(TryReserveError),
    /// Writing a usage record failed.
    Output(io::Error),
}

impl Error {
    /// Fatal errors end the run; everything else is reported and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(*self, Error::AllocationFailure(_) | Error::Output(_))
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match *self {
            Error::MetadataUnavailable { ref path, .. }
            | Error::DirectoryUnreadable { ref path, .. }
            | Error::EntryUnreadable { ref path, .. }
            | Error::PathTooLong { ref path } => Some(path),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::MetadataUnavailable { ref path, ref source }
            | Error::DirectoryUnreadable { ref path, ref source }
            | Error::EntryUnreadable { ref path, ref source } => {
                write!(f, "{}: {}", path.display(), describe(source))
            }
            Error::PathTooLong { ref path } => write!(f, "{}: File name too long", path.display()),
            Error::AllocationFailure(ref err) => write!(f, "identity set allocation failed: {err}"),
            Error::Output(ref err) => write!(f, "failed to write usage record: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::MetadataUnavailable { ref source, .. }
            | Error::DirectoryUnreadable { ref source, .. }
            | Error::EntryUnreadable { ref source, .. } => Some(source),
            Error::AllocationFailure(ref err) => Some(err),
            Error::Output(ref err) => Some(err),
            Error::PathTooLong { .. } => None,
        }
    }
}

/// The system's description of `err`, without the `(os error N)` suffix,
/// as perror(3) prints it.
fn describe(err: &io::Error) -> String {
    let mut text = err.to_string();
    if let Some(code) = err.raw_os_error() {
        let suffix = format!(" (os error {code})");
        if text.ends_with(&suffix) {
            text.truncate(text.len() - suffix.len());
        }
    }
    text
}

impl From<TryReserveError> for Error {
    fn from(error: TryReserveError) -> Self {
        Error::AllocationFailure(error)
    }
}
