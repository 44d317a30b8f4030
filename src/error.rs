//! Error types for archive and extract operations.
//!
//! Every fallible operation in the library returns [`Result<T>`]. The binary
//! wraps these in `anyhow` for presentation; callers that need to react to a
//! specific failure can match on the [`Error`] variants directly.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the archiver and the extractor.
#[derive(Error, Debug)]
pub enum Error {
    /// The path to archive does not exist or cannot be stat-ed.
    #[error("source not found: {}", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A filesystem or stream operation failed.
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input is not a gzip-compressed stream.
    #[error("not a tar.gz archive: {}", path.display())]
    InvalidArchive { path: PathBuf },

    /// A record header could not be decoded mid-stream.
    #[error("corrupt archive: {source}")]
    CorruptArchive {
        #[source]
        source: io::Error,
    },

    /// A record kind other than directory or regular file.
    #[error("unsupported entry type {kind:#04x} for '{name}'")]
    UnsupportedEntryType { name: String, kind: u8 },

    /// Copying a record payload to disk failed.
    #[error("failed to extract '{name}': {source}")]
    ExtractionFailed {
        name: String,
        #[source]
        source: io::Error,
    },

    /// A record name that would land outside the destination directory.
    #[error("refusing to extract unsafe path '{name}'")]
    UnsafePath { name: String },

    /// Archive record names must be valid UTF-8.
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path { path: PathBuf },
}

impl Error {
    /// Builds an [`Error::Io`] for `action` on `path`.
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Returns true when the archive itself is at fault rather than the host.
    pub fn is_malformed_archive(&self) -> bool {
        matches!(
            self,
            Error::InvalidArchive { .. }
                | Error::CorruptArchive { .. }
                | Error::UnsupportedEntryType { .. }
                | Error::UnsafePath { .. }
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
