use std::io::Read;
use std::path::{Component, Path, PathBuf};

use tar::{EntryType, Header};

use crate::error::{Error, Result};

/// Permission bits carried by a record.
pub const MODE_MASK: u32 = 0o7777;

/// Modes used when the host filesystem has no Unix permission bits.
pub const DEFAULT_DIR_MODE: u32 = 0o755;
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Kinds of entries an archive may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Directory,
    RegularFile,
}

impl RecordKind {
    /// Maps a tar entry type onto a record kind.
    ///
    /// Returns `None` for every type this tool does not reproduce
    /// (links, devices, FIFOs, sparse files, ...).
    pub fn from_entry_type(entry_type: EntryType) -> Option<Self> {
        match entry_type {
            EntryType::Directory => Some(RecordKind::Directory),
            EntryType::Regular => Some(RecordKind::RegularFile),
            _ => None,
        }
    }

    pub fn entry_type(&self) -> EntryType {
        match self {
            RecordKind::Directory => EntryType::Directory,
            RecordKind::RegularFile => EntryType::Regular,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, RecordKind::Directory)
    }
}

/// One header of the archive stream.
///
/// For [`RecordKind::RegularFile`] exactly `size` payload bytes follow the
/// header in the stream; directories carry no payload and `size` is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    /// Slash-separated name, relative to the archived root.
    /// Directory names end with `/`.
    pub name: String,
    pub kind: RecordKind,
    pub size: u64,
    pub mode: u32,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: u64,
}

impl ArchiveRecord {
    pub fn directory(name: String, mode: u32, mtime: u64) -> Self {
        Self {
            name,
            kind: RecordKind::Directory,
            size: 0,
            mode: mode & MODE_MASK,
            mtime,
        }
    }

    pub fn regular_file(name: String, size: u64, mode: u32, mtime: u64) -> Self {
        Self {
            name,
            kind: RecordKind::RegularFile,
            size,
            mode: mode & MODE_MASK,
            mtime,
        }
    }

    /// Builds the GNU header for this record.
    ///
    /// The path is not set here: `tar::Builder::append_data` writes it, adding
    /// a GNU long-name extension when the name does not fit the header.
    pub fn to_header(&self) -> Header {
        let mut header = Header::new_gnu();
        header.set_entry_type(self.kind.entry_type());
        header.set_size(self.size);
        header.set_mode(self.mode);
        header.set_mtime(self.mtime);
        header.set_cksum();
        header
    }

    /// Decodes the record described by a tar entry.
    pub fn from_entry<R: Read>(entry: &tar::Entry<'_, R>) -> Result<Self> {
        let name = String::from_utf8(entry.path_bytes().into_owned()).map_err(|e| Error::NonUtf8Path {
            path: PathBuf::from(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        })?;
        let header = entry.header();
        let entry_type = header.entry_type();

        let kind = RecordKind::from_entry_type(entry_type).ok_or_else(|| {
            Error::UnsupportedEntryType {
                name: name.clone(),
                kind: entry_type.as_byte(),
            }
        })?;

        let mode = header
            .mode()
            .map_err(|source| Error::CorruptArchive { source })?;
        let mtime = header
            .mtime()
            .map_err(|source| Error::CorruptArchive { source })?;

        Ok(match kind {
            RecordKind::Directory => Self::directory(name, mode, mtime),
            RecordKind::RegularFile => Self::regular_file(name, entry.size(), mode, mtime),
        })
    }

    /// Resolves the persisted name to a path relative to the destination.
    ///
    /// `.` components are dropped. Absolute names and `..` components are
    /// rejected so a record can never be written outside the destination.
    pub fn relative_path(&self) -> Result<PathBuf> {
        let unsafe_path = || Error::UnsafePath {
            name: self.name.clone(),
        };

        let normalized = normalize_separators(&self.name);
        if normalized.starts_with('/') {
            return Err(unsafe_path());
        }

        let mut path = PathBuf::new();
        for component in Path::new(&normalized).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(unsafe_path());
                }
            }
        }

        // Only a directory record may name the destination itself ("./").
        if path.as_os_str().is_empty() && !self.kind.is_directory() {
            return Err(unsafe_path());
        }

        Ok(path)
    }
}

/// Replaces backslash separators with forward slashes.
pub fn normalize_separators(name: &str) -> String {
    name.replace('\\', "/")
}

/// Builds the persisted record name for a path relative to the archived root.
///
/// Components are joined with `/` whatever the host separator is, and
/// directories get a trailing `/`.
pub fn record_name(relative: &Path, kind: RecordKind) -> Result<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| Error::NonUtf8Path {
                    path: relative.to_path_buf(),
                })?;
                parts.push(part);
            }
            Component::CurDir => {}
            _ => {
                return Err(Error::UnsafePath {
                    name: relative.display().to_string(),
                });
            }
        }
    }

    let mut name = normalize_separators(&parts.join("/"));
    if kind.is_directory() {
        name.push('/');
    }
    Ok(name)
}
