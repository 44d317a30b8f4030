use std::fs::Metadata;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::tgz::{ArchiveRecord, RecordKind, record_name};

/// A filesystem entry that maps onto one archive record.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    /// Location on the host filesystem.
    pub path: PathBuf,
    /// Persisted record name.
    pub name: String,
    pub kind: RecordKind,
    /// Payload length; zero for directories.
    pub size: u64,
    pub mode: u32,
    pub mtime: u64,
}

impl SourceEntry {
    pub fn to_record(&self) -> ArchiveRecord {
        match self.kind {
            RecordKind::Directory => ArchiveRecord::directory(self.name.clone(), self.mode, self.mtime),
            RecordKind::RegularFile => {
                ArchiveRecord::regular_file(self.name.clone(), self.size, self.mode, self.mtime)
            }
        }
    }
}

/// Pre-order iterator over everything below a source path.
///
/// Children are visited in file-name order, so the same tree always yields
/// the same sequence. For a directory source the root itself (depth 0) is
/// never yielded; a file source yields exactly one entry named after the file.
/// Symlinks and special files are skipped.
pub struct SourceWalker {
    root: PathBuf,
    single_file: bool,
    inner: walkdir::IntoIter,
}

impl SourceWalker {
    pub fn new(source: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(source).map_err(|source_err| Error::SourceNotFound {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        let single_file = !metadata.is_dir();

        let walker = WalkDir::new(source)
            .follow_links(false)
            .sort_by_file_name()
            .min_depth(if single_file { 0 } else { 1 });

        Ok(Self {
            root: source.to_path_buf(),
            single_file,
            inner: walker.into_iter(),
        })
    }

    /// Record name for an entry reached by the walk.
    fn name_for(&self, path: &Path, kind: RecordKind) -> Result<String> {
        if self.single_file {
            let base = path.file_name().map(Path::new).unwrap_or(path);
            return record_name(base, kind);
        }

        let relative = path.strip_prefix(&self.root).map_err(|_| Error::UnsafePath {
            name: path.display().to_string(),
        })?;
        record_name(relative, kind)
    }

    fn entry_for(&self, entry: walkdir::DirEntry) -> Result<Option<SourceEntry>> {
        let file_type = entry.file_type();
        let kind = if file_type.is_dir() {
            RecordKind::Directory
        } else if file_type.is_file() {
            RecordKind::RegularFile
        } else {
            log::warn!("skipping {}: not a regular file or directory", entry.path().display());
            return Ok(None);
        };

        let metadata = entry
            .metadata()
            .map_err(|err| walk_error(entry.path(), err))?;
        let name = self.name_for(entry.path(), kind)?;

        Ok(Some(SourceEntry {
            path: entry.into_path(),
            name,
            kind,
            size: if kind.is_directory() { 0 } else { metadata.len() },
            mode: permission_bits(&metadata, kind),
            mtime: modified_secs(&metadata),
        }))
    }
}

impl Iterator for SourceWalker {
    type Item = Result<SourceEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                    return Some(Err(walk_error(&path, err)));
                }
            };

            match self.entry_for(entry) {
                Ok(Some(entry)) => return Some(Ok(entry)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

fn walk_error(path: &Path, err: walkdir::Error) -> Error {
    Error::io("walk", path, err.into())
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata, _kind: RecordKind) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata, kind: RecordKind) -> u32 {
    use crate::tgz::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE};

    let mode = match kind {
        RecordKind::Directory => DEFAULT_DIR_MODE,
        RecordKind::RegularFile => DEFAULT_FILE_MODE,
    };
    if metadata.permissions().readonly() {
        mode & !0o222
    } else {
        mode
    }
}

fn modified_secs(metadata: &Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
