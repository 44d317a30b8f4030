use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Destination of an archive being written.
///
/// In atomic mode the bytes go to a temporary file next to the target and
/// only [`ArchiveOutput::commit`] renames it into place. Dropping an
/// uncommitted output removes the temporary file, so a failed run leaves
/// nothing behind. Direct mode truncates the target up front.
pub enum ArchiveOutput {
    Atomic { tmp: NamedTempFile, target: PathBuf },
    Direct { file: File, target: PathBuf },
}

impl ArchiveOutput {
    pub fn create(target: &Path, atomic: bool) -> Result<Self> {
        if !atomic {
            let file = File::create(target).map_err(|e| Error::io("create", target, e))?;
            return Ok(ArchiveOutput::Direct {
                file,
                target: target.to_path_buf(),
            });
        }

        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = tempfile::Builder::new()
            .prefix(".rtargz-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| Error::io("create temporary file in", dir, e))?;

        Ok(ArchiveOutput::Atomic {
            tmp,
            target: target.to_path_buf(),
        })
    }

    /// Syncs the written bytes and, in atomic mode, moves them over the target.
    pub fn commit(self) -> Result<()> {
        match self {
            ArchiveOutput::Direct { file, target } => {
                file.sync_all().map_err(|e| Error::io("sync", &target, e))
            }
            ArchiveOutput::Atomic { tmp, target } => {
                tmp.as_file()
                    .sync_all()
                    .map_err(|e| Error::io("sync", tmp.path(), e))?;

                // Temporary files are created 0600; archives are ordinary files.
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    tmp.as_file()
                        .set_permissions(std::fs::Permissions::from_mode(0o644))
                        .map_err(|e| Error::io("set permissions on", tmp.path(), e))?;
                }

                tmp.persist(&target)
                    .map_err(|e| Error::io("rename into", &target, e.error))?;
                Ok(())
            }
        }
    }

    fn writer(&mut self) -> &mut File {
        match self {
            ArchiveOutput::Atomic { tmp, .. } => tmp.as_file_mut(),
            ArchiveOutput::Direct { file, .. } => file,
        }
    }
}

impl Write for ArchiveOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer().flush()
    }
}
