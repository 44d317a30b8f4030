use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use tar::EntryType;

use crate::error::{Error, Result};

use super::options::{ExtractOptions, Summary};
use super::record::{ArchiveRecord, RecordKind};

/// First two bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Fixed part of a gzip member header: magic, method, flags, mtime, xfl, os.
const GZIP_HEADER_LEN: usize = 10;
const GZIP_METHOD_DEFLATE: u8 = 8;
/// FLG bits 5 to 7 are reserved and must be zero.
const GZIP_RESERVED_FLAGS: u8 = 0xe0;

type Decoder<R> = MultiGzDecoder<io::Chain<io::Cursor<[u8; GZIP_HEADER_LEN]>, R>>;

/// Reads `.tar.gz` archives and recreates their tree on disk.
#[derive(Clone, Debug, Default)]
pub struct Extractor {
    opts: ExtractOptions,
}

impl Extractor {
    pub fn new(opts: ExtractOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.opts
    }

    /// Extract the archive at `archive` below `dest`, creating `dest` as needed.
    ///
    /// Nothing is created when the input is not a gzip stream or its first
    /// record does not decode. Once records are being written, a failure aborts the run and leaves whatever was already
    /// extracted in place.
    pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(&self, archive: P, dest: Q) -> Result<Summary> {
        let archive = archive.as_ref();
        let dest = dest.as_ref();

        let decoder = self.open(archive)?;
        let summary = self.unpack(decoder, dest)?;

        log::debug!(
            "extracted {} files and {} directories ({} bytes) into {}",
            summary.files,
            summary.directories,
            summary.bytes,
            dest.display()
        );
        Ok(summary)
    }

    /// Extract an archive read from an arbitrary reader.
    pub fn extract_from_reader<R: Read, Q: AsRef<Path>>(&self, reader: R, dest: Q) -> Result<Summary> {
        let reader = BufReader::with_capacity(self.opts.buffer_size, reader);
        let decoder = gzip_decoder(reader, Path::new("<stream>"))?;
        self.unpack(decoder, dest.as_ref())
    }

    /// Decode every record header without writing anything.
    pub fn list<P: AsRef<Path>>(&self, archive: P) -> Result<Vec<ArchiveRecord>> {
        let decoder = self.open(archive.as_ref())?;
        let mut archive = tar::Archive::new(decoder);
        let entries = archive.entries().map_err(corrupt)?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(corrupt)?;
            if is_metadata_only(&entry) {
                continue;
            }
            records.push(ArchiveRecord::from_entry(&entry)?);
        }
        Ok(records)
    }

    fn open(&self, archive: &Path) -> Result<Decoder<BufReader<File>>> {
        let file = File::open(archive).map_err(|e| Error::io("open", archive, e))?;
        gzip_decoder(BufReader::with_capacity(self.opts.buffer_size, file), archive)
    }

    fn unpack<R: Read>(&self, decoder: R, dest: &Path) -> Result<Summary> {
        let mut directory_modes = Vec::new();
        let outcome = self.unpack_records(decoder, dest, &mut directory_modes);

        // Directories extracted before an abort still get their recorded mode.
        let applied = self.apply_directory_modes(&directory_modes);
        let summary = outcome?;
        applied?;
        Ok(summary)
    }

    /// Materializes records until the end marker or the first failure.
    ///
    /// `dest` is only created once a record has decoded (or the archive turned
    /// out to be empty), so a stream that is not tar leaves nothing behind.
    fn unpack_records<R: Read>(
        &self,
        decoder: R,
        dest: &Path,
        directory_modes: &mut Vec<(PathBuf, u32)>,
    ) -> Result<Summary> {
        let mut archive = tar::Archive::new(decoder);
        let entries = archive.entries().map_err(corrupt)?;
        let mut summary = Summary::default();
        let mut dest_created = false;

        for entry in entries {
            let mut entry = entry.map_err(corrupt)?;
            if is_metadata_only(&entry) {
                log::debug!("skipping pax global header");
                continue;
            }

            let record = ArchiveRecord::from_entry(&entry)?;
            let path = dest.join(record.relative_path()?);
            if !dest_created {
                create_dir_all(dest)?;
                dest_created = true;
            }
            log::debug!("  extracting: {}", record.name);

            match record.kind {
                RecordKind::Directory => {
                    create_dir_all(&path)?;
                    directory_modes.push((path, record.mode));
                }
                RecordKind::RegularFile => self.write_file(&mut entry, &record, &path)?,
            }
            summary.add(&record);
        }

        if !dest_created {
            create_dir_all(dest)?;
        }
        Ok(summary)
    }

    /// Deepest first, so a read-only parent does not block its children.
    fn apply_directory_modes(&self, directory_modes: &[(PathBuf, u32)]) -> Result<()> {
        if !self.opts.preserve_permissions {
            return Ok(());
        }
        for (path, mode) in directory_modes.iter().rev() {
            set_mode(path, *mode)?;
        }
        Ok(())
    }

    /// Copies exactly `record.size` payload bytes into `path`.
    fn write_file<R: Read>(&self, entry: &mut tar::Entry<'_, R>, record: &ArchiveRecord, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            if self.opts.preserve_permissions {
                options.mode(record.mode);
            }
        }
        let file = options.open(path).map_err(|e| Error::io("create", path, e))?;

        let failed = |source: io::Error| Error::ExtractionFailed {
            name: record.name.clone(),
            source,
        };

        let mut out = BufWriter::with_capacity(self.opts.buffer_size, file);
        let copied = io::copy(entry, &mut out).map_err(failed)?;
        if copied != record.size {
            return Err(failed(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes, archive held {}", record.size, copied),
            )));
        }
        out.flush().map_err(failed)?;

        Ok(())
    }
}

/// Validates the fixed gzip member header before any decoding, then rewinds
/// over it.
fn gzip_decoder<R: Read>(mut reader: R, origin: &Path) -> Result<Decoder<R>> {
    let invalid = || Error::InvalidArchive {
        path: origin.to_path_buf(),
    };

    let mut header = [0u8; GZIP_HEADER_LEN];
    match reader.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(invalid()),
        Err(e) => return Err(Error::io("read", origin, e)),
    }

    if header[..2] != GZIP_MAGIC
        || header[2] != GZIP_METHOD_DEFLATE
        || header[3] & GZIP_RESERVED_FLAGS != 0
    {
        return Err(invalid());
    }

    Ok(MultiGzDecoder::new(io::Cursor::new(header).chain(reader)))
}

fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io("create directory", path, e))
}

fn corrupt(source: io::Error) -> Error {
    Error::CorruptArchive { source }
}

/// Pax global headers describe the archive, not an entry.
fn is_metadata_only<R: Read>(entry: &tar::Entry<'_, R>) -> bool {
    entry.header().entry_type() == EntryType::XGlobalHeader
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| Error::io("set permissions on", path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
