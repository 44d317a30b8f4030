use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use flate2::write::GzEncoder;

use crate::error::{Error, Result};
use crate::io::{ArchiveOutput, SourceEntry, SourceWalker};

use super::options::{ArchiveOptions, Summary};
use super::record::RecordKind;

/// Builds `.tar.gz` archives from a directory tree or a single file.
#[derive(Clone, Debug, Default)]
pub struct Archiver {
    opts: ArchiveOptions,
}

impl Archiver {
    pub fn new(opts: ArchiveOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &ArchiveOptions {
        &self.opts
    }

    /// Archive `source` into the file `target`.
    ///
    /// The source is checked before the target is touched, so a missing
    /// source never leaves an output file behind. With atomic writes (the
    /// default) a failure part way through leaves no target either; without
    /// them the truncated target stays on disk.
    pub fn archive<P: AsRef<Path>, Q: AsRef<Path>>(&self, source: P, target: Q) -> Result<Summary> {
        let source = source.as_ref();
        let target = target.as_ref();

        let walker = SourceWalker::new(source)?;
        let output = ArchiveOutput::create(target, self.opts.atomic_writes)?;

        let (summary, output) = self.write_records(walker, output, target)?;
        output.commit()?;

        log::debug!(
            "archived {} files and {} directories ({} bytes) into {}",
            summary.files,
            summary.directories,
            summary.bytes,
            target.display()
        );
        Ok(summary)
    }

    /// Archive `source` into an arbitrary writer.
    pub fn archive_to_writer<P: AsRef<Path>, W: Write>(&self, source: P, writer: W) -> Result<Summary> {
        let walker = SourceWalker::new(source.as_ref())?;
        let (summary, _writer) = self.write_records(walker, writer, Path::new("<stream>"))?;
        Ok(summary)
    }

    /// Streams every walked entry through tar + gzip and hands the writer back
    /// once the end marker and the gzip trailer are flushed.
    fn write_records<W: Write>(&self, walker: SourceWalker, writer: W, label: &Path) -> Result<(Summary, W)> {
        let buffered = BufWriter::with_capacity(self.opts.buffer_size, writer);
        let encoder = GzEncoder::new(buffered, self.opts.compression());
        let mut builder = tar::Builder::new(encoder);
        let mut summary = Summary::default();

        for entry in walker {
            let entry = entry?;
            append_entry(&mut builder, &entry)?;
            summary.add(&entry.to_record());
        }

        let encoder = builder
            .into_inner()
            .map_err(|e| Error::io("finish tar stream in", label, e))?;
        let buffered = encoder
            .finish()
            .map_err(|e| Error::io("finish gzip stream in", label, e))?;
        let writer = buffered
            .into_inner()
            .map_err(|e| Error::io("flush", label, e.into_error()))?;

        Ok((summary, writer))
    }
}

/// Writes one header and, for regular files, exactly `size` payload bytes.
fn append_entry<W: Write>(builder: &mut tar::Builder<W>, entry: &SourceEntry) -> Result<()> {
    let record = entry.to_record();
    let mut header = record.to_header();
    log::debug!("  adding: {}", record.name);

    match record.kind {
        RecordKind::Directory => builder
            .append_data(&mut header, &record.name, io::empty())
            .map_err(|e| Error::io("write directory header for", &entry.path, e)),
        RecordKind::RegularFile => {
            let file = File::open(&entry.path).map_err(|e| Error::io("open", &entry.path, e))?;
            let mut payload = file.take(record.size);
            builder
                .append_data(&mut header, &record.name, &mut payload)
                .map_err(|e| Error::io("archive", &entry.path, e))?;

            // The header already promised `size` bytes.
            if payload.limit() > 0 {
                return Err(Error::io(
                    "archive",
                    &entry.path,
                    io::Error::new(io::ErrorKind::UnexpectedEof, "file shrank while being archived"),
                ));
            }
            Ok(())
        }
    }
}
