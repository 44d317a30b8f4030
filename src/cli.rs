use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::error::{Error, Result};

/// Suffix appended to a directory name when compressing.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Suffixes stripped from an archive name to derive the extraction directory.
pub const RECOGNIZED_SUFFIXES: &[&str] = &[".tar.gz", ".tgz"];

#[derive(Parser, Debug)]
#[command(name = "rtargz")]
#[command(version)]
#[command(about = "Compress a directory to .tar.gz, or extract a .tar.gz archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  rtargz photos              compress photos/ into photos.tar.gz\n  \
  rtargz photos.tar.gz       extract into ./photos\n  \
  rtargz -l photos.tar.gz    list the records of photos.tar.gz")]
pub struct Cli {
    /// Directory (=compress) or archive file (=decompress)
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// List archive contents instead of extracting
    #[arg(short = 'l')]
    pub list: bool,

    /// Extract into DIR instead of a directory named after the archive
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<PathBuf>,

    /// Compression level, 0 (store) to 9 (best)
    #[arg(long, value_name = "N", default_value_t = 9, value_parser = clap::value_parser!(u32).range(0..=9))]
    pub level: u32,

    /// Verbose output (-vv => trace every record)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    /// Log level implied by `-v` / `-q`.
    pub fn log_level(&self) -> log::LevelFilter {
        match (self.quiet, self.verbose) {
            (q, _) if q > 1 => log::LevelFilter::Error,
            (1, _) => log::LevelFilter::Warn,
            (_, 0) => log::LevelFilter::Info,
            (_, 1) => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    pub fn mode(&self) -> Result<Mode> {
        Mode::detect(&self.path, self.extract_dir.as_deref())
    }
}

/// What a run does, decided from the filesystem type of the argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Compress { source: PathBuf, target: PathBuf },
    Decompress { archive: PathBuf, dest: PathBuf },
}

impl Mode {
    /// A directory is compressed next to itself; anything else is treated as
    /// an archive and extracted into the current directory (or `extract_dir`).
    pub fn detect(path: &Path, extract_dir: Option<&Path>) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|source| Error::SourceNotFound {
            path: path.to_path_buf(),
            source,
        })?;

        if metadata.is_dir() {
            let source = trim_trailing_separators(path);
            let target = archive_path_for(&source)?;
            return Ok(Mode::Compress { source, target });
        }

        let dest = match extract_dir {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from(extraction_dir_name(path)),
        };
        Ok(Mode::Decompress {
            archive: path.to_path_buf(),
            dest,
        })
    }
}

/// `photos/` and `photos` name the same directory; the archive is `photos.tar.gz`.
fn trim_trailing_separators(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let trimmed = raw.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() || trimmed.len() == raw.len() {
        // Either the filesystem root or nothing to trim.
        return path.to_path_buf();
    }
    PathBuf::from(trimmed)
}

/// `<dir>.tar.gz` beside the directory.
///
/// `.` and `..` have no name of their own; they are resolved first so the
/// archive never lands inside the tree being walked.
fn archive_path_for(source: &Path) -> Result<PathBuf> {
    let resolved;
    let dir = if source.file_name().is_some() {
        source
    } else {
        resolved = std::fs::canonicalize(source).map_err(|e| Error::io("resolve", source, e))?;
        resolved.as_path()
    };

    let Some(name) = dir.file_name() else {
        return Err(Error::io(
            "name an archive for",
            dir,
            io::Error::new(io::ErrorKind::InvalidInput, "directory has no name"),
        ));
    };
    let mut archive_name = name.to_os_string();
    archive_name.push(ARCHIVE_SUFFIX);
    Ok(dir.with_file_name(archive_name))
}

/// Base file name with the archive suffix stripped.
///
/// Names without a recognized suffix get `.d` appended so the directory
/// never collides with the archive itself.
fn extraction_dir_name(archive: &Path) -> OsString {
    let base = archive
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    for suffix in RECOGNIZED_SUFFIXES {
        if let Some(stem) = base.strip_suffix(suffix) {
            if !stem.is_empty() {
                return OsString::from(stem);
            }
        }
    }
    OsString::from(format!("{base}.d"))
}
