//! `.tar.gz` archive encoding and decoding.
//!
//! ## Architecture
//!
//! - [`record`]: the record model shared by both directions (kinds, names, path rules)
//! - [`archiver`]: walks a source and streams records through tar + gzip
//! - [`extractor`]: reads records back and recreates the tree
//! - [`options`]: tuning knobs and run summaries
//!
//! ## Stream layout
//!
//! An archive is a single gzip stream holding a tar stream:
//! 1. For every entry, a 512-byte GNU header (name, kind, size, mode, mtime)
//! 2. For regular files, the payload padded to a 512-byte boundary
//! 3. Two zero blocks marking the end of the records
//!
//! Records appear in pre-order: a directory comes before anything inside it.
//! The archived root itself is never a record.
//!
//! ## Limitations
//!
//! - Only directories and regular files; links and special files are skipped
//!   when archiving and rejected when extracting
//! - No append or in-place update
//! - No encryption

mod archiver;
mod extractor;
mod options;
mod record;

pub use archiver::Archiver;
pub use extractor::{Extractor, GZIP_MAGIC};
pub use options::{ArchiveOptions, ExtractOptions, Summary};
pub use record::*;
