//! # rtargz
//!
//! A Rust `.tar.gz` utility: pack a directory (or a single file) into a
//! gzip-compressed tar archive, and unpack such an archive back into a tree.
//!
//! The command-line tool takes one path. A directory is compressed into
//! `<dir>.tar.gz` next to it; a file is extracted into a directory named after
//! it with the suffix stripped.
//!
//! ## Features
//!
//! - Deterministic, pre-order record order (children sorted by name)
//! - The archived root is never stored, only what is inside it
//! - Record names always use `/`, whatever the host separator
//! - Empty directories and zero-byte files round-trip
//! - Atomic archive output: a failed run leaves no half-written archive
//! - Extraction refuses names that would escape the destination
//!
//! ## Example
//!
//! ```no_run
//! use rtargz::{Archiver, Extractor};
//!
//! fn main() -> rtargz::Result<()> {
//!     let summary = Archiver::default().archive("photos", "photos.tar.gz")?;
//!     println!("archived {} files", summary.files);
//!
//!     for record in Extractor::default().list("photos.tar.gz")? {
//!         println!("{}", record.name);
//!     }
//!
//!     Extractor::default().extract("photos.tar.gz", "restored")?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod tgz;

pub use cli::{Cli, Mode};
pub use error::{Error, Result};
pub use io::{SourceEntry, SourceWalker};
pub use tgz::{
    ArchiveOptions, ArchiveRecord, Archiver, ExtractOptions, Extractor, RecordKind, Summary,
};
