//! Filesystem plumbing shared by the archiver.
//!
//! - [`walk`]: deterministic pre-order traversal of the source tree
//! - [`output`]: scoped archive output with temp-then-rename commit

mod output;
mod walk;

pub use output::ArchiveOutput;
pub use walk::{SourceEntry, SourceWalker};
