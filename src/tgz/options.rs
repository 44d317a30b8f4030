use flate2::Compression;

use super::record::{ArchiveRecord, RecordKind};

/// Settings for building an archive.
#[derive(Clone, Debug)]
pub struct ArchiveOptions {
    /// gzip compression level, 0 (store) to 9 (best). Values above 9 are clamped.
    pub level: u32,

    /// Buffer size used for file/stream IO wrappers.
    pub buffer_size: usize,

    /// Write to a temporary file and rename it over the target once complete.
    pub atomic_writes: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            level: Compression::best().level(),
            buffer_size: 1024 * 1024, // 1 MiB
            atomic_writes: true,
        }
    }
}

impl ArchiveOptions {
    pub fn compression(&self) -> Compression {
        Compression::new(self.level.min(Compression::best().level()))
    }
}

/// Settings for unpacking an archive.
#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// Buffer size used for file/stream IO wrappers.
    pub buffer_size: usize,

    /// Apply the recorded permission bits (Unix only).
    pub preserve_permissions: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            buffer_size: 1024 * 1024,
            preserve_permissions: true,
        }
    }
}

/// What an archive or extract run processed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub directories: usize,
    pub files: usize,
    /// Total payload bytes of regular files.
    pub bytes: u64,
}

impl Summary {
    pub fn add(&mut self, record: &ArchiveRecord) {
        match record.kind {
            RecordKind::Directory => self.directories += 1,
            RecordKind::RegularFile => {
                self.files += 1;
                self.bytes += record.size;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_best_compression() {
        let opts = ArchiveOptions::default();
        assert_eq!(opts.compression(), Compression::best());
        assert!(opts.atomic_writes);
    }

    #[test]
    fn level_is_clamped() {
        let opts = ArchiveOptions {
            level: 42,
            ..ArchiveOptions::default()
        };
        assert_eq!(opts.compression().level(), 9);
    }

    #[test]
    fn summary_counts_records() {
        let mut summary = Summary::default();
        summary.add(&ArchiveRecord::directory("d/".into(), 0o755, 0));
        summary.add(&ArchiveRecord::regular_file("d/a".into(), 10, 0o644, 0));
        summary.add(&ArchiveRecord::regular_file("d/b".into(), 5, 0o644, 0));
        assert_eq!(
            summary,
            Summary {
                directories: 1,
                files: 2,
                bytes: 15
            }
        );
    }
}
