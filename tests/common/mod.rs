//! Shared helpers for the integration tests.
//!
//! Each file in `tests/` compiles as its own crate and uses a subset of these.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

/// What a tree looks like: relative path -> `None` for directories,
/// `Some(contents)` for files.
pub type Snapshot = BTreeMap<String, Option<Vec<u8>>>;

/// Creates a small tree under `root` with nesting, an empty directory and a
/// zero-byte file.
pub fn populate_tree(root: &Path) {
    fs::create_dir_all(root.join("docs/nested")).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();
    fs::write(root.join("readme.txt"), b"hello archive\n").unwrap();
    fs::write(root.join("zero.bin"), b"").unwrap();
    fs::write(root.join("docs/guide.md"), b"# Guide\n\nSome text.\n").unwrap();
    fs::write(root.join("docs/nested/data.bin"), pseudo_random_bytes(70_000)).unwrap();
}

/// Deterministic, poorly compressible bytes.
pub fn pseudo_random_bytes(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xff) as u8
        })
        .collect()
}

/// Everything below `root`, excluding `root` itself.
pub fn snapshot(root: &Path) -> Snapshot {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| {
            let entry = entry.unwrap();
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let contents = if entry.file_type().is_dir() {
                None
            } else {
                Some(fs::read(entry.path()).unwrap())
            };
            (relative, contents)
        })
        .collect()
}

/// Gzip-compressed tar stream built from raw headers, for crafting archives
/// the archiver itself would never produce.
pub fn gzip_tar(build: impl FnOnce(&mut tar::Builder<flate2::write::GzEncoder<Vec<u8>>>)) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    build(&mut builder);
    builder.into_inner().unwrap().finish().unwrap()
}

/// Appends a regular file record.
pub fn append_file<W: std::io::Write>(builder: &mut tar::Builder<W>, name: &str, contents: &[u8]) {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    builder.append_data(&mut header, name, contents).unwrap();
}
