//! Archive-then-extract tests against real directory trees.

mod common;

use std::fs;

use rtargz::{
    ArchiveOptions, Archiver, Error, ExtractOptions, Extractor, RecordKind, Summary,
};
use tempfile::TempDir;

use common::{populate_tree, snapshot};

fn archive_and_extract(source: &std::path::Path, scratch: &TempDir) -> (std::path::PathBuf, Summary) {
    let archive = scratch.path().join("out.tar.gz");
    let dest = scratch.path().join("restored");

    let archived = Archiver::default().archive(source, &archive).unwrap();
    let extracted = Extractor::default().extract(&archive, &dest).unwrap();
    assert_eq!(archived, extracted);

    (dest, extracted)
}

#[test]
fn tree_round_trips() {
    let src = TempDir::new().unwrap();
    let root = src.path().join("project");
    populate_tree(&root);

    let scratch = TempDir::new().unwrap();
    let (dest, summary) = archive_and_extract(&root, &scratch);

    assert_eq!(snapshot(&dest), snapshot(&root));
    assert_eq!(summary.directories, 3);
    assert_eq!(summary.files, 4);
}

#[test]
fn empty_directory_and_zero_byte_file_survive() {
    let src = TempDir::new().unwrap();
    populate_tree(src.path());

    let scratch = TempDir::new().unwrap();
    let (dest, _) = archive_and_extract(src.path(), &scratch);

    assert!(dest.join("empty").is_dir());
    assert_eq!(fs::read_dir(dest.join("empty")).unwrap().count(), 0);
    assert_eq!(fs::read(dest.join("zero.bin")).unwrap(), b"");
}

#[test]
fn records_are_pre_order_and_root_is_suppressed() {
    let src = TempDir::new().unwrap();
    let root = src.path().join("foo");
    populate_tree(&root);

    let scratch = TempDir::new().unwrap();
    let archive = scratch.path().join("foo.tar.gz");
    Archiver::default().archive(&root, &archive).unwrap();

    let records = Extractor::default().list(&archive).unwrap();
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "docs/",
            "docs/guide.md",
            "docs/nested/",
            "docs/nested/data.bin",
            "empty/",
            "readme.txt",
            "zero.bin",
        ]
    );
    assert!(!names.contains(&"foo") && !names.contains(&"foo/"));

    for record in &records {
        assert!(!record.name.contains('\\'));
        assert_eq!(record.kind == RecordKind::Directory, record.name.ends_with('/'));
    }
}

#[test]
fn only_child_root_archive() {
    let src = TempDir::new().unwrap();
    let root = src.path().join("foo");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.txt"), b"a").unwrap();

    let scratch = TempDir::new().unwrap();
    let archive = scratch.path().join("foo.tar.gz");
    Archiver::default().archive(&root, &archive).unwrap();

    let records = Extractor::default().list(&archive).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "a.txt");
    assert_eq!(records[0].kind, RecordKind::RegularFile);
    assert_eq!(records[0].size, 1);
}

#[test]
fn single_file_source() {
    let src = TempDir::new().unwrap();
    let note = src.path().join("note.txt");
    fs::write(&note, b"remember the milk").unwrap();

    let scratch = TempDir::new().unwrap();
    let archive = scratch.path().join("note.tar.gz");
    Archiver::default().archive(&note, &archive).unwrap();

    let records = Extractor::default().list(&archive).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "note.txt");
    assert_eq!(records[0].kind, RecordKind::RegularFile);

    let dest = scratch.path().join("restored");
    Extractor::default().extract(&archive, &dest).unwrap();
    assert_eq!(fs::read(dest.join("note.txt")).unwrap(), b"remember the milk");
}

#[test]
fn empty_source_gives_valid_empty_archive() {
    let src = TempDir::new().unwrap();

    let scratch = TempDir::new().unwrap();
    let archive = scratch.path().join("empty.tar.gz");
    let summary = Archiver::default().archive(src.path(), &archive).unwrap();
    assert_eq!(summary, Summary::default());

    assert!(Extractor::default().list(&archive).unwrap().is_empty());
    let dest = scratch.path().join("restored");
    Extractor::default().extract(&archive, &dest).unwrap();
    assert!(dest.is_dir());
}

#[test]
fn missing_source_creates_no_output() {
    let scratch = TempDir::new().unwrap();
    let archive = scratch.path().join("ghost.tar.gz");

    for atomic_writes in [true, false] {
        let archiver = Archiver::new(ArchiveOptions {
            atomic_writes,
            ..ArchiveOptions::default()
        });
        let err = archiver
            .archive(scratch.path().join("ghost"), &archive)
            .unwrap_err();
        assert!(matches!(err, Error::SourceNotFound { .. }));
        assert!(!archive.exists());
    }
    assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[test]
fn extraction_overwrites_existing_files() {
    let src = TempDir::new().unwrap();
    fs::write(src.path().join("a.txt"), b"short").unwrap();

    let scratch = TempDir::new().unwrap();
    let archive = scratch.path().join("a.tar.gz");
    Archiver::default().archive(src.path(), &archive).unwrap();

    let dest = scratch.path().join("restored");
    fs::create_dir(&dest).unwrap();
    fs::write(dest.join("a.txt"), b"a much longer previous version").unwrap();

    Extractor::default().extract(&archive, &dest).unwrap();
    assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"short");
}

#[test]
fn store_level_round_trips() {
    let src = TempDir::new().unwrap();
    populate_tree(src.path());

    let scratch = TempDir::new().unwrap();
    let archive = scratch.path().join("stored.tar.gz");
    let archiver = Archiver::new(ArchiveOptions {
        level: 0,
        atomic_writes: false,
        ..ArchiveOptions::default()
    });
    archiver.archive(src.path(), &archive).unwrap();

    let dest = scratch.path().join("restored");
    Extractor::default().extract(&archive, &dest).unwrap();
    assert_eq!(snapshot(&dest), snapshot(src.path()));
}

#[cfg(unix)]
#[test]
fn permission_bits_round_trip() {
    use std::os::unix::fs::PermissionsExt;

    let src = TempDir::new().unwrap();
    fs::create_dir(src.path().join("private")).unwrap();
    fs::write(src.path().join("private/key"), b"secret").unwrap();
    fs::write(src.path().join("run.sh"), b"#!/bin/sh\n").unwrap();
    fs::set_permissions(src.path().join("private/key"), fs::Permissions::from_mode(0o600)).unwrap();
    fs::set_permissions(src.path().join("run.sh"), fs::Permissions::from_mode(0o755)).unwrap();
    fs::set_permissions(src.path().join("private"), fs::Permissions::from_mode(0o700)).unwrap();

    let scratch = TempDir::new().unwrap();
    let archive = scratch.path().join("perms.tar.gz");
    Archiver::default().archive(src.path(), &archive).unwrap();

    let dest = scratch.path().join("restored");
    Extractor::default().extract(&archive, &dest).unwrap();

    let mode = |rel: &str| fs::metadata(dest.join(rel)).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode("private/key"), 0o600);
    assert_eq!(mode("run.sh"), 0o755);
    assert_eq!(mode("private"), 0o700);
}

#[cfg(unix)]
#[test]
fn read_only_directory_still_receives_children() {
    use std::os::unix::fs::PermissionsExt;

    let src = TempDir::new().unwrap();
    fs::create_dir(src.path().join("locked")).unwrap();
    fs::write(src.path().join("locked/inside.txt"), b"inside").unwrap();
    fs::set_permissions(src.path().join("locked"), fs::Permissions::from_mode(0o555)).unwrap();

    let scratch = TempDir::new().unwrap();
    let archive = scratch.path().join("locked.tar.gz");
    Archiver::default().archive(src.path(), &archive).unwrap();

    let dest = scratch.path().join("restored");
    Extractor::default().extract(&archive, &dest).unwrap();
    assert_eq!(fs::read(dest.join("locked/inside.txt")).unwrap(), b"inside");

    // Let TempDir clean up.
    for dir in [src.path().join("locked"), dest.join("locked")] {
        fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).unwrap();
    }
}

#[cfg(unix)]
#[test]
fn permissions_can_be_ignored() {
    use std::os::unix::fs::PermissionsExt;

    let src = TempDir::new().unwrap();
    fs::write(src.path().join("key"), b"k").unwrap();
    fs::set_permissions(src.path().join("key"), fs::Permissions::from_mode(0o400)).unwrap();

    let scratch = TempDir::new().unwrap();
    let archive = scratch.path().join("k.tar.gz");
    Archiver::default().archive(src.path(), &archive).unwrap();

    let dest = scratch.path().join("restored");
    let extractor = Extractor::new(ExtractOptions {
        preserve_permissions: false,
        ..ExtractOptions::default()
    });
    extractor.extract(&archive, &dest).unwrap();

    let mode = fs::metadata(dest.join("key")).unwrap().permissions().mode() & 0o777;
    assert_ne!(mode, 0o400);
}
