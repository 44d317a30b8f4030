//! Main entry point for the rtargz CLI application.
//!
//! One positional argument picks the operation: a directory is compressed
//! into `<dir>.tar.gz` next to it, any other file is extracted as an archive.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

use rtargz::{ArchiveOptions, ArchiveRecord, Archiver, Cli, ExtractOptions, Extractor, Mode, Summary};

/// Application entry point.
///
/// Parses command-line arguments, sets up logging and dispatches to the
/// compress, extract or list handler.
fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .format_target(false)
        .format_timestamp(None)
        .init();

    match cli.mode()? {
        Mode::Compress { source, target } => {
            if cli.list {
                log::warn!("-l ignored: {} is a directory", source.display());
            }
            compress(&cli, &source, &target)
        }
        Mode::Decompress { archive, .. } if cli.list => list_files(&archive, cli.verbose > 0),
        Mode::Decompress { archive, dest } => decompress(&archive, &dest),
    }
}

fn compress(cli: &Cli, source: &Path, target: &Path) -> Result<()> {
    let archiver = Archiver::new(ArchiveOptions {
        level: cli.level,
        ..ArchiveOptions::default()
    });

    let summary = archiver
        .archive(source, target)
        .with_context(|| format!("Failed to compress {} -> {}", source.display(), target.display()))?;

    report("archived", &summary, target);
    Ok(())
}

fn decompress(archive: &Path, dest: &Path) -> Result<()> {
    let extractor = Extractor::new(ExtractOptions::default());

    let summary = extractor
        .extract(archive, dest)
        .with_context(|| format!("Failed to extract {} -> {}", archive.display(), dest.display()))?;

    report("extracted", &summary, dest);
    Ok(())
}

/// Print the records of an archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): just record names, one per line
/// - Verbose format (`-l -v`): permissions, size and name, plus a totals line
fn list_files(archive: &Path, verbose: bool) -> Result<()> {
    let records = Extractor::default()
        .list(archive)
        .with_context(|| format!("Failed to list {}", archive.display()))?;

    if verbose {
        println!("{:<10}  {:>12}  Name", "Mode", "Length");
        println!("{}", "-".repeat(50));
    }

    let mut totals = Summary::default();
    for record in &records {
        if verbose {
            println!("{}  {:>12}  {}", permissions(record), record.size, record.name);
        } else {
            println!("{}", record.name);
        }
        totals.add(record);
    }

    if verbose {
        println!("{}", "-".repeat(50));
        println!(
            "{:<10}  {:>12}  {} files, {} directories",
            "", totals.bytes, totals.files, totals.directories
        );
    }

    Ok(())
}

fn report(verb: &str, summary: &Summary, location: &Path) {
    log::info!(
        "{} {} files, {} directories ({}) -> {}",
        verb,
        summary.files,
        summary.directories,
        format_size(summary.bytes),
        location.display()
    );
}

/// Render a record's kind and mode the way `ls -l` does, e.g. `drwxr-xr-x`.
fn permissions(record: &ArchiveRecord) -> String {
    let mut out = String::with_capacity(10);
    out.push(if record.kind.is_directory() { 'd' } else { '-' });
    for shift in [6, 3, 0] {
        let bits = (record.mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

/// Format a byte size into a human-readable string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
