// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use flate2::Compression;
use flate2::write::GzEncoder;
use ignore::WalkBuilder;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;
use zip::write::SimpleFileOptions;

use super::{ArchiveFormat, archive_file_name, sanitize_name};
use crate::error::ArchiveError;

/// One filesystem entry below the archive root.
struct Entry {
    path: PathBuf,
    /// `/`-separated path inside the archive, rooted at the sanitized name.
    name: String,
    kind: EntryKind,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
    Symlink,
}

/// Archives `source_dir` into `output_dir` on the blocking thread pool.
///
/// # Errors
///
/// Returns the [`ArchiveError`] of [`create_archive_blocking`], or
/// [`ArchiveError::Join`] if the worker thread panicked.
pub async fn create_archive(
    source_dir: &Path,
    output_dir: &Path,
    name: &str,
    format: ArchiveFormat,
) -> Result<PathBuf, ArchiveError> {
    let source_dir = source_dir.to_path_buf();
    let output_dir = output_dir.to_path_buf();
    let name = name.to_string();
    tokio::task::spawn_blocking(move || {
        create_archive_blocking(&source_dir, &output_dir, &name, format)
    })
    .await
    .map_err(|e| ArchiveError::Join(e.to_string()))?
}

/// Writes one archive of `source_dir` to `output_dir/<sanitized name>.<ext>`.
///
/// Entries are stored under a top-level directory named after the sanitized
/// repository name. Hidden files and `.git` are included; symlinks are stored
/// as links. The archive is written to a temporary file first, so a failure
/// never leaves a partial archive behind. An existing archive with the same
/// name is replaced.
///
/// # Errors
///
/// Returns [`ArchiveError`] if the source is unreadable or empty, the walk
/// fails, or the output cannot be written.
pub fn create_archive_blocking(
    source_dir: &Path,
    output_dir: &Path,
    name: &str,
    format: ArchiveFormat,
) -> Result<PathBuf, ArchiveError> {
    let unreadable = |source: io::Error| ArchiveError::SourceUnreadable {
        path: source_dir.display().to_string(),
        source,
    };
    let mut listing = std::fs::read_dir(source_dir).map_err(unreadable)?;
    if listing.next().transpose().map_err(unreadable)?.is_none() {
        return Err(ArchiveError::EmptySource(source_dir.display().to_string()));
    }

    let entries = collect_entries(source_dir, &sanitize_name(name))?;
    let final_path = output_dir.join(archive_file_name(name, format));
    let write_err = |source: io::Error| ArchiveError::Write {
        path: final_path.display().to_string(),
        source,
    };

    std::fs::create_dir_all(output_dir).map_err(write_err)?;
    let mut temp = tempfile::Builder::new()
        .prefix(".partial-")
        .tempfile_in(output_dir)
        .map_err(write_err)?;

    match format {
        ArchiveFormat::Tar => {
            write_tar(BufWriter::new(temp.as_file_mut()), &entries)
                .and_then(|mut w| w.flush())
                .map_err(write_err)?;
        }
        ArchiveFormat::TarGz => {
            let encoder =
                GzEncoder::new(BufWriter::new(temp.as_file_mut()), Compression::default());
            write_tar(encoder, &entries)
                .and_then(GzEncoder::finish)
                .and_then(|mut w| w.flush())
                .map_err(write_err)?;
        }
        ArchiveFormat::Zip => write_zip(&mut temp, &entries, &final_path)?,
    }

    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(&final_path).map_err(|e| write_err(e.error))?;

    debug!(
        archive = %final_path.display(),
        entries = entries.len(),
        %format,
        "archive written"
    );
    Ok(final_path)
}

fn collect_entries(source_dir: &Path, root_name: &str) -> Result<Vec<Entry>, ArchiveError> {
    let walker = WalkBuilder::new(source_dir)
        .standard_filters(false)
        .hidden(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut entries = Vec::new();
    for result in walker {
        let entry = result.map_err(|e| ArchiveError::Walk {
            path: source_dir.display().to_string(),
            message: e.to_string(),
        })?;
        if entry.depth() == 0 {
            continue;
        }
        let Some(file_type) = entry.file_type() else {
            continue;
        };
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            debug!(path = %entry.path().display(), "skipping special file");
            continue;
        };

        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|e| ArchiveError::Walk {
                path: entry.path().display().to_string(),
                message: e.to_string(),
            })?;
        let mut name = root_name.to_string();
        for component in relative.components() {
            name.push('/');
            name.push_str(&component.as_os_str().to_string_lossy());
        }

        entries.push(Entry {
            path: entry.into_path(),
            name,
            kind,
        });
    }
    Ok(entries)
}

fn write_tar<W: Write>(writer: W, entries: &[Entry]) -> io::Result<W> {
    let mut builder = tar::Builder::new(writer);
    builder.follow_symlinks(false);
    for entry in entries {
        builder.append_path_with_name(&entry.path, &entry.name)?;
    }
    builder.into_inner()
}

fn write_zip(
    temp: &mut NamedTempFile,
    entries: &[Entry],
    final_path: &Path,
) -> Result<(), ArchiveError> {
    let zip_err = |e: zip::result::ZipError| ArchiveError::Zip {
        path: final_path.display().to_string(),
        message: e.to_string(),
    };
    let io_err = |source: io::Error| ArchiveError::Write {
        path: final_path.display().to_string(),
        source,
    };
    let unreadable = |path: &Path, source: io::Error| ArchiveError::SourceUnreadable {
        path: path.display().to_string(),
        source,
    };

    let mut zip = zip::ZipWriter::new(BufWriter::new(temp.as_file_mut()));
    let base = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for entry in entries {
        match entry.kind {
            EntryKind::Dir => {
                zip.add_directory(entry.name.as_str(), base)
                    .map_err(zip_err)?;
            }
            EntryKind::Symlink => {
                let target =
                    std::fs::read_link(&entry.path).map_err(|e| unreadable(&entry.path, e))?;
                zip.add_symlink(entry.name.as_str(), target.to_string_lossy(), base)
                    .map_err(zip_err)?;
            }
            EntryKind::File => {
                let mut file = File::open(&entry.path).map_err(|e| unreadable(&entry.path, e))?;
                let metadata = file.metadata().map_err(|e| unreadable(&entry.path, e))?;
                let options = file_options(base, &metadata);
                zip.start_file(entry.name.as_str(), options)
                    .map_err(zip_err)?;
                io::copy(&mut file, &mut zip).map_err(io_err)?;
            }
        }
    }

    zip.finish()
        .map_err(zip_err)?
        .flush()
        .map_err(io_err)
}

#[cfg(unix)]
fn file_options(base: SimpleFileOptions, metadata: &std::fs::Metadata) -> SimpleFileOptions {
    use std::os::unix::fs::PermissionsExt;
    base.large_file(metadata.len() >= u64::from(u32::MAX))
        .unix_permissions(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn file_options(base: SimpleFileOptions, metadata: &std::fs::Metadata) -> SimpleFileOptions {
    base.large_file(metadata.len() >= u64::from(u32::MAX))
}
