// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Exclusively owned clone directory.
///
/// Call [`WorkingDirectory::remove`] on the async path; dropping the guard
/// without it (early return, panic) falls back to a blocking delete.
#[derive(Debug)]
pub struct WorkingDirectory {
    path: PathBuf,
    removed: bool,
}

impl WorkingDirectory {
    /// Creates an empty directory at `path`.
    ///
    /// A leftover directory from an interrupted earlier run is removed first.
    ///
    /// # Errors
    ///
    /// Returns an error if the stale directory cannot be removed or the new one
    /// cannot be created.
    pub async fn create(path: PathBuf) -> io::Result<Self> {
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => warn!(path = %path.display(), "removed stale working directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self {
            path,
            removed: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the tree off the async worker threads.
    pub async fn remove(mut self) {
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => self.removed = true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.removed = true,
            Err(e) => {
                let path = self.path.display();
                warn!(path = %path, error = %e, "failed to remove working directory");
            }
        }
    }
}

impl Drop for WorkingDirectory {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                let path = self.path.display();
                warn!(path = %path, error = %e, "failed to remove working directory");
            }
        }
    }
}

/// Archive file, removed on drop.
#[derive(Debug)]
pub struct ArchiveFile {
    path: PathBuf,
}

impl ArchiveFile {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ArchiveFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove archive"),
        }
    }
}
