// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! One unit of work: clone, archive, upload, clean up.
//!
//! ```text
//! process(descriptor)
//!   WorkingDirectory::create   --err--> CloneFailure
//!   CloneBackend::clone_repo   --err--> CloneFailure   (missing wiki: Absent)
//!   REPOSITORY_DESCRIPTION.txt  (warn only)
//!   create_archive             --err--> ArchiveFailure
//!   WorkingDirectory::remove
//!   ObjectStore::put_file      --err--> UploadFailure   (skipped in dry run)
//!   drop(ArchiveFile)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::types::{FailureKind, Outcome, RepositoryDescriptor, SourceKind};
use super::workdir::{ArchiveFile, WorkingDirectory};
use crate::archive::{ArchiveFormat, create_archive, sanitize_name};
use crate::config::Config;
use crate::error::{CloneError, CloneFailureCause};
use crate::git::{CloneBackend, CloneMode};
use crate::storage::{ObjectStore, object_key};

/// File written into the clone when a description is available.
pub const DESCRIPTION_FILE: &str = "REPOSITORY_DESCRIPTION.txt";

/// Turns one descriptor into one [`Outcome`].
///
/// Holds no per-descriptor state; one instance is shared by all workers.
pub struct Processor {
    clone_root: PathBuf,
    format: ArchiveFormat,
    mode: CloneMode,
    write_description: bool,
    dry_run: bool,
    prefix: String,
    cloner: Arc<dyn CloneBackend>,
    store: Arc<dyn ObjectStore>,
}

impl Processor {
    /// Creates a processor with default options rooted at `clone_root`.
    #[must_use]
    pub fn new(
        clone_root: PathBuf,
        cloner: Arc<dyn CloneBackend>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            clone_root,
            format: ArchiveFormat::default(),
            mode: CloneMode::default(),
            write_description: true,
            dry_run: false,
            prefix: String::new(),
            cloner,
            store,
        }
    }

    /// Creates a processor from the `[backup]` and `[storage]` sections.
    #[must_use]
    pub fn from_config(
        config: &Config,
        cloner: Arc<dyn CloneBackend>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self::new(config.backup.clone_root.clone(), cloner, store)
            .with_format(config.backup.format)
            .with_mode(CloneMode::from_mirror(config.backup.mirror))
            .with_write_description(config.backup.write_description)
            .with_dry_run(config.backup.dry_run)
            .with_prefix(&config.storage.prefix)
    }

    #[must_use]
    pub const fn with_format(mut self, format: ArchiveFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: CloneMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn with_write_description(mut self, enable: bool) -> Self {
        self.write_description = enable;
        self
    }

    /// Archive but do not upload.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Full object key for a descriptor.
    #[must_use]
    pub fn key_for(&self, descriptor: &RepositoryDescriptor) -> String {
        object_key(&self.prefix, &descriptor.relative_key(self.format))
    }

    /// Processes one descriptor. Never fails; errors become [`Outcome::Failure`].
    ///
    /// A wiki whose remote does not exist yields [`Outcome::Absent`].
    pub async fn process(&self, descriptor: RepositoryDescriptor) -> Outcome {
        if sanitize_name(descriptor.name()).is_empty()
            || sanitize_name(descriptor.owner()).is_empty()
        {
            return failure(
                descriptor,
                FailureKind::CloneFailure,
                "descriptor has an empty owner or name".to_string(),
            );
        }

        let workdir_path = self.clone_root.join(descriptor.working_dir());
        let workdir = match WorkingDirectory::create(workdir_path.clone()).await {
            Ok(dir) => dir,
            Err(source) => {
                let err = CloneError::WorkingDirectory {
                    path: workdir_path.display().to_string(),
                    source,
                };
                return failure(descriptor, FailureKind::CloneFailure, err.to_string());
            }
        };

        let archived = self.clone_and_archive(&descriptor, &workdir).await;
        workdir.remove().await;
        let archive = match archived {
            Ok(archive) => archive,
            Err(Step::Absent(reason)) => {
                info!(
                    repo = %descriptor.full_name(),
                    source = %descriptor.kind(),
                    %reason,
                    "nothing to back up"
                );
                return Outcome::Absent { descriptor, reason };
            }
            Err(Step::Failed(kind, message)) => return failure(descriptor, kind, message),
        };

        let bytes = match tokio::fs::metadata(archive.path()).await {
            Ok(meta) => meta.len(),
            Err(e) => return failure(descriptor, FailureKind::ArchiveFailure, e.to_string()),
        };
        let key = self.key_for(&descriptor);

        if self.dry_run {
            info!(repo = %descriptor.full_name(), %key, bytes, "dry run, upload skipped");
            return Outcome::Success {
                descriptor,
                key,
                bytes,
                uploaded: false,
            };
        }

        match self.store.put_file(archive.path(), &key).await {
            Ok(stored) => {
                info!(repo = %descriptor.full_name(), %key, bytes = stored, "uploaded");
                Outcome::Success {
                    descriptor,
                    key,
                    bytes: stored,
                    uploaded: true,
                }
            }
            Err(err) => failure(descriptor, FailureKind::UploadFailure, err.to_string()),
        }
    }

    async fn clone_and_archive(
        &self,
        descriptor: &RepositoryDescriptor,
        workdir: &WorkingDirectory,
    ) -> Result<ArchiveFile, Step> {
        debug!(repo = %descriptor.full_name(), dest = %workdir.path().display(), "cloning");
        if let Err(err) = self
            .cloner
            .clone_repo(descriptor.clone_url(), workdir.path(), self.mode)
            .await
        {
            if descriptor.kind() == SourceKind::Wiki && err.cause() == CloneFailureCause::NotFound {
                return Err(Step::Absent("wiki has no pages".to_string()));
            }
            return Err(Step::Failed(FailureKind::CloneFailure, err.to_string()));
        }

        if self.write_description
            && let Some(text) = descriptor.description()
        {
            let path = workdir.path().join(DESCRIPTION_FILE);
            if let Err(e) = tokio::fs::write(&path, format!("{text}\n")).await {
                warn!(repo = %descriptor.full_name(), error = %e, "failed to write description");
            }
        }

        let output_dir = self.clone_root.join(descriptor.archive_dir());
        create_archive(workdir.path(), &output_dir, descriptor.name(), self.format)
            .await
            .map(ArchiveFile::new)
            .map_err(|err| Step::Failed(FailureKind::ArchiveFailure, err.to_string()))
    }
}

/// Why clone-and-archive stopped early.
enum Step {
    Absent(String),
    Failed(FailureKind, String),
}

fn failure(descriptor: RepositoryDescriptor, kind: FailureKind, message: String) -> Outcome {
    warn!(
        repo = %descriptor.full_name(),
        source = %descriptor.kind(),
        %kind,
        %message,
        "backup failed"
    );
    Outcome::Failure {
        descriptor,
        kind,
        message,
    }
}
