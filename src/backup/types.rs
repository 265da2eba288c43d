// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Descriptors, outcomes and the run summary.

use serde::Serialize;
use std::path::PathBuf;
use time::OffsetDateTime;

use crate::archive::{ArchiveFormat, archive_file_name, sanitize_name};
use crate::cmd::EXIT_PARTIAL;

/// Subdirectory of a group holding working trees.
const WORK_DIR: &str = "work";
/// Subdirectory of a group holding finished archives.
const ARCHIVE_DIR: &str = "archives";

/// What a descriptor points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Ordinary repository.
    Repository,
    /// Snippet collection (a gist).
    Snippet,
    /// Wiki attached to a repository.
    Wiki,
}

impl SourceKind {
    /// Directory and key segment grouping this kind.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Repository => "repos",
            Self::Snippet => "gists",
            Self::Wiki => "wikis",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repository => write!(f, "repository"),
            Self::Snippet => write!(f, "snippet"),
            Self::Wiki => write!(f, "wiki"),
        }
    }
}

/// Identity of one unit of work. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDescriptor {
    name: String,
    clone_url: String,
    owner: String,
    kind: SourceKind,
    description: Option<String>,
    private: bool,
    /// Last push (repositories) or update (gists).
    pushed_at: Option<OffsetDateTime>,
}

impl RepositoryDescriptor {
    #[must_use]
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        clone_url: impl Into<String>,
        kind: SourceKind,
    ) -> Self {
        Self {
            name: name.into(),
            clone_url: clone_url.into(),
            owner: owner.into(),
            kind,
            description: None,
            private: false,
            pushed_at: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    #[must_use]
    pub fn with_pushed_at(mut self, pushed_at: Option<OffsetDateTime>) -> Self {
        self.pushed_at = pushed_at;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn clone_url(&self) -> &str {
        &self.clone_url
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        self.kind
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.trim().is_empty())
    }

    #[must_use]
    pub const fn private(&self) -> bool {
        self.private
    }

    #[must_use]
    pub const fn pushed_at(&self) -> Option<OffsetDateTime> {
        self.pushed_at
    }

    /// Descriptor of this repository's wiki.
    ///
    /// Only repositories have wikis; the wiki shares name, visibility and
    /// push time with its repository and clones from `<repo>.wiki.git`.
    #[must_use]
    pub fn wiki(&self) -> Option<Self> {
        if self.kind != SourceKind::Repository {
            return None;
        }
        let url = self.clone_url.as_str();
        let base = url.strip_suffix(".git").unwrap_or(url);
        Some(Self {
            clone_url: format!("{base}.wiki.git"),
            kind: SourceKind::Wiki,
            description: None,
            ..self.clone()
        })
    }

    /// `owner/name`, for logs.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    fn group_dir(&self) -> PathBuf {
        PathBuf::from(sanitize_name(&self.owner)).join(self.kind.dir_name())
    }

    /// Working directory relative to the clone root.
    ///
    /// Working trees and archives live in separate subdirectories, so a
    /// repository named like a sibling's archive never shares its path.
    #[must_use]
    pub fn working_dir(&self) -> PathBuf {
        self.group_dir()
            .join(WORK_DIR)
            .join(sanitize_name(&self.name))
    }

    /// Directory the archive is written to, relative to the clone root.
    #[must_use]
    pub fn archive_dir(&self) -> PathBuf {
        self.group_dir().join(ARCHIVE_DIR)
    }

    /// Object key without the configured prefix.
    #[must_use]
    pub fn relative_key(&self, format: ArchiveFormat) -> String {
        format!(
            "{}/{}/{}",
            sanitize_name(&self.owner),
            self.kind.dir_name(),
            archive_file_name(&self.name, format)
        )
    }
}

/// Step at which a descriptor failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    CloneFailure,
    ArchiveFailure,
    UploadFailure,
    /// The worker panicked.
    Aborted,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CloneFailure => "CloneFailure",
            Self::ArchiveFailure => "ArchiveFailure",
            Self::UploadFailure => "UploadFailure",
            Self::Aborted => "Aborted",
        };
        f.write_str(s)
    }
}

/// Result of processing one descriptor.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success {
        descriptor: RepositoryDescriptor,
        /// Full object key, prefix included.
        key: String,
        /// Archive size.
        bytes: u64,
        /// False in dry-run mode.
        uploaded: bool,
    },
    Failure {
        descriptor: RepositoryDescriptor,
        kind: FailureKind,
        message: String,
    },
    /// Nothing to back up, e.g. a wiki that was enabled but never written.
    Absent {
        descriptor: RepositoryDescriptor,
        reason: String,
    },
}

impl Outcome {
    #[must_use]
    pub const fn descriptor(&self) -> &RepositoryDescriptor {
        match self {
            Self::Success { descriptor, .. }
            | Self::Failure { descriptor, .. }
            | Self::Absent { descriptor, .. } => descriptor,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One failed descriptor in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub owner: String,
    pub name: String,
    #[serde(rename = "source")]
    pub kind: SourceKind,
    pub failure: FailureKind,
    pub message: String,
}

/// Aggregate report of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Descriptors pulled from the enumerator.
    pub fetched: usize,
    /// Descriptors filtered out before dispatch.
    pub skipped: usize,
    /// Descriptors dispatched to a worker; equals the number of outcomes.
    pub attempted: usize,
    pub succeeded: usize,
    /// Dispatched descriptors with nothing to back up.
    pub absent: usize,
    /// Archive bytes across successful outcomes.
    pub bytes: u64,
    pub failures: Vec<FailureRecord>,
    /// Dispatch stopped early because of an interrupt.
    pub cancelled: bool,
    pub dry_run: bool,
}

impl RunSummary {
    /// Counts one outcome.
    pub fn record(&mut self, outcome: &Outcome) {
        self.attempted += 1;
        match outcome {
            Outcome::Success { bytes, .. } => {
                self.succeeded += 1;
                self.bytes += bytes;
            }
            Outcome::Absent { .. } => self.absent += 1,
            Outcome::Failure {
                descriptor,
                kind,
                message,
            } => self.failures.push(FailureRecord {
                owner: descriptor.owner().to_string(),
                name: descriptor.name().to_string(),
                kind: descriptor.kind(),
                failure: *kind,
                message: message.clone(),
            }),
        }
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Process exit code for a completed run: 0 without failures,
    /// [`EXIT_PARTIAL`] otherwise.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        if self.failures.is_empty() {
            0
        } else {
            EXIT_PARTIAL
        }
    }

    /// Failed names sorted, for stable reporting.
    #[must_use]
    pub fn failed_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .failures
            .iter()
            .map(|f| format!("{}/{}", f.owner, f.name))
            .collect();
        names.sort_unstable();
        names
    }

    /// Summary as a single JSON document.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }

    /// Human-readable report lines.
    #[must_use]
    pub fn format_report(&self) -> Vec<String> {
        let mut lines = vec![
            format!("fetched   = {}", self.fetched),
            format!("skipped   = {}", self.skipped),
            format!("attempted = {}", self.attempted),
            format!("succeeded = {}", self.succeeded),
            format!("failed    = {}", self.failed()),
        ];
        if self.absent > 0 {
            lines.push(format!("absent    = {}", self.absent));
        }
        if self.dry_run {
            lines.push("dry run: nothing uploaded".to_string());
        }
        if self.cancelled {
            lines.push("interrupted: remaining repositories were not dispatched".to_string());
        }
        let mut failures: Vec<&FailureRecord> = self.failures.iter().collect();
        failures.sort_by(|a, b| (&a.owner, &a.name).cmp(&(&b.owner, &b.name)));
        for failure in failures {
            lines.push(format!(
                "  {}/{} [{}] {}: {}",
                failure.owner, failure.name, failure.kind, failure.failure, failure.message
            ));
        }
        lines
    }
}
