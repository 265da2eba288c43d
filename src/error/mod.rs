// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!               Repo2S3Error (~24 bytes)
//!                      |
//!   +-------+------+---+----+-------+-----+------+
//!   |       |      |        |       |     |      |
//!   v       v      v        v       v     v      v
//! Bail   Enum   Clone   Archive  Upload  Cfg  Io/Other
//!        Box    Box     Box      Box     Box  Box
//!
//! Per-repository (never abort the run):
//!   CloneError    Failed(network|auth|not-found|other), Spawn, WorkingDirectory
//!   ArchiveError  SourceUnreadable, EmptySource, Walk, Write, Zip
//!   UploadError   Network, Auth, Quota, MissingFile, Rejected
//!
//! Fatal for the run:
//!   EnumerationError  InvalidOwner, HttpError, Reqwest
//!   BackupError       Enumeration, Sink
//! ```

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`Repo2S3Error`].
pub type Repo2S3Result<T> = std::result::Result<T, Repo2S3Error>;

/// Top-level application error type.
///
/// All sub-errors are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum Repo2S3Error {
    /// Fatal error that should terminate the application.
    #[error("fatal error: {0}")]
    Bailed(Box<str>),

    /// Repository enumeration failed.
    #[error("enumeration error: {0}")]
    Enumeration(#[from] Box<EnumerationError>),

    /// Clone operation failed.
    #[error("clone error: {0}")]
    Clone(#[from] Box<CloneError>),

    /// Archive creation failed.
    #[error("archive error: {0}")]
    Archive(#[from] Box<ArchiveError>),

    /// Upload to object storage failed.
    #[error("upload error: {0}")]
    Upload(#[from] Box<UploadError>),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),

    /// Generic error with message.
    #[error("{0}")]
    Other(Box<str>),
}

/// Create a fatal [`Repo2S3Error::Bailed`] that terminates the application.
pub fn bail_out(message: impl Into<String>) -> Repo2S3Error {
    Repo2S3Error::Bailed(message.into().into_boxed_str())
}

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for Repo2S3Error {
                fn from(err: $error) -> Self {
                    Repo2S3Error::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    EnumerationError => Enumeration,
    CloneError => Clone,
    ArchiveError => Archive,
    UploadError => Upload,
    ConfigError => Config,
    std::io::Error => Io,
}

// --- Enumeration Errors ---

/// Errors raised while listing repositories from the hosting API.
#[derive(Debug, Error)]
pub enum EnumerationError {
    /// The owner is neither an organization nor a user.
    #[error("'{owner}' is neither an organization nor a user")]
    InvalidOwner { owner: String },

    /// HTTP error response.
    #[error("http error {status}: {url}")]
    HttpError { status: u16, url: String },

    /// Response body could not be decoded.
    #[error("invalid payload from {url}: {message}")]
    InvalidPayload { url: String, message: String },

    /// Invalid API URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Error from reqwest library.
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

// --- Clone Errors ---

/// Classification of a failed clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CloneFailureCause {
    Network,
    Auth,
    NotFound,
    Other,
}

impl CloneFailureCause {
    /// Classifies git's stderr output.
    #[must_use]
    pub fn from_stderr(stderr: &str) -> Self {
        let lower = stderr.to_ascii_lowercase();
        let any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if any(&[
            "authentication failed",
            "could not read username",
            "could not read password",
            "permission denied",
            "invalid username or password",
            "http basic: access denied",
            "the requested url returned error: 403",
            "the requested url returned error: 401",
        ]) {
            Self::Auth
        } else if any(&[
            "not found",
            "does not exist",
            "does not appear to be a git repository",
            "the requested url returned error: 404",
        ]) {
            Self::NotFound
        } else if any(&[
            "could not resolve host",
            "connection refused",
            "connection timed out",
            "operation timed out",
            "network is unreachable",
            "failed to connect",
            "early eof",
            "the remote end hung up unexpectedly",
            "ssl",
        ]) {
            Self::Network
        } else {
            Self::Other
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::NotFound => "not-found",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for CloneFailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clone operation errors.
#[derive(Debug, Error)]
pub enum CloneError {
    /// `git clone` exited unsuccessfully.
    #[error("failed to clone {url} ({cause}): {message}")]
    Failed {
        url: String,
        cause: CloneFailureCause,
        message: String,
    },

    /// The `git` executable could not be started.
    #[error("failed to spawn git: {0}")]
    Spawn(#[source] std::io::Error),

    /// The working directory could not be prepared.
    #[error("failed to prepare working directory '{path}': {source}")]
    WorkingDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The clone finished but no repository can be opened at the destination.
    #[error("no repository at '{path}' after clone: {message}")]
    InvalidRepository { path: String, message: String },
}

impl CloneError {
    /// Failure classification for reporting.
    #[must_use]
    pub const fn cause(&self) -> CloneFailureCause {
        match self {
            Self::Failed { cause, .. } => *cause,
            Self::Spawn(_) | Self::WorkingDirectory { .. } | Self::InvalidRepository { .. } => {
                CloneFailureCause::Other
            }
        }
    }
}

// --- Archive Errors ---

/// Archive creation errors.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Source directory (or an entry inside it) could not be read.
    #[error("cannot read '{path}': {source}")]
    SourceUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Source directory has no entries.
    #[error("nothing to archive in '{0}'")]
    EmptySource(String),

    /// Directory traversal failed.
    #[error("failed to walk '{path}': {message}")]
    Walk { path: String, message: String },

    /// Archive file could not be written.
    #[error("failed to write archive '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error from the zip writer.
    #[error("zip error on '{path}': {message}")]
    Zip { path: String, message: String },

    /// Archive worker thread did not complete.
    #[error("archive task failed: {0}")]
    Join(String),
}

// --- Upload Errors ---

/// Upload errors from the object store.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Transport-level failure (DNS, connect, timeout).
    #[error("network failure uploading '{key}': {message}")]
    Network { key: String, message: String },

    /// Store rejected the credentials or the caller lacks permission.
    #[error("access denied uploading '{key}': {message}")]
    Auth { key: String, message: String },

    /// Store refused the object because of size or rate limits.
    #[error("quota exceeded uploading '{key}': {message}")]
    Quota { key: String, message: String },

    /// The archive to upload does not exist.
    #[error("archive not found: {0}")]
    MissingFile(String),

    /// Any other rejection.
    #[error("upload of '{key}' failed: {message}")]
    Rejected { key: String, message: String },
}

impl UploadError {
    /// Failure classification for reporting.
    #[must_use]
    pub const fn class(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Auth { .. } => "auth",
            Self::Quota { .. } => "quota",
            Self::MissingFile(_) => "missing-file",
            Self::Rejected { .. } => "other",
        }
    }
}

// --- Config Errors ---

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Missing required configuration key.
    #[error("missing required config key '{key}' in section '[{section}]'")]
    MissingKey { section: String, key: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

// --- Run Errors ---

/// Errors that abort a whole backup run.
///
/// Per-repository failures never end up here; they are reported as
/// [`crate::backup::Outcome::Failure`].
#[derive(Debug, Error)]
pub enum BackupError {
    /// No descriptors can be produced.
    #[error("repository enumeration failed: {0}")]
    Enumeration(#[source] EnumerationError),

    /// Outcome bookkeeping broke down.
    #[error("outcome sink failed: {0}")]
    Sink(String),
}

#[cfg(test)]
mod tests;
