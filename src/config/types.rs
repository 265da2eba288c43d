// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration types for repo2s3.
//!
//! ```text
//! Config: GlobalConfig, SourceConfig, BackupConfig, StorageConfig
//! StorageBackend: S3 (default) | Local
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::archive::ArchiveFormat;
use crate::error::ConfigError;
use crate::logging::LogLevel;

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Largest page size the GitHub API accepts.
pub const MAX_PER_PAGE: u8 = 100;

/// Global options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Log level for console output (0-5).
    pub log_level: LogLevel,
    /// Log level for file output (0-5).
    pub file_log_level: LogLevel,
    /// Path to log file; empty disables the file log.
    pub log_file: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::INFO,
            file_log_level: LogLevel::DEBUG,
            log_file: String::new(),
        }
    }
}

/// Where repositories are listed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Base URL of the hosting API.
    pub api_url: String,
    /// Account or organization to back up.
    pub owner: String,
    /// Personal access token; used for the API and for cloning.
    pub token: String,
    /// Also back up gists (user profiles only).
    pub include_snippets: bool,
    /// Also back up the wiki of every repository that has one enabled.
    pub include_wikis: bool,
    /// Page size for listing requests (1-100).
    pub per_page: u8,
    /// Glob patterns of names to skip (case-insensitive).
    pub ignore: Vec<String>,
    /// Skip repositories without a push in this many days; 0 disables.
    pub cutoff_days: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            owner: String::new(),
            token: String::new(),
            include_snippets: false,
            include_wikis: false,
            per_page: MAX_PER_PAGE,
            ignore: Vec::new(),
            cutoff_days: 0,
        }
    }
}

impl SourceConfig {
    /// Token if one is configured.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        Some(self.token.as_str()).filter(|t| !t.is_empty())
    }
}

/// Pipeline options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupConfig {
    /// Root under which working directories and archives are created.
    pub clone_root: PathBuf,
    /// Maximum number of repositories processed at once.
    pub workers: usize,
    /// Archive format.
    pub format: ArchiveFormat,
    /// Clone with `--mirror` (bare, all refs).
    pub mirror: bool,
    /// Write the repository description into the archive.
    pub write_description: bool,
    /// Clone and archive but skip the upload.
    pub dry_run: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            clone_root: PathBuf::from("backup"),
            workers: DEFAULT_WORKERS,
            format: ArchiveFormat::default(),
            mirror: false,
            write_description: true,
            dry_run: false,
        }
    }
}

/// Object store implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    S3,
    Local,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::S3 => write!(f, "s3"),
            Self::Local => write!(f, "local"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "local" => Ok(Self::Local),
            _ => Err(ConfigError::InvalidValue {
                section: "storage".to_string(),
                key: "backend".to_string(),
                message: format!("expected 's3' or 'local', got '{s}'"),
            }),
        }
    }
}

/// Destination of the archives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Bucket name (S3 backend).
    pub bucket: String,
    /// Region; empty uses the SDK default chain.
    pub region: String,
    /// Key prefix prepended to every object key.
    pub prefix: String,
    /// Custom endpoint for S3-compatible stores; enables path-style addressing.
    pub endpoint_url: String,
    /// Named AWS profile.
    pub profile: String,
    /// Static credentials; both must be set to take effect.
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Target directory (local backend).
    pub local_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket: String::new(),
            region: String::new(),
            prefix: "github".to_string(),
            endpoint_url: String::new(),
            profile: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            local_dir: PathBuf::from("archives"),
        }
    }
}

impl StorageConfig {
    /// Static credentials when both halves are present.
    #[must_use]
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        if self.access_key_id.is_empty() || self.secret_access_key.is_empty() {
            None
        } else {
            Some((&self.access_key_id, &self.secret_access_key))
        }
    }
}
