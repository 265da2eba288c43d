// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for repo2s3.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. repo2s3.toml (cwd, optional)
//! 3. --config FILE (repeatable)
//! 4. REPO2S3_* env vars
//! 5. --set KEY=VALUE and dedicated CLI flags
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! REPO2S3_SOURCE__OWNER=acme       → source.owner = "acme"
//! REPO2S3_SOURCE__TOKEN=ghp_...    → source.token = "ghp_..."
//! REPO2S3_BACKUP__WORKERS=8        → backup.workers = 8
//! REPO2S3_STORAGE__BUCKET=backups  → storage.bucket = "backups"
//! ```
//!
//! Components never read the environment themselves; the loaded [`Config`]
//! is passed down explicitly and treated as immutable.

pub mod loader;
pub mod types;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, Result};

use loader::ConfigLoader;
use types::{BackupConfig, GlobalConfig, MAX_PER_PAGE, SourceConfig, StorageBackend, StorageConfig};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Logging options.
    pub global: GlobalConfig,
    /// Hosting API and filtering options.
    pub source: SourceConfig,
    /// Pipeline options.
    pub backup: BackupConfig,
    /// Object storage options.
    pub storage: StorageConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use repo2s3::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file("backup.toml")
    ///     .add_toml_file_optional("repo2s3.toml")
    ///     .with_env_prefix("REPO2S3")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Checks values that must hold for every command.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::InvalidValue` for a zero worker count, an
    /// out-of-range page size, or an unparsable API URL.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.backup.workers == 0 {
            return Err(invalid("backup", "workers", "must be at least 1"));
        }
        if self.source.per_page == 0 || self.source.per_page > MAX_PER_PAGE {
            return Err(invalid(
                "source",
                "per_page",
                &format!("must be 1-{MAX_PER_PAGE}, got {}", self.source.per_page),
            ));
        }
        if let Err(e) = reqwest::Url::parse(&self.source.api_url) {
            return Err(invalid("source", "api_url", &e.to_string()));
        }
        Ok(())
    }

    /// Checks that an owner to enumerate is configured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingKey` if `source.owner` is empty.
    pub fn require_owner(&self) -> std::result::Result<&str, ConfigError> {
        if self.source.owner.trim().is_empty() {
            return Err(ConfigError::MissingKey {
                section: "source".to_string(),
                key: "owner".to_string(),
            });
        }
        Ok(self.source.owner.trim())
    }

    /// Checks everything a backup run needs.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the owner is missing, or when the S3
    /// backend is selected outside dry-run mode without a bucket.
    pub fn validate_for_backup(&self) -> std::result::Result<(), ConfigError> {
        self.validate()?;
        self.require_owner()?;
        if self.storage.backend == StorageBackend::S3
            && !self.backup.dry_run
            && self.storage.bucket.trim().is_empty()
        {
            return Err(ConfigError::MissingKey {
                section: "storage".to_string(),
                key: "bucket".to_string(),
            });
        }
        Ok(())
    }

    /// Format configuration options for display.
    ///
    /// Secrets are replaced with `[hidden]`. Output is ordered by key.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_global_options(&mut options);
        self.format_source_options(&mut options);
        self.format_backup_options(&mut options);
        self.format_storage_options(&mut options);

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }

    fn format_global_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "global.log_level".into(),
            self.global.log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level".into(),
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert("global.log_file".into(), self.global.log_file.clone());
    }

    fn format_source_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert("source.api_url".into(), self.source.api_url.clone());
        options.insert("source.owner".into(), self.source.owner.clone());
        if self.source.token().is_some() {
            options.insert("source.token".into(), "[hidden]".into());
        }
        options.insert(
            "source.include_snippets".into(),
            self.source.include_snippets.to_string(),
        );
        options.insert(
            "source.include_wikis".into(),
            self.source.include_wikis.to_string(),
        );
        options.insert("source.per_page".into(), self.source.per_page.to_string());
        options.insert("source.ignore".into(), self.source.ignore.join(", "));
        options.insert(
            "source.cutoff_days".into(),
            self.source.cutoff_days.to_string(),
        );
    }

    fn format_backup_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "backup.clone_root".into(),
            self.backup.clone_root.display().to_string(),
        );
        options.insert("backup.workers".into(), self.backup.workers.to_string());
        options.insert("backup.format".into(), self.backup.format.to_string());
        options.insert("backup.mirror".into(), self.backup.mirror.to_string());
        options.insert(
            "backup.write_description".into(),
            self.backup.write_description.to_string(),
        );
        options.insert("backup.dry_run".into(), self.backup.dry_run.to_string());
    }

    fn format_storage_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert("storage.backend".into(), self.storage.backend.to_string());
        options.insert("storage.bucket".into(), self.storage.bucket.clone());
        options.insert("storage.region".into(), self.storage.region.clone());
        options.insert("storage.prefix".into(), self.storage.prefix.clone());
        options.insert(
            "storage.endpoint_url".into(),
            self.storage.endpoint_url.clone(),
        );
        options.insert("storage.profile".into(), self.storage.profile.clone());
        if !self.storage.access_key_id.is_empty() {
            options.insert("storage.access_key_id".into(), "[hidden]".into());
        }
        if !self.storage.secret_access_key.is_empty() {
            options.insert("storage.secret_access_key".into(), "[hidden]".into());
        }
        options.insert(
            "storage.local_dir".into(),
            self.storage.local_dir.display().to_string(),
        );
    }
}

fn invalid(section: &str, key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        message: message.to_string(),
    }
}
