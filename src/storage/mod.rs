// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Object storage for finished archives.
//!
//! ```text
//! ObjectStore::put_file(archive, key) -> bytes
//!    |                       |
//!    v                       v
//! S3Store                       LocalStore
//! PutObject (multipart above    copy into <local_dir>/<key>
//! 100 MiB)
//! ```
//!
//! Keys look like `[<prefix>/]<owner>/<repos|gists|wikis>/<name>.<ext>`; every
//! segment except the prefix is sanitized, so the same repository always
//! maps to the same key and repeated runs overwrite it.

mod local;
mod s3;


use futures_util::future::BoxFuture;
use std::path::Path;
use std::sync::Arc;

use crate::config::types::{StorageBackend, StorageConfig};
use crate::error::UploadError;

pub use local::LocalStore;
pub use s3::{S3Store, classify_upload_failure};

/// Destination that accepts one file per key.
pub trait ObjectStore: Send + Sync {
    /// Upload `local` under `key`, replacing any existing object.
    ///
    /// Returns the number of bytes stored.
    ///
    /// # Errors
    ///
    /// Returns a classified [`UploadError`].
    fn put_file<'a>(
        &'a self,
        local: &'a Path,
        key: &'a str,
    ) -> BoxFuture<'a, Result<u64, UploadError>>;

    /// Human-readable location, e.g. `s3://bucket`.
    fn location(&self) -> String;
}

/// Joins the configured prefix and a relative key.
///
/// Slashes around the prefix are trimmed; an empty prefix adds nothing.
#[must_use]
pub fn object_key(prefix: &str, relative: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        relative.to_string()
    } else {
        format!("{prefix}/{relative}")
    }
}

/// Creates the store selected by `storage.backend`.
///
/// # Errors
///
/// Returns an error if the S3 client cannot be configured.
pub async fn connect(config: &StorageConfig) -> crate::error::Result<Arc<dyn ObjectStore>> {
    Ok(match config.backend {
        StorageBackend::S3 => Arc::new(S3Store::connect(config).await?),
        StorageBackend::Local => Arc::new(LocalStore::new(&config.local_dir)),
    })
}
