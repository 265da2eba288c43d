// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use futures_util::future::BoxFuture;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::ObjectStore;
use crate::error::UploadError;

/// Stores archives in a directory tree; keys map to relative paths.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Path a key is stored at.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    async fn copy(&self, local: &Path, key: &str) -> Result<u64, UploadError> {
        let rejected = |e: std::io::Error| UploadError::Rejected {
            key: key.to_string(),
            message: e.to_string(),
        };

        if !tokio::fs::try_exists(local).await.unwrap_or(false) {
            return Err(UploadError::MissingFile(local.display().to_string()));
        }
        if key.split('/').any(|segment| segment == "..") {
            return Err(UploadError::Rejected {
                key: key.to_string(),
                message: "key escapes the store root".to_string(),
            });
        }

        let dest = self.path_for(key);
        let parent = dest.parent().unwrap_or(&self.root);
        tokio::fs::create_dir_all(parent).await.map_err(rejected)?;

        let file_name = dest
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        let partial = parent.join(format!(".{file_name}.partial"));
        let stored = match tokio::fs::copy(local, &partial).await {
            Ok(bytes) => tokio::fs::rename(&partial, &dest).await.map(|()| bytes),
            Err(e) => Err(e),
        };
        let bytes = match stored {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(rejected(e));
            }
        };

        debug!(key, dest = %dest.display(), bytes, "stored locally");
        Ok(bytes)
    }
}

impl ObjectStore for LocalStore {
    fn put_file<'a>(
        &'a self,
        local: &'a Path,
        key: &'a str,
    ) -> BoxFuture<'a, Result<u64, UploadError>> {
        Box::pin(self.copy(local, key))
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}
