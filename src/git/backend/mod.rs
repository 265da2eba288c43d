// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git backend abstraction layer.
//!
//! ```text
//! CloneBackend (write) --> ShellBackend (git CLI, tokio::process)
//! verification (read)  --> GixBackend (pure Rust gix)
//! ```

use futures_util::future::BoxFuture;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, trace};

use super::auth::{authenticated_url, redact};
use crate::error::{CloneError, CloneFailureCause};

/// How a repository is cloned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloneMode {
    /// Regular clone with a checked-out work tree.
    #[default]
    Checkout,
    /// Bare `--mirror` clone carrying every ref.
    Mirror,
}

impl CloneMode {
    #[must_use]
    pub const fn from_mirror(mirror: bool) -> Self {
        if mirror { Self::Mirror } else { Self::Checkout }
    }
}

/// Clones a remote repository into a local directory.
///
/// Implementations must leave `dest` either holding a repository or in a
/// state the caller can delete; they never remove `dest` themselves.
pub trait CloneBackend: Send + Sync {
    /// Clone `url` into `dest`.
    ///
    /// # Errors
    ///
    /// Returns a classified [`CloneError`] on failure.
    fn clone_repo<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
        mode: CloneMode,
    ) -> BoxFuture<'a, Result<(), CloneError>>;
}

// --- GixBackend Implementation (Pure Rust) ---

/// Pure Rust git backend using gix.
///
/// Read-only; used to check clone results without spawning a subprocess.
pub struct GixBackend;

impl GixBackend {
    /// Check if a repository (bare or not) can be opened at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CloneError::InvalidRepository`] if gix cannot open it.
    pub fn verify(path: &Path) -> Result<(), CloneError> {
        let repo = gix::open(path).map_err(|e| CloneError::InvalidRepository {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        trace!(path = %path.display(), bare = repo.is_bare(), "repository opened");
        Ok(())
    }
}

// --- ShellBackend Implementation (Git CLI) ---

/// Shell-based git backend using the git CLI.
///
/// Required for:
/// - HTTPS credentials embedded in the URL
/// - `--mirror` clones
/// - Full git CLI compatibility
#[derive(Debug, Clone, Default)]
pub struct ShellBackend {
    token: Option<String>,
}

impl ShellBackend {
    /// Backend that authenticates HTTP(S) clones with `token`.
    #[must_use]
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()).map(str::to_string),
        }
    }

    /// Build a git command. Sets `GCM_INTERACTIVE=never` and `GIT_TERMINAL_PROMPT=0`.
    pub(crate) fn git_command(args: &[&str]) -> Command {
        let mut command = Command::new("git");
        command
            .args(args)
            .env("GCM_INTERACTIVE", "never")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    async fn run_clone(&self, url: &str, dest: &Path, mode: CloneMode) -> Result<(), CloneError> {
        let remote = self
            .token
            .as_deref()
            .map_or_else(|| url.to_string(), |token| authenticated_url(url, token));

        let dest_str = dest.to_str().ok_or_else(|| CloneError::Failed {
            url: url.to_string(),
            cause: CloneFailureCause::Other,
            message: "invalid destination path".to_string(),
        })?;

        let mut args = vec!["clone", "--quiet"];
        match mode {
            CloneMode::Checkout => args.extend(["-c", "advice.detachedHead=false"]),
            CloneMode::Mirror => args.push("--mirror"),
        }
        args.extend(["--", remote.as_str(), dest_str]);

        let mut command = Self::git_command(&args);
        if let Some(parent) = dest.parent().filter(|p| p.is_dir()) {
            command.current_dir(parent);
        }

        debug!(url = %url, dest = %dest.display(), ?mode, "git clone");
        let output = command.output().await.map_err(CloneError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = self.redact(stderr.trim());
            return Err(CloneError::Failed {
                url: url.to_string(),
                cause: CloneFailureCause::from_stderr(&message),
                message,
            });
        }
        Ok(())
    }

    fn redact(&self, text: &str) -> String {
        self.token
            .as_deref()
            .map_or_else(|| text.to_string(), |token| redact(text, token))
    }
}

impl CloneBackend for ShellBackend {
    fn clone_repo<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
        mode: CloneMode,
    ) -> BoxFuture<'a, Result<(), CloneError>> {
        Box::pin(async move {
            self.run_clone(url, dest, mode).await?;
            GixBackend::verify(dest)
        })
    }
}

#[cfg(test)]
mod tests;
