// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git operations module.
//!
//! ```text
//!  Processor
//!      |
//!      v
//!  ,--------------------,
//!  | CloneBackend trait |
//!  '---------+----------'
//!            |
//!            v
//!      ShellBackend ----> git clone [--mirror] (token in URL, redacted)
//!            |
//!            v
//!      GixBackend::verify (gix::open)
//! ```

pub mod auth;
pub mod backend;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

pub use backend::{CloneBackend, CloneMode, GixBackend, ShellBackend};

/// Locate the `git` executable on `PATH`.
#[must_use]
pub fn git_executable() -> Option<PathBuf> {
    which::which("git").ok()
}
