// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Repository enumeration.
//!
//! ```text
//! Enumerator::descriptors() -> BoxStream<Result<RepositoryDescriptor>>
//!    |
//!    v
//! GitHubEnumerator
//!   GET /orgs/{owner}  (200 -> org)   else  GET /users/{owner}  (200 -> user)
//!   GET /{orgs|users}/{owner}/repos?per_page=N&page=1..   until empty page
//!   GET /users/{owner}/gists?per_page=N&page=1..          users only, opt-in
//! ```
//!
//! Pages are fetched only as the stream is polled, so a slow consumer never
//! holds more than one page in memory.

pub mod github;

use futures_util::stream::BoxStream;

use crate::backup::RepositoryDescriptor;
use crate::error::EnumerationError;

pub use github::{GitHubEnumerator, ProfileKind};

/// Lazy source of descriptors.
///
/// An `Err` item is fatal for the run; the orchestrator stops pulling after it.
pub trait Enumerator: Send + Sync {
    fn descriptors(&self) -> BoxStream<'_, Result<RepositoryDescriptor, EnumerationError>>;
}
