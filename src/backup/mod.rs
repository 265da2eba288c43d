// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Backup pipeline.
//!
//! # Architecture
//!
//! ```text
//! Enumerator (lazy stream)
//!      |
//!      v
//! Orchestrator ---- DescriptorFilter (ignore globs, cut-off)
//!      |  Semaphore(workers) + JoinSet
//!      v
//! Processor  (one per descriptor, shared)
//!   WorkingDirectory -> CloneBackend -> create_archive -> ObjectStore
//!      |
//!      v  flume
//! collector -> RunSummary
//! ```
//!
//! # Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`RepositoryDescriptor`] | Identity of one repository or gist |
//! | [`Outcome`] | Success or classified failure of one unit |
//! | [`RunSummary`] | Counts and failures of a whole run |
//! | [`Processor`] | Clone, archive and upload one descriptor |
//! | [`Orchestrator`] | Bounded concurrent dispatch with cancellation |

pub mod filter;
pub mod orchestrator;
pub mod processor;
pub mod types;
pub mod workdir;


pub use filter::{DescriptorFilter, SkipReason};
pub use orchestrator::Orchestrator;
pub use processor::{DESCRIPTION_FILE, Processor};
pub use types::{FailureKind, FailureRecord, Outcome, RepositoryDescriptor, RunSummary, SourceKind};
pub use workdir::{ArchiveFile, WorkingDirectory};
