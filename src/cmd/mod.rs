// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> cmd::run_* handlers
//!   backup, list, config
//!
//! exit codes: 0 ok | 1 repository failures | 2 enumeration | 3 fatal setup
//! ```

pub mod backup;
pub mod config;
pub mod list;


use crate::error::{BackupError, EnumerationError, Repo2S3Error};

/// At least one repository failed.
pub const EXIT_PARTIAL: u8 = 1;
/// Repository listing failed.
pub const EXIT_ENUMERATION: u8 = 2;
/// Configuration, logging or environment problem.
pub const EXIT_FATAL: u8 = 3;

/// Exit code for an error that ended a command.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    let enumeration = err
        .downcast_ref::<BackupError>()
        .is_some_and(|e| matches!(e, BackupError::Enumeration(_)))
        || err.downcast_ref::<EnumerationError>().is_some()
        || err
            .downcast_ref::<Repo2S3Error>()
            .is_some_and(|e| matches!(e, Repo2S3Error::Enumeration(_)));
    if enumeration {
        EXIT_ENUMERATION
    } else {
        EXIT_FATAL
    }
}
