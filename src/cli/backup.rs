// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Backup and list command arguments.

use clap::Args;

use crate::archive::ArchiveFormat;

/// Owner selection shared by `backup` and `list`.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Organization or user whose repositories are backed up.
    #[arg(short = 'o', long = "owner", value_name = "NAME")]
    pub owner: Option<String>,

    /// Also include the owner's gists (users only).
    #[arg(long = "snippets")]
    pub snippets: bool,

    /// Also include repository wikis.
    #[arg(long = "wikis")]
    pub wikis: bool,
}

impl SourceArgs {
    #[must_use]
    pub fn to_config_overrides(&self) -> Vec<String> {
        let mut overrides = Vec::new();
        if let Some(ref owner) = self.owner {
            overrides.push(format!("source/owner={owner}"));
        }
        if self.snippets {
            overrides.push("source/include_snippets=true".to_string());
        }
        if self.wikis {
            overrides.push("source/include_wikis=true".to_string());
        }
        overrides
    }
}

/// Arguments for the `backup` command.
#[derive(Debug, Clone, Default, Args)]
pub struct BackupArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Number of repositories processed concurrently.
    #[arg(short = 'w', long = "workers", value_name = "N",
        value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Archive format: tar, tar.gz (tgz) or zip.
    #[arg(short = 'f', long = "format", value_name = "FORMAT")]
    pub format: Option<ArchiveFormat>,

    /// Disables the progress spinner.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

impl BackupArgs {
    #[must_use]
    pub fn to_config_overrides(&self) -> Vec<String> {
        let mut overrides = self.source.to_config_overrides();
        if let Some(workers) = self.workers {
            overrides.push(format!("backup/workers={workers}"));
        }
        if let Some(format) = self.format {
            overrides.push(format!("backup/format={format}"));
        }
        overrides
    }
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Also lists descriptors removed by ignore patterns or the cut-off.
    #[arg(short = 'a', long = "all")]
    pub all: bool,
}
