// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Backup command implementation for repo2s3.

use std::io::IsTerminal;
use std::sync::Arc;
use tracing::info;

use crate::backup::{DescriptorFilter, Orchestrator, Processor};
use crate::cli::backup::BackupArgs;
use crate::config::Config;
use crate::error::{Result, bail_out};
use crate::git::{ShellBackend, git_executable};
use crate::source::GitHubEnumerator;
use crate::storage::{self, LocalStore, ObjectStore};

/// Main handler for backup command.
///
/// Returns the process exit code for a completed run (0 or 1).
///
/// # Errors
///
/// Returns an error if the configuration is incomplete, `git` is missing,
/// the store cannot be configured, or the run aborts.
pub async fn run_backup_command(args: &BackupArgs, config: &Config) -> Result<u8> {
    config.validate_for_backup()?;

    let git = git_executable().ok_or_else(|| bail_out("git executable not found on PATH"))?;
    info!(git = %git.display(), "using git");

    // nothing is written to the store in a dry run
    let store: Arc<dyn ObjectStore> = if config.backup.dry_run {
        Arc::new(LocalStore::new(&config.storage.local_dir))
    } else {
        storage::connect(&config.storage).await?
    };
    info!(location = %store.location(), dry_run = config.backup.dry_run, "object store ready");

    let enumerator = GitHubEnumerator::from_config(&config.source)?;
    let filter = DescriptorFilter::from_config(&config.source)?;
    let cloner = Arc::new(ShellBackend::new(config.source.token()));
    let processor = Processor::from_config(config, cloner, store);

    let workers = config.backup.workers;
    let orchestrator = Orchestrator::new(Arc::new(enumerator), Arc::new(processor), workers)
        .with_filter(filter)
        .with_progress(!args.no_progress && std::io::stderr().is_terminal())
        .with_dry_run(config.backup.dry_run);

    let cancel_token = orchestrator.cancel_token();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, finishing in-flight repositories...");
            cancel_token.cancel();
        }
    });

    let result = orchestrator.run().await;
    signal.abort();
    let summary = result?;

    for line in summary.format_report() {
        println!("{line}");
    }
    Ok(summary.exit_code())
}
