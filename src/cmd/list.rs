// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! List command implementation for repo2s3.

use futures_util::StreamExt;

use crate::backup::{DescriptorFilter, RepositoryDescriptor};
use crate::cli::backup::ListArgs;
use crate::config::Config;
use crate::error::Result;
use crate::source::{Enumerator, GitHubEnumerator};
use crate::storage::object_key;

/// One output line of `list`.
#[must_use]
pub fn format_entry(
    descriptor: &RepositoryDescriptor,
    config: &Config,
    skip: Option<&str>,
) -> String {
    let key = object_key(
        &config.storage.prefix,
        &descriptor.relative_key(config.backup.format),
    );
    let visibility = if descriptor.private() {
        "private"
    } else {
        "public"
    };
    let line = format!(
        "{}\t{}\t{visibility}\t{key}",
        descriptor.kind(),
        descriptor.full_name()
    );
    match skip {
        Some(reason) => format!("{line}\t(skipped: {reason})"),
        None => line,
    }
}

/// Main handler for list command.
///
/// Returns the number of descriptors that a backup would attempt.
///
/// # Errors
///
/// Returns an error if no owner is configured or enumeration fails.
pub async fn run_list_command(args: &ListArgs, config: &Config) -> Result<usize> {
    config.require_owner()?;
    let enumerator = GitHubEnumerator::from_config(&config.source)?;
    let filter = DescriptorFilter::from_config(&config.source)?;

    let mut stream = enumerator.descriptors();
    let mut selected = 0usize;
    while let Some(descriptor) = stream.next().await {
        let descriptor = descriptor?;
        match filter.skip_reason(&descriptor) {
            Some(reason) => {
                if args.all {
                    let reason = reason.to_string();
                    println!("{}", format_entry(&descriptor, config, Some(&reason)));
                }
            }
            None => {
                selected += 1;
                println!("{}", format_entry(&descriptor, config, None));
            }
        }
    }

    if selected == 0 {
        println!("No repositories found");
    }
    Ok(selected)
}
