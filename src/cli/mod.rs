// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for repo2s3 using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! repo2s3 [global options] <command>
//! backup   (run, start)
//! list
//! options
//! version
//! ```

pub mod backup;
pub mod global;


use crate::cli::backup::{BackupArgs, ListArgs};
use crate::cli::global::GlobalOptions;
use clap::{Parser, Subcommand};

/// Source Repository Backup to Object Storage
///
/// Clones every repository of a GitHub account, archives it and uploads it.
#[derive(Debug, Parser)]
#[command(
    name = "repo2s3",
    author,
    version,
    about = "Back up GitHub repositories to S3",
    long_about = "repo2s3 Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Clones every repository (and optionally every gist) of a GitHub\n\
                  organization or user, packs each clone into an archive and\n\
                  uploads it to an S3 bucket.\n\n\
                  Invoking `repo2s3 backup -o some-org` backs up everything. See\n\
                  `repo2s3 <command> --help` for more information about a command.",
    after_help = "CONFIG FILES:\n\n\
                  repo2s3 loads `repo2s3.toml` from the current directory if it\n\
                  exists, then every file given with --config in order. REPO2S3_*\n\
                  environment variables override files (REPO2S3_SOURCE__TOKEN sets\n\
                  source.token), and --set plus dedicated flags override everything."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    Version,

    /// Lists all options and their effective values.
    Options,

    /// Backs up every repository of the owner.
    #[command(visible_aliases = ["run", "start"])]
    Backup(BackupArgs),

    /// Lists the repositories that would be backed up and their keys.
    List(ListArgs),
}

impl Command {
    /// Config overrides contributed by command-specific flags.
    #[must_use]
    pub fn to_config_overrides(&self) -> Vec<String> {
        match self {
            Self::Backup(args) => args.to_config_overrides(),
            Self::List(args) => args.source.to_config_overrides(),
            Self::Version | Self::Options => Vec::new(),
        }
    }
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
