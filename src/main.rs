// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config --> Logging --> Command Dispatch
//!   Backup | List | Options | Version
//! ```

use std::process::ExitCode;

use repo2s3::cli::global::GlobalOptions;
use repo2s3::cli::{self, Command};
use repo2s3::cmd::backup::run_backup_command;
use repo2s3::cmd::config::run_options_command;
use repo2s3::cmd::list::run_list_command;
use repo2s3::cmd::{EXIT_FATAL, exit_code_for};
use repo2s3::config::Config;
use repo2s3::config::loader::ConfigLoader;
use repo2s3::logging::LogConfig;
use repo2s3::logging::init_logging;

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Config file picked up from the current directory when present.
const DEFAULT_CONFIG_FILE: &str = "repo2s3.toml";

/// Prefix of configuration environment variables.
const ENV_PREFIX: &str = "REPO2S3";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    let command = match &cli.command {
        Some(Command::Version) => {
            handle_version_command();
            return ExitCode::SUCCESS;
        }
        Some(command) => command,
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let loader = match build_config_loader(&cli.global, command) {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("Invalid option: {e:#}");
            return ExitCode::from(EXIT_FATAL);
        }
    };
    let loaded_files = loader.format_loaded_files();
    let config = match loader.build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let _log_guard = match init_logging(&build_log_config(&config)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::from(EXIT_FATAL);
        }
    };
    for line in &loaded_files {
        tracing::debug!(file = %line, "loaded config");
    }

    dispatch_command(command, &config).await
}

fn build_log_config(config: &Config) -> LogConfig {
    let log_file = Some(config.global.log_file.clone()).filter(|p| !p.is_empty());
    LogConfig::builder()
        .with_console_level(config.global.log_level)
        .with_file_level(config.global.file_log_level)
        .maybe_with_log_file(log_file)
        .build()
}

async fn dispatch_command(command: &Command, config: &Config) -> ExitCode {
    let result = match command {
        Command::Version => {
            handle_version_command();
            Ok(0)
        }
        Command::Options => {
            run_options_command(config);
            Ok(0)
        }
        Command::Backup(args) => run_backup_command(args, config).await,
        Command::List(args) => run_list_command(args, config).await.map(|_| 0),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn handle_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}

fn build_config_loader(
    global: &GlobalOptions,
    command: &Command,
) -> repo2s3::error::Result<ConfigLoader> {
    let mut loader = ConfigLoader::new().add_toml_file_optional(DEFAULT_CONFIG_FILE);
    for path in &global.configs {
        loader = loader.add_toml_file(path);
    }
    loader = loader.with_env_prefix(ENV_PREFIX);
    for assignment in global
        .to_config_overrides()
        .into_iter()
        .chain(command.to_config_overrides())
    {
        loader = loader.set_assignment(&assignment)?;
    }
    Ok(loader)
}
