// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::Config;
use super::types::{DEFAULT_WORKERS, StorageBackend};
use crate::archive::ArchiveFormat;
use crate::error::ConfigError;
use crate::logging::LogLevel;
use std::path::PathBuf;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.global.log_level, LogLevel::INFO);
    assert_eq!(config.source.api_url, "https://api.github.com");
    assert_eq!(config.source.per_page, 100);
    assert_eq!(config.backup.workers, DEFAULT_WORKERS);
    assert_eq!(config.backup.format, ArchiveFormat::TarGz);
    assert!(config.backup.write_description);
    assert_eq!(config.storage.backend, StorageBackend::S3);
    assert_eq!(config.storage.prefix, "github");
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_full_document() {
    let config = Config::parse(
        r#"
[global]
log_level = 4
log_file = "logs/run.log"

[source]
owner = "acme"
token = "ghp_secret"
include_snippets = true
include_wikis = true
per_page = 50
ignore = ["archive-*", "Scratch"]
cutoff_days = 30

[backup]
clone_root = "/var/tmp/r2s"
workers = 8
format = "zip"
mirror = true
write_description = false

[storage]
backend = "local"
local_dir = "/srv/archives"
prefix = ""
"#,
    )
    .unwrap();

    assert_eq!(config.global.log_level, LogLevel::DEBUG);
    assert_eq!(config.global.log_file, "logs/run.log");
    assert_eq!(config.source.owner, "acme");
    assert_eq!(config.source.token(), Some("ghp_secret"));
    assert!(config.source.include_snippets);
    assert!(config.source.include_wikis);
    assert_eq!(config.source.per_page, 50);
    assert_eq!(config.source.ignore, vec!["archive-*", "Scratch"]);
    assert_eq!(config.source.cutoff_days, 30);
    assert_eq!(config.backup.clone_root, PathBuf::from("/var/tmp/r2s"));
    assert_eq!(config.backup.workers, 8);
    assert_eq!(config.backup.format, ArchiveFormat::Zip);
    assert!(config.backup.mirror);
    assert!(!config.backup.write_description);
    assert_eq!(config.storage.backend, StorageBackend::Local);
    assert_eq!(config.storage.local_dir, PathBuf::from("/srv/archives"));
    assert!(config.storage.prefix.is_empty());
}

#[test]
fn test_format_aliases() {
    let config = Config::parse("[backup]\nformat = \"tgz\"\n").unwrap();
    assert_eq!(config.backup.format, ArchiveFormat::TarGz);

    let config = Config::parse("[backup]\nformat = \"tar\"\n").unwrap();
    assert_eq!(config.backup.format, ArchiveFormat::Tar);

    assert!(Config::parse("[backup]\nformat = \"rar\"\n").is_err());
}

#[test]
fn test_unknown_key_rejected() {
    assert!(Config::parse("[backup]\nthreads = 3\n").is_err());
    assert!(Config::parse("[nonsense]\nx = 1\n").is_err());
}

#[test]
fn test_zero_workers_rejected() {
    let err = Config::parse("[backup]\nworkers = 0\n").unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"invalid value for 'workers' in section '[backup]': must be at least 1"
    );
}

#[test]
fn test_per_page_out_of_range_rejected() {
    let mut config = Config::default();
    config.source.per_page = 0;
    assert!(config.validate().is_err());
    config.source.per_page = 101;
    assert!(config.validate().is_err());
    config.source.per_page = 1;
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_api_url_rejected() {
    let mut config = Config::default();
    config.source.api_url = "not a url".to_string();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue { ref key, .. }) if key == "api_url"
    ));
}

#[test]
fn test_require_owner() {
    let mut config = Config::default();
    assert!(matches!(
        config.require_owner(),
        Err(ConfigError::MissingKey { ref key, .. }) if key == "owner"
    ));

    config.source.owner = "  acme ".to_string();
    assert_eq!(config.require_owner().unwrap(), "acme");
}

#[test]
fn test_bucket_required_for_s3_unless_dry_run() {
    let mut config = Config::default();
    config.source.owner = "acme".to_string();

    let err = config.validate_for_backup().unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"missing required config key 'bucket' in section '[storage]'"
    );

    config.backup.dry_run = true;
    assert!(config.validate_for_backup().is_ok());

    config.backup.dry_run = false;
    config.storage.backend = StorageBackend::Local;
    assert!(config.validate_for_backup().is_ok());
}

#[test]
fn test_set_assignment_overrides() {
    let config = Config::builder()
        .add_toml_str("[backup]\nworkers = 2\n")
        .set_assignment("backup.workers=6")
        .unwrap()
        .set_assignment("source/owner = acme")
        .unwrap()
        .set_assignment("backup.dry_run=true")
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(config.backup.workers, 6);
    assert_eq!(config.source.owner, "acme");
    assert!(config.backup.dry_run);
}

#[test]
fn test_set_assignment_requires_equals() {
    assert!(Config::builder().set_assignment("backup.workers").is_err());
    assert!(Config::builder().set_assignment("=3").is_err());
}

#[test]
fn test_format_options_hides_secrets() {
    let mut config = Config::default();
    config.source.token = "ghp_secret".to_string();
    config.storage.access_key_id = "AKIA123".to_string();
    config.storage.secret_access_key = "shh".to_string();

    let lines = config.format_options().join("\n");
    assert!(!lines.contains("ghp_secret"));
    assert!(!lines.contains("AKIA123"));
    assert!(!lines.contains("shh"));
    assert!(lines.contains("[hidden]"));
    assert!(lines.contains("backup.workers"));
}

#[test]
fn test_format_options_sorted() {
    let lines = Config::default().format_options();
    let keys: Vec<&str> = lines
        .iter()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(keys, sorted);
    assert!(!keys.contains(&"source.token"));
}

#[test]
fn test_static_credentials_need_both_halves() {
    let mut config = Config::default();
    config.storage.access_key_id = "AKIA".to_string();
    assert!(config.storage.static_credentials().is_none());
    config.storage.secret_access_key = "secret".to_string();
    assert_eq!(
        config.storage.static_credentials(),
        Some(("AKIA", "secret"))
    );
}

#[test]
fn test_storage_backend_parse() {
    assert_eq!("S3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
    assert_eq!(
        "local".parse::<StorageBackend>().unwrap(),
        StorageBackend::Local
    );
    assert!("gcs".parse::<StorageBackend>().is_err());
}
