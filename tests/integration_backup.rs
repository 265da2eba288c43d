// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! End-to-end backup runs.
//!
//! A wiremock server plays the GitHub API, its clone URLs point at real git
//! repositories in a temp dir, and archives land in a local store.

use repo2s3::archive::ArchiveFormat;
use repo2s3::backup::{DescriptorFilter, FailureKind, Orchestrator, Processor};
use repo2s3::config::Config;
use repo2s3::error::{BackupError, EnumerationError};
use repo2s3::git::ShellBackend;
use repo2s3::source::GitHubEnumerator;
use repo2s3::storage::LocalStore;
use serde_json::json;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

fn git(args: &[&str], cwd: &Path) {
    let status = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .status()
        .expect("failed to run git");
    assert!(status.success(), "git {args:?} failed");
}

/// Creates a repository with one commit and returns its path.
fn origin(root: &Path, name: &str) -> PathBuf {
    let dir = root.join("origins").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    git(&["init", "--quiet"], &dir);
    std::fs::write(dir.join("README.md"), format!("# {name}\n")).unwrap();
    git(&["add", "README.md"], &dir);
    git(
        &[
            "-c",
            "user.name=repo2s3",
            "-c",
            "user.email=repo2s3@example.invalid",
            "commit",
            "--quiet",
            "-m",
            "init",
        ],
        &dir,
    );
    dir
}

fn repo_json(name: &str, clone_url: &str) -> serde_json::Value {
    json!({
        "name": name,
        "clone_url": clone_url,
        "description": format!("{name} backup"),
        "private": false,
        "pushed_at": "2025-01-01T00:00:00Z",
    })
}

async fn mock_org(server: &MockServer, repos: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/orgs/acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repos))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

fn config_for(server: &MockServer, root: &Path, format: ArchiveFormat) -> Config {
    let mut config = Config::default();
    config.source.api_url = server.uri();
    config.source.owner = "acme".to_string();
    config.backup.clone_root = root.join("clones");
    config.backup.workers = 2;
    config.backup.format = format;
    config.storage.prefix = "github".to_string();
    config.storage.local_dir = root.join("store");
    config
}

fn orchestrator(config: &Config) -> Orchestrator {
    let enumerator = GitHubEnumerator::from_config(&config.source).unwrap();
    let store = Arc::new(LocalStore::new(&config.storage.local_dir));
    let processor = Processor::from_config(config, Arc::new(ShellBackend::default()), store);
    Orchestrator::new(
        Arc::new(enumerator),
        Arc::new(processor),
        config.backup.workers,
    )
    .with_filter(DescriptorFilter::from_config(&config.source).unwrap())
    .with_dry_run(config.backup.dry_run)
}

fn tar_gz_entries(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().display().to_string())
        .collect()
}

#[tokio::test]
async fn test_backup_to_local_store() {
    let temp = temp_dir();
    let alpha = origin(temp.path(), "alpha");
    let beta = origin(temp.path(), "beta");
    let server = MockServer::start().await;
    mock_org(
        &server,
        json!([
            repo_json("alpha", &alpha.display().to_string()),
            repo_json("beta", &beta.display().to_string()),
        ]),
    )
    .await;
    let config = config_for(&server, temp.path(), ArchiveFormat::TarGz);

    let summary = orchestrator(&config).run().await.unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.exit_code(), 0);

    let archive = temp.path().join("store/github/acme/repos/alpha.tar.gz");
    let entries = tar_gz_entries(&archive);
    assert!(entries.contains(&"alpha/README.md".to_string()));
    assert!(entries.contains(&"alpha/REPOSITORY_DESCRIPTION.txt".to_string()));
    assert!(entries.iter().any(|e| e.starts_with("alpha/.git/")));
    let store = temp.path().join("store/github/acme/repos");
    assert!(store.join("beta.tar.gz").exists());

    // clones and local archives are gone
    let clones = temp.path().join("clones/acme/repos");
    assert!(!clones.join("work/alpha").exists());
    assert!(!clones.join("archives/alpha.tar.gz").exists());
}

#[tokio::test]
async fn test_zip_backup_contains_git_metadata() {
    let temp = temp_dir();
    let alpha = origin(temp.path(), "alpha");
    let server = MockServer::start().await;
    let repos = json!([repo_json("alpha", &alpha.display().to_string())]);
    mock_org(&server, repos).await;
    let config = config_for(&server, temp.path(), ArchiveFormat::Zip);

    let summary = orchestrator(&config).run().await.unwrap();
    assert_eq!(summary.succeeded, 1);

    let file = std::fs::File::open(temp.path().join("store/github/acme/repos/alpha.zip")).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    assert!(zip.file_names().any(|n| n == "alpha/.git/HEAD"));
    let mut readme = String::new();
    zip.by_name("alpha/README.md")
        .unwrap()
        .read_to_string(&mut readme)
        .unwrap();
    assert_eq!(readme, "# alpha\n");
}

#[tokio::test]
async fn test_missing_repository_is_clone_failure() {
    let temp = temp_dir();
    let alpha = origin(temp.path(), "alpha");
    let missing = temp.path().join("origins/nowhere");
    let server = MockServer::start().await;
    mock_org(
        &server,
        json!([
            repo_json("alpha", &alpha.display().to_string()),
            repo_json("nowhere", &missing.display().to_string()),
        ]),
    )
    .await;
    let config = config_for(&server, temp.path(), ArchiveFormat::Tar);

    let summary = orchestrator(&config).run().await.unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed_names(), vec!["acme/nowhere"]);
    assert_eq!(summary.failures[0].failure, FailureKind::CloneFailure);
    assert_eq!(summary.exit_code(), 1);
    assert!(!temp.path().join("clones/acme/repos/work/nowhere").exists());
}

#[tokio::test]
async fn test_repeated_runs_overwrite_same_key() {
    let temp = temp_dir();
    let alpha = origin(temp.path(), "alpha");
    let server = MockServer::start().await;
    let repos = json!([repo_json("alpha", &alpha.display().to_string())]);
    mock_org(&server, repos).await;
    let config = config_for(&server, temp.path(), ArchiveFormat::TarGz);

    orchestrator(&config).run().await.unwrap();
    orchestrator(&config).run().await.unwrap();

    let dir = temp.path().join("store/github/acme/repos");
    let files: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec!["alpha.tar.gz"]);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let temp = temp_dir();
    let alpha = origin(temp.path(), "alpha");
    let server = MockServer::start().await;
    let repos = json!([repo_json("alpha", &alpha.display().to_string())]);
    mock_org(&server, repos).await;
    let mut config = config_for(&server, temp.path(), ArchiveFormat::TarGz);
    config.backup.dry_run = true;

    let summary = orchestrator(&config).run().await.unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.succeeded, 1);
    assert!(!temp.path().join("store").exists());
}

#[tokio::test]
async fn test_ignored_repositories_are_not_cloned() {
    let temp = temp_dir();
    let alpha = origin(temp.path(), "alpha");
    let server = MockServer::start().await;
    mock_org(
        &server,
        json!([
            repo_json("alpha", &alpha.display().to_string()),
            repo_json("scratch-1", "/does/not/exist"),
        ]),
    )
    .await;
    let mut config = config_for(&server, temp.path(), ArchiveFormat::TarGz);
    config.source.ignore = vec!["scratch-*".to_string()];

    let summary = orchestrator(&config).run().await.unwrap();

    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn test_unknown_owner_aborts_run() {
    let temp = temp_dir();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let config = config_for(&server, temp.path(), ArchiveFormat::TarGz);

    let result = orchestrator(&config).run().await;

    assert!(matches!(
        result,
        Err(BackupError::Enumeration(EnumerationError::InvalidOwner { .. }))
    ));
}
