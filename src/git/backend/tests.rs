// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{CloneBackend, CloneMode, GixBackend, ShellBackend};
use crate::error::{CloneError, CloneFailureCause};
use std::path::Path;
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

fn git(args: &[&str], cwd: &Path) {
    let status = std::process::Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .status()
        .expect("failed to run git");
    assert!(status.success(), "git {args:?} failed");
}

fn source_repo(root: &Path) -> std::path::PathBuf {
    let src = root.join("origin");
    std::fs::create_dir_all(&src).unwrap();
    git(&["init", "--quiet"], &src);
    std::fs::write(src.join("README.md"), "hello\n").unwrap();
    git(&["add", "README.md"], &src);
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
        &src,
    );
    src
}

#[test]
fn test_gix_verify() {
    let temp = temp_dir();
    assert!(matches!(
        GixBackend::verify(temp.path()),
        Err(CloneError::InvalidRepository { .. })
    ));

    gix::init(temp.path()).expect("failed to init repo");
    assert!(GixBackend::verify(temp.path()).is_ok());
}

#[test]
fn test_clone_mode_from_mirror() {
    assert_eq!(CloneMode::from_mirror(true), CloneMode::Mirror);
    assert_eq!(CloneMode::from_mirror(false), CloneMode::Checkout);
}

#[tokio::test]
async fn test_shell_clone_checkout() {
    let temp = temp_dir();
    let src = source_repo(temp.path());
    let dest = temp.path().join("clone");
    let url = src.to_str().unwrap();

    ShellBackend::default()
        .clone_repo(url, &dest, CloneMode::Checkout)
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(dest.join("README.md")).unwrap(),
        "hello\n"
    );
    assert!(dest.join(".git").is_dir());
}

#[tokio::test]
async fn test_shell_clone_mirror_is_bare() {
    let temp = temp_dir();
    let src = source_repo(temp.path());
    let dest = temp.path().join("mirror.git");

    ShellBackend::default()
        .clone_repo(src.to_str().unwrap(), &dest, CloneMode::Mirror)
        .await
        .unwrap();

    assert!(dest.join("HEAD").is_file());
    assert!(!dest.join("README.md").exists());
}

#[tokio::test]
async fn test_shell_clone_missing_source_not_found() {
    let temp = temp_dir();
    let missing = temp.path().join("does-not-exist");
    let dest = temp.path().join("clone");

    let err = ShellBackend::default()
        .clone_repo(missing.to_str().unwrap(), &dest, CloneMode::Checkout)
        .await
        .unwrap_err();

    assert_eq!(err.cause(), CloneFailureCause::NotFound);
}

#[tokio::test]
async fn test_shell_clone_redacts_token() {
    let temp = temp_dir();
    let dest = temp.path().join("clone");
    let backend = ShellBackend::new(Some("sekrit-token-123"));

    // Nothing listens on port 9; the failure message still echoes the URL.
    let err = backend
        .clone_repo(
            "http://127.0.0.1:9/acme/repo.git",
            &dest,
            CloneMode::Checkout,
        )
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(!text.contains("sekrit-token-123"), "token leaked: {text}");
    assert!(matches!(err, CloneError::Failed { .. }));
}
