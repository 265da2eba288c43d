// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{
    CloneError, CloneFailureCause, ConfigError, Repo2S3Error, Repo2S3Result, UploadError,
};

#[test]
fn test_config_error_display() {
    let err = ConfigError::MissingKey {
        section: "source".to_string(),
        key: "owner".to_string(),
    };
    insta::assert_snapshot!(err.to_string(), @"missing required config key 'owner' in section '[source]'");
}

#[test]
fn test_repo2s3_error_size() {
    let size = std::mem::size_of::<Repo2S3Error>();
    assert!(size <= 24, "Repo2S3Error is {size} bytes, expected <= 24");
}

#[test]
fn test_repo2s3_result_size() {
    let size = std::mem::size_of::<Repo2S3Result<()>>();
    assert!(
        size <= 24,
        "Repo2S3Result<()> is {size} bytes, expected <= 24"
    );
}

#[test]
fn test_clone_cause_from_stderr() {
    let cases = [
        (
            "fatal: Authentication failed for 'https://github.com/a/b.git/'",
            CloneFailureCause::Auth,
        ),
        (
            "fatal: could not read Username for 'https://github.com': terminal prompts disabled",
            CloneFailureCause::Auth,
        ),
        (
            "remote: Repository not found.\nfatal: repository 'https://github.com/a/b.git/' not found",
            CloneFailureCause::NotFound,
        ),
        (
            "fatal: '/tmp/nope' does not appear to be a git repository",
            CloneFailureCause::NotFound,
        ),
        (
            "fatal: unable to access 'https://github.com/a/b.git/': Could not resolve host: github.com",
            CloneFailureCause::Network,
        ),
        ("fatal: something odd happened", CloneFailureCause::Other),
    ];

    for (stderr, expected) in cases {
        assert_eq!(CloneFailureCause::from_stderr(stderr), expected, "{stderr}");
    }
}

#[test]
fn test_clone_error_carries_cause() {
    let err = CloneError::Failed {
        url: "https://github.com/acme/widgets.git".to_string(),
        cause: CloneFailureCause::NotFound,
        message: "repository not found".to_string(),
    };
    assert_eq!(err.cause(), CloneFailureCause::NotFound);
    insta::assert_snapshot!(
        err.to_string(),
        @"failed to clone https://github.com/acme/widgets.git (not-found): repository not found"
    );

    let spawn = CloneError::Spawn(std::io::Error::other("no git"));
    assert_eq!(spawn.cause(), CloneFailureCause::Other);
}

#[test]
fn test_boxed_conversion() {
    let err: Repo2S3Error = UploadError::MissingFile("/tmp/x.zip".to_string()).into();
    assert!(matches!(err, Repo2S3Error::Upload(_)));
    assert_eq!(
        err.to_string(),
        "upload error: archive not found: /tmp/x.zip"
    );
}
