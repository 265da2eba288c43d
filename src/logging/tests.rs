// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{LogConfig, LogLevel};

#[test]
fn test_log_level_bounds() {
    assert!(LogLevel::new(0).is_ok());
    assert!(LogLevel::new(5).is_ok());
    assert!(LogLevel::new(6).is_err());
    assert_eq!(LogLevel::from_u8(9), None);
}

#[test]
fn test_filter_caps_noisy_crates_at_info() {
    let filter = LogLevel::INFO.to_filter_string();
    assert!(filter.starts_with("info,"));
    assert!(filter.contains("aws_sdk_s3=warn"));
    assert!(filter.contains("reqwest=warn"));
}

#[test]
fn test_filter_is_plain_at_extremes() {
    insta::assert_snapshot!(LogLevel::SILENT.to_filter_string(), @"off");
    insta::assert_snapshot!(LogLevel::WARN.to_filter_string(), @"warn");
    insta::assert_snapshot!(LogLevel::TRACE.to_filter_string(), @"trace");
}

#[test]
fn test_log_config_empty_file_is_none() {
    let config = LogConfig::builder()
        .with_log_file(String::new())
        .build();
    assert!(config.log_file().is_none());

    let config = LogConfig::builder()
        .with_log_file("run.log".to_string())
        .build();
    assert_eq!(config.log_file(), Some("run.log"));
}

#[test]
fn test_log_level_deserialize_rejects_out_of_range() {
    let ok: LogLevel = serde_json::from_str("4").unwrap();
    assert_eq!(ok, LogLevel::DEBUG);
    assert!(serde_json::from_str::<LogLevel>("7").is_err());
}
