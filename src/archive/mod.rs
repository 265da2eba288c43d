// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Archive creation and archive naming.
//!
//! ```text
//! sanitize_name("a/b")         -> "a%2Fb"
//! archive_file_name("a/b", Zip) -> "a%2Fb.zip"
//!
//! create_archive(src, out, name, format)
//!   WalkBuilder (no filters, .git included, links not followed)
//!        |
//!        v
//!   NamedTempFile in `out` --tar|tar+gzip|zip--> persist(<sanitized>.<ext>)
//! ```

mod writer;


use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::error::ConfigError;

pub use writer::{create_archive, create_archive_blocking};

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// Uncompressed tar.
    #[serde(rename = "tar")]
    Tar,
    /// Gzip-compressed tar.
    #[default]
    #[serde(rename = "tar.gz", alias = "tgz")]
    TarGz,
    /// Deflate-compressed zip.
    #[serde(rename = "zip")]
    Zip,
}

impl ArchiveFormat {
    /// File extension without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }

    /// Format whose extension ends `file_name`.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        [Self::TarGz, Self::Tar, Self::Zip]
            .into_iter()
            .find(|f| {
                file_name
                    .strip_suffix(f.extension())
                    .is_some_and(|stem| stem.ends_with('.'))
            })
    }

    /// MIME type sent along with uploads.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Tar => "application/x-tar",
            Self::TarGz => "application/gzip",
            Self::Zip => "application/zip",
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for ArchiveFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tar" => Ok(Self::Tar),
            "tar.gz" | "tgz" => Ok(Self::TarGz),
            "zip" => Ok(Self::Zip),
            _ => Err(ConfigError::InvalidValue {
                section: "backup".to_string(),
                key: "format".to_string(),
                message: format!("expected 'tar', 'tar.gz' or 'zip', got '{s}'"),
            }),
        }
    }
}

const fn is_safe_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.' | b'-')
}

/// Makes a name safe for use as a single path component and object key segment.
///
/// Every byte outside `[A-Za-z0-9_.-]` is percent-encoded, as are `%` and a
/// leading `.`. The mapping is injective; [`restore_name`] reverses it.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, byte) in name.bytes().enumerate() {
        if is_safe_byte(byte) && !(i == 0 && byte == b'.') {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

/// Reverses [`sanitize_name`]. Returns `None` for malformed input.
#[must_use]
pub fn restore_name(sanitized: &str) -> Option<String> {
    let bytes = sanitized.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = sanitized.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Archive file name for a repository: `<sanitized name>.<ext>`.
#[must_use]
pub fn archive_file_name(name: &str, format: ArchiveFormat) -> String {
    format!("{}.{}", sanitize_name(name), format.extension())
}
