// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Credentials in clone URLs.

use reqwest::Url;

/// Placeholder written in place of a token.
pub const REDACTED: &str = "***";

/// User name GitHub accepts alongside a token in HTTPS URLs.
const TOKEN_USER: &str = "x-access-token";

/// Embeds `token` into an HTTP(S) clone URL.
///
/// Other schemes, local paths, and unparsable input are returned unchanged.
#[must_use]
pub fn authenticated_url(url: &str, token: &str) -> String {
    if token.is_empty() {
        return url.to_string();
    }
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return url.to_string();
    }
    if parsed.set_username(TOKEN_USER).is_err() || parsed.set_password(Some(token)).is_err() {
        return url.to_string();
    }
    parsed.to_string()
}

/// Replaces every occurrence of `token` in `text`.
#[must_use]
pub fn redact(text: &str, token: &str) -> String {
    if token.is_empty() {
        text.to_string()
    } else {
        text.replace(token, REDACTED)
    }
}
