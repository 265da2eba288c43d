// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use time::{Duration, OffsetDateTime};
use wax::{Glob, Program};

use super::types::RepositoryDescriptor;
use crate::config::types::SourceConfig;
use crate::error::ConfigError;

/// Why a descriptor was not dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Name matched an ignore pattern.
    Ignored(String),
    /// No push within the cut-off window.
    Stale { days: u32 },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ignored(pattern) => write!(f, "matches ignore pattern '{pattern}'"),
            Self::Stale { days } => write!(f, "no push in the last {days} days"),
        }
    }
}

/// Ignore patterns and cut-off applied before dispatch.
pub struct DescriptorFilter {
    ignore: Vec<(String, Glob<'static>)>,
    cutoff_days: u32,
    cutoff: Option<OffsetDateTime>,
}

impl DescriptorFilter {
    /// Filter that lets everything through.
    #[must_use]
    pub const fn allow_all() -> Self {
        Self {
            ignore: Vec::new(),
            cutoff_days: 0,
            cutoff: None,
        }
    }

    /// Compiles case-insensitive ignore globs and the cut-off relative to `now`.
    ///
    /// A cut-off reaching past the earliest representable date keeps everything.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a malformed glob.
    pub fn new(
        ignore: &[String],
        cutoff_days: u32,
        now: OffsetDateTime,
    ) -> Result<Self, ConfigError> {
        let ignore = ignore
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|pattern| {
                let source = format!("(?i){}", pattern.trim());
                Glob::new(&source)
                    .map(|glob| (pattern.trim().to_string(), glob.into_owned()))
                    .map_err(|e| ConfigError::InvalidValue {
                        section: "source".to_string(),
                        key: "ignore".to_string(),
                        message: format!("'{pattern}': {e}"),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cutoff = if cutoff_days > 0 {
            now.checked_sub(Duration::days(i64::from(cutoff_days)))
        } else {
            None
        };

        Ok(Self {
            ignore,
            cutoff_days,
            cutoff,
        })
    }

    /// Builds the filter from `[source]` against the current time.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a malformed glob.
    pub fn from_config(source: &SourceConfig) -> Result<Self, ConfigError> {
        Self::new(
            &source.ignore,
            source.cutoff_days,
            OffsetDateTime::now_utc(),
        )
    }

    /// Reason to skip `descriptor`, if any.
    #[must_use]
    pub fn skip_reason(&self, descriptor: &RepositoryDescriptor) -> Option<SkipReason> {
        if let Some((pattern, _)) = self
            .ignore
            .iter()
            .find(|(_, glob)| glob.is_match(descriptor.name()))
        {
            return Some(SkipReason::Ignored(pattern.clone()));
        }
        match (self.cutoff, descriptor.pushed_at()) {
            (Some(cutoff), Some(pushed)) if pushed < cutoff => Some(SkipReason::Stale {
                days: self.cutoff_days,
            }),
            _ => None,
        }
    }
}
