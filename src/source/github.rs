// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! GitHub REST API enumerator.

use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::OnceLock;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info, warn};

use super::Enumerator;
use crate::backup::{RepositoryDescriptor, SourceKind};
use crate::config::types::SourceConfig;
use crate::error::EnumerationError;

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

/// Global HTTP client - initialized once, reused across all requests.
/// Falls back to a basic client if custom configuration fails.
fn global_client() -> &'static Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        Client::builder()
            .user_agent(format!("repo2s3/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

/// Account type behind an owner name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Organization,
    User,
}

impl ProfileKind {
    const fn segment(self) -> &'static str {
        match self {
            Self::Organization => "orgs",
            Self::User => "users",
        }
    }
}

#[derive(Debug, Deserialize)]
struct RepoItem {
    name: String,
    clone_url: String,
    description: Option<String>,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    has_wiki: bool,
    pushed_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GistItem {
    id: String,
    git_pull_url: String,
    description: Option<String>,
    #[serde(default = "default_public")]
    public: bool,
    updated_at: Option<String>,
}

const fn default_public() -> bool {
    true
}

fn parse_timestamp(value: Option<&str>) -> Option<OffsetDateTime> {
    let value = value?;
    OffsetDateTime::parse(value, &Rfc3339)
        .inspect_err(|e| debug!(value, error = %e, "ignoring unparsable timestamp"))
        .ok()
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Detect,
    Repos { profile: ProfileKind, page: u32 },
    Gists { page: u32 },
    Done,
}

struct PageState {
    phase: Phase,
    buffer: VecDeque<RepositoryDescriptor>,
}

/// Lists repositories (and optionally gists) of one GitHub owner.
#[derive(Debug, Clone)]
pub struct GitHubEnumerator {
    client: Client,
    api_url: Url,
    owner: String,
    token: Option<String>,
    per_page: u8,
    include_snippets: bool,
    include_wikis: bool,
}

impl GitHubEnumerator {
    /// Creates an enumerator for `owner` against `api_url`.
    ///
    /// # Errors
    ///
    /// Returns `EnumerationError::InvalidUrl` if `api_url` is not a usable base URL.
    pub fn new(api_url: &str, owner: &str) -> Result<Self, EnumerationError> {
        let api_url = Url::parse(api_url)
            .map_err(|e| EnumerationError::InvalidUrl(format!("{api_url}: {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(EnumerationError::InvalidUrl(api_url.to_string()));
        }
        Ok(Self {
            client: global_client().clone(),
            api_url,
            owner: owner.to_string(),
            token: None,
            per_page: 100,
            include_snippets: false,
            include_wikis: false,
        })
    }

    /// Creates an enumerator from `[source]`.
    ///
    /// # Errors
    ///
    /// Returns `EnumerationError::InvalidUrl` if `source.api_url` is unusable.
    pub fn from_config(source: &SourceConfig) -> Result<Self, EnumerationError> {
        Ok(Self::new(&source.api_url, source.owner.trim())?
            .with_token(source.token())
            .with_per_page(source.per_page)
            .with_snippets(source.include_snippets)
            .with_wikis(source.include_wikis))
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<&str>) -> Self {
        self.token = token.filter(|t| !t.is_empty()).map(str::to_string);
        self
    }

    /// Page size, clamped to 1-100.
    #[must_use]
    pub fn with_per_page(mut self, per_page: u8) -> Self {
        self.per_page = per_page.clamp(1, 100);
        self
    }

    #[must_use]
    pub const fn with_snippets(mut self, include: bool) -> Self {
        self.include_snippets = include;
        self
    }

    /// Follows every repository that has its wiki enabled with a
    /// [`SourceKind::Wiki`] descriptor.
    #[must_use]
    pub const fn with_wikis(mut self, include: bool) -> Self {
        self.include_wikis = include;
        self
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    fn endpoint(&self, segments: &[&str], page: Option<u32>) -> Result<Url, EnumerationError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| EnumerationError::InvalidUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if let Some(page) = page {
            url.query_pairs_mut()
                .append_pair("per_page", &self.per_page.to_string())
                .append_pair("page", &page.to_string());
        }
        Ok(url)
    }

    async fn get(&self, url: &Url) -> Result<reqwest::Response, EnumerationError> {
        let mut request = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        debug!(%url, "GET");
        Ok(request.send().await?)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<T, EnumerationError> {
        let response = self.get(&url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EnumerationError::HttpError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| EnumerationError::InvalidPayload {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    /// Determines whether the owner is an organization or a user.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOwner` when neither endpoint knows the owner, or
    /// `HttpError` for any other unsuccessful response.
    pub async fn detect_profile(&self) -> Result<ProfileKind, EnumerationError> {
        for kind in [ProfileKind::Organization, ProfileKind::User] {
            let url = self.endpoint(&[kind.segment(), &self.owner], None)?;
            let status = self.get(&url).await?.status();
            if status.is_success() {
                info!(owner = %self.owner, profile = ?kind, "profile detected");
                return Ok(kind);
            }
            if status != StatusCode::NOT_FOUND {
                return Err(EnumerationError::HttpError {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
        }
        Err(EnumerationError::InvalidOwner {
            owner: self.owner.clone(),
        })
    }

    async fn repo_page(
        &self,
        profile: ProfileKind,
        page: u32,
    ) -> Result<Vec<RepositoryDescriptor>, EnumerationError> {
        let url = self.endpoint(&[profile.segment(), &self.owner, "repos"], Some(page))?;
        let items: Vec<RepoItem> = self.get_json(url).await?;
        let mut descriptors = Vec::with_capacity(items.len());
        for item in items {
            let pushed_at = parse_timestamp(item.pushed_at.as_deref());
            let has_wiki = item.has_wiki;
            let repo = RepositoryDescriptor::new(
                &self.owner,
                item.name,
                item.clone_url,
                SourceKind::Repository,
            )
            .with_description(item.description)
            .with_private(item.private)
            .with_pushed_at(pushed_at);
            let wiki = if self.include_wikis && has_wiki {
                repo.wiki()
            } else {
                None
            };
            descriptors.push(repo);
            descriptors.extend(wiki);
        }
        Ok(descriptors)
    }

    async fn gist_page(&self, page: u32) -> Result<Vec<RepositoryDescriptor>, EnumerationError> {
        let url = self.endpoint(&["users", &self.owner, "gists"], Some(page))?;
        let items: Vec<GistItem> = self.get_json(url).await?;
        Ok(items
            .into_iter()
            .map(|item| {
                let updated_at = parse_timestamp(item.updated_at.as_deref());
                RepositoryDescriptor::new(
                    &self.owner,
                    item.id,
                    item.git_pull_url,
                    SourceKind::Snippet,
                )
                .with_description(item.description)
                .with_private(!item.public)
                .with_pushed_at(updated_at)
            })
            .collect())
    }

    /// Advances the page state machine by one request.
    async fn advance(
        &self,
        phase: Phase,
    ) -> Result<(Phase, Vec<RepositoryDescriptor>), EnumerationError> {
        match phase {
            Phase::Detect => {
                let profile = self.detect_profile().await?;
                if self.include_snippets && profile == ProfileKind::Organization {
                    warn!(owner = %self.owner, "organizations have no gists, skipping snippets");
                }
                Ok((Phase::Repos { profile, page: 1 }, Vec::new()))
            }
            Phase::Repos { profile, page } => {
                let items = self.repo_page(profile, page).await?;
                debug!(owner = %self.owner, page, count = items.len(), "repository page");
                let next = if !items.is_empty() {
                    Phase::Repos {
                        profile,
                        page: page + 1,
                    }
                } else if self.include_snippets && profile == ProfileKind::User {
                    Phase::Gists { page: 1 }
                } else {
                    Phase::Done
                };
                Ok((next, items))
            }
            Phase::Gists { page } => {
                let items = self.gist_page(page).await?;
                debug!(owner = %self.owner, page, count = items.len(), "gist page");
                let next = if items.is_empty() {
                    Phase::Done
                } else {
                    Phase::Gists { page: page + 1 }
                };
                Ok((next, items))
            }
            Phase::Done => Ok((Phase::Done, Vec::new())),
        }
    }
}

impl Enumerator for GitHubEnumerator {
    fn descriptors(&self) -> BoxStream<'_, Result<RepositoryDescriptor, EnumerationError>> {
        let state = PageState {
            phase: Phase::Detect,
            buffer: VecDeque::new(),
        };
        stream::unfold(state, move |mut state| async move {
            loop {
                if let Some(descriptor) = state.buffer.pop_front() {
                    return Some((Ok(descriptor), state));
                }
                if matches!(state.phase, Phase::Done) {
                    return None;
                }
                match self.advance(state.phase).await {
                    Ok((next, items)) => {
                        state.phase = next;
                        state.buffer.extend(items);
                    }
                    Err(e) => {
                        state.phase = Phase::Done;
                        return Some((Err(e), state));
                    }
                }
            }
        })
        .boxed()
    }
}
