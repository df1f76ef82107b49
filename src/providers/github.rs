//! Code-hosting account metadata (GitHub REST API)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::types::{EntityKind, ResolvedEntity, SocialPlatform, SourceTier};
use crate::utils::constants::{GITHUB_API_URL, GITHUB_PAGE_URL};

use super::adapter::{AdapterOutcome, IntelAdapter, Unavailable};
use super::http::SourceClient;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoOwnerProfile {
    pub login: String,
    pub created_at: Option<DateTime<Utc>>,
    pub public_repos: u32,
    pub followers: u32,
    pub blog: Option<String>,
    pub twitter_username: Option<String>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub followers: u32,
    pub blog: Option<String>,
    pub twitter_username: Option<String>,
    pub html_url: Option<String>,
}

impl From<GitHubUser> for RepoOwnerProfile {
    fn from(user: GitHubUser) -> Self {
        let url = user
            .html_url
            .unwrap_or_else(|| format!("{}/{}", GITHUB_PAGE_URL, user.login));
        Self {
            login: user.login,
            created_at: user.created_at,
            public_repos: user.public_repos,
            followers: user.followers,
            // GitHub returns "" for an unset blog
            blog: user.blog.filter(|b| !b.trim().is_empty()),
            twitter_username: user.twitter_username.filter(|t| !t.trim().is_empty()),
            url,
        }
    }
}

/// `code-hosting` adapter
pub struct CodeHostingAdapter {
    http: SourceClient,
    token: Option<String>,
}

impl CodeHostingAdapter {
    pub fn new(http: SourceClient, token: Option<String>) -> Self {
        Self { http, token }
    }
}

#[async_trait]
impl IntelAdapter for CodeHostingAdapter {
    fn id(&self) -> &'static str {
        "code-hosting"
    }

    fn tier(&self) -> SourceTier {
        SourceTier::Api
    }

    fn applies_to(&self) -> &'static [EntityKind] {
        &[EntityKind::SocialHandle]
    }

    async fn fetch(&self, entity: &ResolvedEntity) -> AdapterOutcome {
        if !matches!(entity.platform, None | Some(SocialPlatform::GitHub)) {
            return AdapterOutcome::Unavailable(Unavailable::NotApplicable);
        }

        let url = format!("{}/users/{}", GITHUB_API_URL, entity.normalized_value);
        let mut headers = vec![("X-GitHub-Api-Version", "2022-11-28".to_string())];
        if let Some(token) = &self.token {
            headers.push(("Authorization", format!("Bearer {}", token)));
        }

        match self.http.get_json::<GitHubUser>("github", &url, &headers).await {
            Ok(user) => AdapterOutcome::Available(RepoOwnerProfile::from(user).into()),
            Err(e) => AdapterOutcome::Unavailable(Unavailable::from(e)),
        }
    }
}
