//! Website crawl
//!
//! Fetches the landing page of a domain and extracts what a project says
//! about itself: outbound social accounts and team / KYC / audit claims.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::core::resolver;
use crate::models::types::{EntityKind, ResolvedEntity, SocialPlatform, SourceTier};

use super::adapter::{AdapterOutcome, IntelAdapter, Unavailable};
use super::http::SourceClient;

lazy_static! {
    static ref TEAM_NAMED: Regex =
        Regex::new(r"(?i)\b(our team|core team|meet the team|co-?founder|founder|ceo|cto)\b").unwrap();
    static ref TEAM_ANON: Regex =
        Regex::new(r"(?i)\b(anon(ymous)? (team|dev|devs|founders?)|team is anon(ymous)?)\b").unwrap();
    static ref KYC: Regex = Regex::new(r"(?i)\b(kyc|doxx?ed)\b").unwrap();
    static ref AUDIT: Regex = Regex::new(r"(?i)\baudit(ed)?\b").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SiteCrawl {
    pub url: String,
    pub title: Option<String>,
    /// Distinct (platform, handle) pairs linked from the page
    pub social_accounts: Vec<(SocialPlatform, String)>,
    pub names_team: bool,
    pub claims_anonymous_team: bool,
    pub claims_kyc: bool,
    pub claims_audit: bool,
}

impl SiteCrawl {
    pub fn from_html(url: &str, html: &str) -> Self {
        let document = Html::parse_document(html);

        let title = Selector::parse("title").ok().and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty())
        });

        let mut social_accounts = Vec::new();
        if let Ok(selector) = Selector::parse("a[href]") {
            for href in document.select(&selector).filter_map(|a| a.value().attr("href")) {
                let Some(entity) = resolver::resolve(href) else {
                    continue;
                };
                let (EntityKind::SocialHandle, Some(platform)) = (entity.kind, entity.platform) else {
                    continue;
                };
                let account = (platform, entity.normalized_value);
                if !social_accounts.contains(&account) {
                    social_accounts.push(account);
                }
            }
        }

        let text = Selector::parse("body")
            .ok()
            .and_then(|selector| document.select(&selector).next())
            .map(|body| body.text().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();

        Self {
            url: url.to_string(),
            title,
            social_accounts,
            names_team: TEAM_NAMED.is_match(&text),
            claims_anonymous_team: TEAM_ANON.is_match(&text),
            claims_kyc: KYC.is_match(&text),
            claims_audit: AUDIT.is_match(&text),
        }
    }

    /// Every platform links to a single account
    pub fn links_consistent(&self) -> bool {
        let mut per_platform: BTreeMap<&str, usize> = BTreeMap::new();
        for (platform, _) in &self.social_accounts {
            *per_platform.entry(platform.as_str()).or_default() += 1;
        }
        per_platform.values().all(|count| *count == 1)
    }
}

/// `website-crawl` adapter
pub struct WebsiteCrawlAdapter {
    http: SourceClient,
}

impl WebsiteCrawlAdapter {
    pub fn new(http: SourceClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl IntelAdapter for WebsiteCrawlAdapter {
    fn id(&self) -> &'static str {
        "website-crawl"
    }

    fn tier(&self) -> SourceTier {
        SourceTier::Scrape
    }

    fn applies_to(&self) -> &'static [EntityKind] {
        &[EntityKind::Domain]
    }

    async fn fetch(&self, entity: &ResolvedEntity) -> AdapterOutcome {
        let url = format!("https://{}/", entity.normalized_value);
        debug!("Crawling: {}", url);

        match self.http.get_text("website", &url).await {
            Ok(html) => AdapterOutcome::Available(SiteCrawl::from_html(&url, &html).into()),
            Err(e) => AdapterOutcome::Unavailable(Unavailable::from(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
        <head><title> Larp Protocol </title></head>
        <body>
            <h1>The future of finance</h1>
            <p>Audited by nobody in particular. Our team is fully KYC'd.</p>
            <a href="https://x.com/LarpProtocol">Twitter</a>
            <a href="https://twitter.com/larpprotocol">Twitter (old)</a>
            <a href="https://t.me/larp_chat">Telegram</a>
            <a href="/docs">Docs</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_extracts_links_and_claims() {
        let crawl = SiteCrawl::from_html("https://larp.example/", PAGE);
        assert_eq!(crawl.title.as_deref(), Some("Larp Protocol"));
        assert_eq!(
            crawl.social_accounts,
            vec![
                (SocialPlatform::Twitter, "larpprotocol".to_string()),
                (SocialPlatform::Telegram, "larp_chat".to_string()),
            ]
        );
        assert!(crawl.names_team);
        assert!(crawl.claims_kyc);
        assert!(crawl.claims_audit);
        assert!(!crawl.claims_anonymous_team);
        assert!(crawl.links_consistent());
    }

    #[test]
    fn test_conflicting_accounts_are_inconsistent() {
        let html = r#"<body>
            <a href="https://x.com/larp_one">a</a>
            <a href="https://x.com/larp_two">b</a>
            <p>Built by an anonymous team.</p>
        </body>"#;
        let crawl = SiteCrawl::from_html("https://larp.example/", html);
        assert!(!crawl.links_consistent());
        assert!(crawl.claims_anonymous_team);
        assert!(!crawl.names_team);
    }
}
