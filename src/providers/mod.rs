//! Providers Module - External Intelligence Sources
//!
//! One file per source, all behind the [`IntelAdapter`] contract.

pub mod adapter;
pub mod community;
pub mod dexscreener;
pub mod github;
pub mod http;
pub mod rdap;
pub mod security;
pub mod wayback;
pub mod website;

pub use adapter::*;
pub use community::{CommunityInfo, CommunityServerAdapter};
pub use dexscreener::{DexScreenerClient, MarketData, MarketFeedAdapter};
pub use github::{CodeHostingAdapter, RepoOwnerProfile};
pub use http::SourceClient;
pub use rdap::{DomainRecord, DomainRegistrationAdapter};
pub use security::{SecurityReport, SecurityReportAdapter};
pub use wayback::{ArchiveHistory, WebArchiveAdapter};
pub use website::{SiteCrawl, WebsiteCrawlAdapter};

use crate::models::config::ScanConfig;
use crate::models::errors::AppResult;

/// The production catalog. Registration order is priority within a tier.
pub fn default_registry(config: &ScanConfig) -> AppResult<AdapterRegistry> {
    let http = SourceClient::new(config.adapter_timeout)?;
    let market = DexScreenerClient::new(http.clone());

    Ok(AdapterRegistry::new()
        .with(SecurityReportAdapter::new(http.clone(), market.clone()))
        .with(MarketFeedAdapter::new(market))
        .with(DomainRegistrationAdapter::new(http.clone()))
        .with(CodeHostingAdapter::new(http.clone(), config.github_token.clone()))
        .with(CommunityServerAdapter::new(http.clone()))
        .with(WebArchiveAdapter::new(http.clone()))
        .with(WebsiteCrawlAdapter::new(http)))
}
