//! Web-archive history (Wayback Machine availability API)
//!
//! Asking for the snapshot closest to 1996 returns the earliest capture.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::types::{EntityKind, ResolvedEntity, SourceTier};
use crate::utils::constants::{WAYBACK_AVAILABLE_URL, WAYBACK_PAGE_URL};

use super::adapter::{AdapterOutcome, IntelAdapter, Unavailable};
use super::http::SourceClient;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveHistory {
    pub domain: String,
    /// None when the archive has never captured the site
    pub earliest_snapshot: Option<DateTime<Utc>>,
    pub snapshot_url: Option<String>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct WaybackResponse {
    #[serde(default)]
    pub archived_snapshots: WaybackSnapshots,
}

#[derive(Debug, Default, Deserialize)]
pub struct WaybackSnapshots {
    pub closest: Option<WaybackSnapshot>,
}

#[derive(Debug, Deserialize)]
pub struct WaybackSnapshot {
    #[serde(default)]
    pub available: bool,
    pub url: String,
    /// yyyyMMddHHmmss
    pub timestamp: String,
}

fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(ts, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| naive.and_utc())
}

impl WaybackResponse {
    pub fn into_history(self, domain: &str) -> ArchiveHistory {
        let closest = self.archived_snapshots.closest.filter(|s| s.available);
        ArchiveHistory {
            domain: domain.to_string(),
            earliest_snapshot: closest.as_ref().and_then(|s| parse_timestamp(&s.timestamp)),
            snapshot_url: closest.map(|s| s.url),
            url: format!("{}/*/{}", WAYBACK_PAGE_URL, domain),
        }
    }
}

/// `web-archive` adapter
pub struct WebArchiveAdapter {
    http: SourceClient,
}

impl WebArchiveAdapter {
    pub fn new(http: SourceClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl IntelAdapter for WebArchiveAdapter {
    fn id(&self) -> &'static str {
        "web-archive"
    }

    fn tier(&self) -> SourceTier {
        SourceTier::Api
    }

    fn applies_to(&self) -> &'static [EntityKind] {
        &[EntityKind::Domain]
    }

    async fn fetch(&self, entity: &ResolvedEntity) -> AdapterOutcome {
        let domain = &entity.normalized_value;
        let url = format!("{}?url={}&timestamp=19960101", WAYBACK_AVAILABLE_URL, domain);
        match self.http.get_json::<WaybackResponse>("wayback", &url, &[]).await {
            Ok(response) => AdapterOutcome::Available(response.into_history(domain).into()),
            Err(e) => AdapterOutcome::Unavailable(Unavailable::from(e)),
        }
    }
}
