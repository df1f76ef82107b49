//! Community-server metadata from Discord invites
//!
//! Guild ids are snowflakes, so the server's creation time comes for free:
//! the top 42 bits are milliseconds since the Discord epoch.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::types::{EntityKind, ResolvedEntity, SocialPlatform, SourceTier};
use crate::utils::constants::{DISCORD_API_URL, DISCORD_EPOCH_MS, DISCORD_INVITE_URL};

use super::adapter::{AdapterOutcome, IntelAdapter, Unavailable};
use super::http::SourceClient;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityInfo {
    pub guild_id: String,
    pub guild_name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub member_count: Option<u64>,
    pub online_count: Option<u64>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscordInvite {
    pub code: String,
    pub guild: Option<DiscordGuild>,
    pub approximate_member_count: Option<u64>,
    pub approximate_presence_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct DiscordGuild {
    pub id: String,
    pub name: String,
}

/// Creation time encoded in a Discord snowflake
pub fn snowflake_time(id: &str) -> Option<DateTime<Utc>> {
    let raw: u64 = id.parse().ok()?;
    let ms = (raw >> 22) as i64 + DISCORD_EPOCH_MS;
    Utc.timestamp_millis_opt(ms).single()
}

impl DiscordInvite {
    pub fn into_info(self) -> Option<CommunityInfo> {
        let guild = self.guild?;
        Some(CommunityInfo {
            created_at: snowflake_time(&guild.id),
            guild_id: guild.id,
            guild_name: guild.name,
            member_count: self.approximate_member_count,
            online_count: self.approximate_presence_count,
            url: format!("{}/{}", DISCORD_INVITE_URL, self.code),
        })
    }
}

/// `community-server` adapter
pub struct CommunityServerAdapter {
    http: SourceClient,
}

impl CommunityServerAdapter {
    pub fn new(http: SourceClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl IntelAdapter for CommunityServerAdapter {
    fn id(&self) -> &'static str {
        "community-server"
    }

    fn tier(&self) -> SourceTier {
        SourceTier::Api
    }

    fn applies_to(&self) -> &'static [EntityKind] {
        &[EntityKind::SocialHandle]
    }

    async fn fetch(&self, entity: &ResolvedEntity) -> AdapterOutcome {
        if entity.platform != Some(SocialPlatform::Discord) {
            return AdapterOutcome::Unavailable(Unavailable::NotApplicable);
        }

        // Resolver keeps Discord invite codes in their original case
        let url = format!(
            "{}/invites/{}?with_counts=true",
            DISCORD_API_URL, entity.normalized_value
        );

        match self.http.get_json::<DiscordInvite>("discord", &url, &[]).await {
            Ok(invite) => invite.into_info().ok_or(Unavailable::NotFound).into(),
            Err(e) => AdapterOutcome::Unavailable(Unavailable::from(e)),
        }
    }
}
