//! Per-module scoring inputs
//!
//! Every field is optional: any subset of facts may be missing for a given
//! entity. The count of populated fields drives report confidence.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity / team risk facts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityInput {
    /// Age of the project's primary account (code host, community server, token)
    pub account_age_days: Option<u32>,
    pub domain_age_days: Option<u32>,
    /// Whether any official website/social links are published
    pub has_verification_links: Option<bool>,
    /// Whether links published in different places agree with each other
    pub links_consistent: Option<bool>,
    pub team_anonymous: Option<bool>,
    pub team_kyc: Option<bool>,
}

/// Social / narrative-manipulation facts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialInput {
    /// Engagement (or online) rate in percent
    pub engagement_rate_pct: Option<f64>,
    pub burst_posting_detected: Option<bool>,
    /// Size of a coordinated amplifier cluster
    pub amplifier_cluster_size: Option<u32>,
    /// Follower growth in percent per day
    pub follower_growth_pct_per_day: Option<f64>,
}

/// Wallet behavior facts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletInput {
    pub deployer_age_days: Option<u32>,
    pub funded_by_fresh_wallet: Option<bool>,
    /// Count of team-wallet deposits to exchanges
    pub team_exchange_deposits: Option<u32>,
    pub suspicious_flow_count: Option<u32>,
    /// Associations with previously flagged wallets or tokens
    pub flagged_associations: Option<u32>,
}

/// Liquidity / token facts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidityInput {
    pub mint_authority_active: Option<bool>,
    pub freeze_authority_active: Option<bool>,
    /// Sells are blocked or taxed away
    pub honeypot_detected: Option<bool>,
    /// Share of supply still held by the creator, in percent
    pub creator_holding_pct: Option<f64>,
    pub lp_locked_pct: Option<f64>,
    pub lp_lock_days_remaining: Option<u32>,
    /// Share of liquidity withdrawn recently, in percent
    pub recent_lp_withdrawal_pct: Option<f64>,
    pub top10_holder_pct: Option<f64>,
    pub largest_holder_pct: Option<f64>,
    /// Share of supply unlocking within 30 days, in percent
    pub unlock_30d_pct: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub pool_changes_24h: Option<u32>,
}

/// Counts populated optional fields of an input record
pub trait FieldCount {
    /// Maximum number of optional fields
    const FIELDS: usize;

    fn supplied(&self) -> usize;
}

macro_rules! count_some {
    ($($field:expr),+ $(,)?) => {
        0 $(+ usize::from($field.is_some()))+
    };
}

impl FieldCount for IdentityInput {
    const FIELDS: usize = 6;

    fn supplied(&self) -> usize {
        count_some!(
            self.account_age_days,
            self.domain_age_days,
            self.has_verification_links,
            self.links_consistent,
            self.team_anonymous,
            self.team_kyc,
        )
    }
}

impl FieldCount for SocialInput {
    const FIELDS: usize = 4;

    fn supplied(&self) -> usize {
        count_some!(
            self.engagement_rate_pct,
            self.burst_posting_detected,
            self.amplifier_cluster_size,
            self.follower_growth_pct_per_day,
        )
    }
}

impl FieldCount for WalletInput {
    const FIELDS: usize = 5;

    fn supplied(&self) -> usize {
        count_some!(
            self.deployer_age_days,
            self.funded_by_fresh_wallet,
            self.team_exchange_deposits,
            self.suspicious_flow_count,
            self.flagged_associations,
        )
    }
}

impl FieldCount for LiquidityInput {
    const FIELDS: usize = 12;

    fn supplied(&self) -> usize {
        count_some!(
            self.mint_authority_active,
            self.freeze_authority_active,
            self.honeypot_detected,
            self.creator_holding_pct,
            self.lp_locked_pct,
            self.lp_lock_days_remaining,
            self.recent_lp_withdrawal_pct,
            self.top10_holder_pct,
            self.largest_holder_pct,
            self.unlock_30d_pct,
            self.liquidity_usd,
            self.pool_changes_24h,
        )
    }
}

/// Evidence grouped by module. A missing module is scored as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleInputs {
    pub identity: Option<IdentityInput>,
    pub social: Option<SocialInput>,
    pub wallet: Option<WalletInput>,
    pub liquidity: Option<LiquidityInput>,
    /// Field key (e.g. `liquidity.lp_locked_pct`) -> URL the fact came from
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub source_urls: HashMap<String, String>,
}

impl ModuleInputs {
    /// Total optional fields across all four modules
    pub const MAX_FIELDS: usize =
        IdentityInput::FIELDS + SocialInput::FIELDS + WalletInput::FIELDS + LiquidityInput::FIELDS;

    pub fn supplied_fields(&self) -> usize {
        self.identity.as_ref().map_or(0, FieldCount::supplied)
            + self.social.as_ref().map_or(0, FieldCount::supplied)
            + self.wallet.as_ref().map_or(0, FieldCount::supplied)
            + self.liquidity.as_ref().map_or(0, FieldCount::supplied)
    }

    pub fn source_url(&self, key: &str) -> String {
        self.source_urls.get(key).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_counts() {
        assert_eq!(ModuleInputs::MAX_FIELDS, 27);
        assert_eq!(ModuleInputs::default().supplied_fields(), 0);

        let inputs = ModuleInputs {
            identity: Some(IdentityInput {
                account_age_days: Some(10),
                team_anonymous: Some(true),
                ..Default::default()
            }),
            liquidity: Some(LiquidityInput {
                mint_authority_active: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(inputs.supplied_fields(), 3);
    }
}
