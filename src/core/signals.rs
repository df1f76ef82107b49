//! Evidence translation: source payloads → module input records
//!
//! Several sources can answer the same question (a domain's age comes from
//! RDAP and, less precisely, from the web archive). The evidence set is
//! already in priority order, so the first payload to supply a field keeps
//! it. Source URLs are tracked per field for the evidence trail.

use chrono::{DateTime, Utc};

use crate::core::aggregator::EvidenceSet;
use crate::models::inputs::{
    FieldCount, IdentityInput, LiquidityInput, ModuleInputs, SocialInput, WalletInput,
};
use crate::providers::adapter::Payload;

/// Accumulates module inputs with first-writer-wins semantics
#[derive(Default)]
struct InputBuilder {
    identity: IdentityInput,
    social: SocialInput,
    wallet: WalletInput,
    liquidity: LiquidityInput,
    inputs: ModuleInputs,
}

macro_rules! fill {
    ($builder:expr, $module:ident . $field:ident, $value:expr, $url:expr) => {{
        let value = $value;
        if $builder.$module.$field.is_none() && value.is_some() {
            $builder.$module.$field = value;
            $builder.inputs.source_urls.insert(
                concat!(stringify!($module), ".", stringify!($field)).to_string(),
                $url.to_string(),
            );
        }
    }};
}

fn days_since(t: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<u32> {
    t.map(|t| (now - t).num_days().max(0) as u32)
}

fn keep_if_supplied<T: FieldCount>(input: T) -> Option<T> {
    (input.supplied() > 0).then_some(input)
}

impl InputBuilder {
    fn absorb(&mut self, payload: &Payload, now: DateTime<Utc>) {
        match payload {
            Payload::SecurityReport(sec) => {
                let url = &sec.url;
                fill!(self, liquidity.mint_authority_active, sec.mint_authority_active, url);
                fill!(self, liquidity.freeze_authority_active, sec.freeze_authority_active, url);
                fill!(self, liquidity.honeypot_detected, sec.is_honeypot, url);
                fill!(self, liquidity.creator_holding_pct, sec.creator_holding_pct, url);
                fill!(self, liquidity.lp_locked_pct, sec.lp_locked_pct, url);
                fill!(self, liquidity.top10_holder_pct, sec.top10_holder_pct, url);
                fill!(self, liquidity.largest_holder_pct, sec.largest_holder_pct, url);
                fill!(self, wallet.flagged_associations, sec.same_creator_flagged, url);
                fill!(self, wallet.suspicious_flow_count, sec.insider_networks, url);
            }
            Payload::MarketData(market) => {
                let url = &market.url;
                fill!(self, liquidity.liquidity_usd, Some(market.liquidity_usd), url);
                fill!(self, liquidity.pool_changes_24h, Some(market.pairs_created_24h), url);
                let has_links = !market.websites.is_empty() || !market.socials.is_empty();
                fill!(self, identity.has_verification_links, Some(has_links), url);
            }
            Payload::DomainRecord(record) => {
                fill!(self, identity.domain_age_days, days_since(record.registered_at, now), &record.url);
            }
            Payload::RepoOwner(profile) => {
                let url = &profile.url;
                fill!(self, identity.account_age_days, days_since(profile.created_at, now), url);
                let has_links = profile.blog.is_some() || profile.twitter_username.is_some();
                fill!(self, identity.has_verification_links, Some(has_links), url);
            }
            Payload::Community(info) => {
                let url = &info.url;
                fill!(self, identity.account_age_days, days_since(info.created_at, now), url);
                let engagement = match (info.online_count, info.member_count) {
                    (Some(online), Some(members)) if members > 0 => {
                        Some(online as f64 / members as f64 * 100.0)
                    }
                    _ => None,
                };
                fill!(self, social.engagement_rate_pct, engagement, url);
            }
            Payload::Archive(history) => {
                fill!(self, identity.domain_age_days, days_since(history.earliest_snapshot, now), &history.url);
            }
            Payload::SiteCrawl(crawl) => {
                let url = &crawl.url;
                let has_links = !crawl.social_accounts.is_empty();
                fill!(self, identity.has_verification_links, Some(has_links), url);
                fill!(self, identity.links_consistent, has_links.then(|| crawl.links_consistent()), url);
                let anonymous = if crawl.claims_anonymous_team {
                    Some(true)
                } else if crawl.names_team {
                    Some(false)
                } else {
                    None
                };
                fill!(self, identity.team_anonymous, anonymous, url);
                fill!(self, identity.team_kyc, crawl.claims_kyc.then_some(true), url);
            }
        }
    }

    fn finish(mut self) -> ModuleInputs {
        self.inputs.identity = keep_if_supplied(self.identity);
        self.inputs.social = keep_if_supplied(self.social);
        self.inputs.wallet = keep_if_supplied(self.wallet);
        self.inputs.liquidity = keep_if_supplied(self.liquidity);
        self.inputs
    }
}

impl ModuleInputs {
    /// Translate a merged evidence set into scoring inputs
    pub fn from_evidence(set: &EvidenceSet, now: DateTime<Utc>) -> Self {
        let mut builder = InputBuilder::default();
        for entry in &set.entries {
            builder.absorb(&entry.payload, now);
        }
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator::SourcedPayload;
    use crate::models::types::SourceTier;
    use crate::providers::rdap::DomainRecord;
    use crate::providers::security::SecurityReport;
    use crate::providers::wayback::ArchiveHistory;
    use chrono::Duration;

    fn entry(adapter: &'static str, payload: Payload) -> SourcedPayload {
        SourcedPayload { adapter, tier: SourceTier::Api, payload }
    }

    #[test]
    fn test_empty_set_supplies_nothing() {
        let inputs = ModuleInputs::from_evidence(&EvidenceSet::default(), Utc::now());
        assert_eq!(inputs.supplied_fields(), 0);
        assert!(inputs.identity.is_none());
        assert!(inputs.liquidity.is_none());
    }

    #[test]
    fn test_first_writer_wins() {
        let now = Utc::now();
        let set = EvidenceSet {
            entries: vec![
                entry(
                    "domain-registration",
                    Payload::DomainRecord(DomainRecord {
                        domain: "larp.example".into(),
                        registered_at: Some(now - Duration::days(400)),
                        expires_at: None,
                        registrar: None,
                        privacy_redacted: false,
                        url: "https://rdap.org/domain/larp.example".into(),
                    }),
                ),
                entry(
                    "web-archive",
                    Payload::Archive(ArchiveHistory {
                        domain: "larp.example".into(),
                        earliest_snapshot: Some(now - Duration::days(10)),
                        snapshot_url: None,
                        url: "https://web.archive.org/web/*/larp.example".into(),
                    }),
                ),
            ],
            statuses: vec![],
        };

        let inputs = ModuleInputs::from_evidence(&set, now);
        let identity = inputs.identity.as_ref().unwrap();
        assert_eq!(identity.domain_age_days, Some(400));
        assert_eq!(
            inputs.source_url("identity.domain_age_days"),
            "https://rdap.org/domain/larp.example"
        );
        assert_eq!(inputs.supplied_fields(), 1);
    }

    #[test]
    fn test_security_report_feeds_liquidity_and_wallet() {
        let sec = SecurityReport {
            provider: "rugcheck".into(),
            chain: "solana".into(),
            mint_authority_active: Some(true),
            lp_locked_pct: Some(0.0),
            top10_holder_pct: Some(85.0),
            insider_networks: Some(2),
            url: "https://rugcheck.xyz/tokens/Mint111".into(),
            ..Default::default()
        };
        let set = EvidenceSet {
            entries: vec![entry("security-report", Payload::SecurityReport(sec))],
            statuses: vec![],
        };

        let inputs = ModuleInputs::from_evidence(&set, Utc::now());
        let liquidity = inputs.liquidity.as_ref().unwrap();
        assert_eq!(liquidity.mint_authority_active, Some(true));
        assert_eq!(liquidity.lp_locked_pct, Some(0.0));
        assert_eq!(inputs.wallet.as_ref().unwrap().suspicious_flow_count, Some(2));
        assert!(inputs.identity.is_none());
        assert_eq!(inputs.supplied_fields(), 4);
    }

    #[test]
    fn test_honeypot_and_authority_flags_reach_liquidity() {
        let sec = SecurityReport {
            provider: "goplus".into(),
            chain: "ethereum".into(),
            mint_authority_active: Some(false),
            freeze_authority_active: Some(true),
            is_honeypot: Some(true),
            creator_holding_pct: Some(42.0),
            url: "https://gopluslabs.io/token-security/1/0xabc".into(),
            ..Default::default()
        };
        let set = EvidenceSet {
            entries: vec![entry("security-report", Payload::SecurityReport(sec))],
            statuses: vec![],
        };

        let inputs = ModuleInputs::from_evidence(&set, Utc::now());
        let liquidity = inputs.liquidity.as_ref().unwrap();
        assert_eq!(liquidity.honeypot_detected, Some(true));
        assert_eq!(liquidity.freeze_authority_active, Some(true));
        assert_eq!(liquidity.creator_holding_pct, Some(42.0));
        assert_eq!(
            inputs.source_url("liquidity.honeypot_detected"),
            "https://gopluslabs.io/token-security/1/0xabc"
        );
        assert_eq!(inputs.supplied_fields(), 4);
    }
}
