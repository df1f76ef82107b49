//! Scoring Engine
//!
//! Four fixed modules, each a pure function over its optional input record:
//! threshold tiers award points, points add up within a module and are
//! clamped to 100. Every rule that fires leaves an [`Evidence`] entry;
//! favourable facts are recorded as `good` with zero points.
//!
//! Composite = round(Σ weight × module score), clamped to [0, 100].
//! Confidence comes only from how many of the 27 optional fields were
//! supplied, never from the score itself.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::config::{IdentityTiers, LiquidityTiers, ScoringConfig, SocialTiers, WalletTiers};
use crate::models::errors::{AppError, AppResult};
use crate::models::inputs::{IdentityInput, LiquidityInput, ModuleInputs, SocialInput, WalletInput};
use crate::models::types::{
    Confidence, Evidence, EvidenceType, ModuleScore, Report, RiskLevel, RiskModule, Severity,
};
use crate::utils::constants::MAX_TOP_TAGS;

/// Stateless scorer over a fixed set of point tables
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, inputs: &ModuleInputs) -> AppResult<Report> {
        self.score_at(inputs, Utc::now())
    }

    /// Score with an explicit evidence timestamp
    pub fn score_at(&self, inputs: &ModuleInputs, now: DateTime<Utc>) -> AppResult<Report> {
        reject_non_finite(inputs)?;

        let breakdown = vec![
            score_identity(inputs, &self.config.identity, now),
            score_social(inputs, &self.config.social, now),
            score_wallet(inputs, &self.config.wallet, now),
            score_liquidity(inputs, &self.config.liquidity, now),
        ];

        let score = composite(&breakdown);
        let confidence =
            Confidence::from_completeness(inputs.supplied_fields(), ModuleInputs::MAX_FIELDS);

        debug!(
            "🧮 Scored: {} ({} of {} fields, confidence {:?})",
            score,
            inputs.supplied_fields(),
            ModuleInputs::MAX_FIELDS,
            confidence
        );

        Ok(Report {
            score,
            confidence,
            risk_level: RiskLevel::from_score(score),
            top_tags: top_tags(&breakdown),
            breakdown,
            last_updated: now,
            sources: Vec::new(),
        })
    }
}

/// round(Σ weight × score), clamped to [0, 100]
pub fn composite(breakdown: &[ModuleScore]) -> u8 {
    let weighted: f64 = breakdown
        .iter()
        .map(|m| f64::from(m.score) * m.weight)
        .sum();
    weighted.round().clamp(0.0, 100.0) as u8
}

/// Critical and warning labels, heaviest first, deduplicated, capped
pub fn top_tags(breakdown: &[ModuleScore]) -> Vec<String> {
    let mut tagged: Vec<(u8, &str)> = breakdown
        .iter()
        .flat_map(|m| m.evidence.iter())
        .filter(|e| e.severity.tag_weight() > 0)
        .map(|e| (e.severity.tag_weight(), e.label.as_str()))
        .collect();
    // Stable: equal weights keep module order
    tagged.sort_by(|a, b| b.0.cmp(&a.0));

    let mut tags: Vec<String> = Vec::new();
    for (_, label) in tagged {
        if !tags.iter().any(|t| t == label) {
            tags.push(label.to_string());
        }
        if tags.len() == MAX_TOP_TAGS {
            break;
        }
    }
    tags
}

fn reject_non_finite(inputs: &ModuleInputs) -> AppResult<()> {
    let mut values: Vec<(&str, Option<f64>)> = Vec::new();
    if let Some(s) = &inputs.social {
        values.push(("social.engagement_rate_pct", s.engagement_rate_pct));
        values.push(("social.follower_growth_pct_per_day", s.follower_growth_pct_per_day));
    }
    if let Some(l) = &inputs.liquidity {
        values.push(("liquidity.creator_holding_pct", l.creator_holding_pct));
        values.push(("liquidity.lp_locked_pct", l.lp_locked_pct));
        values.push(("liquidity.recent_lp_withdrawal_pct", l.recent_lp_withdrawal_pct));
        values.push(("liquidity.top10_holder_pct", l.top10_holder_pct));
        values.push(("liquidity.largest_holder_pct", l.largest_holder_pct));
        values.push(("liquidity.unlock_30d_pct", l.unlock_30d_pct));
        values.push(("liquidity.liquidity_usd", l.liquidity_usd));
    }

    match values
        .into_iter()
        .find(|(_, v)| v.is_some_and(|v| !v.is_finite()))
    {
        Some((field, _)) => Err(AppError::invalid_input(format!(
            "{} is not a finite number",
            field
        ))),
        None => Ok(()),
    }
}

// ============================================
// Module accumulator
// ============================================

struct ModuleScorer<'a> {
    module: RiskModule,
    prefix: &'static str,
    inputs: &'a ModuleInputs,
    now: DateTime<Utc>,
    points: u32,
    evidence: Vec<Evidence>,
}

impl<'a> ModuleScorer<'a> {
    fn new(module: RiskModule, prefix: &'static str, inputs: &'a ModuleInputs, now: DateTime<Utc>) -> Self {
        Self {
            module,
            prefix,
            inputs,
            now,
            points: 0,
            evidence: Vec::new(),
        }
    }

    /// Record a rule outcome. Zero points is a favourable observation.
    fn record(
        &mut self,
        field: &str,
        evidence_type: EvidenceType,
        points: u8,
        label: &str,
        summary: String,
    ) {
        self.points += u32::from(points);
        self.evidence.push(Evidence {
            id: format!("{}-{}", self.module.as_str(), self.evidence.len() + 1),
            evidence_type,
            severity: Severity::from_points(points),
            timestamp: self.now,
            source_url: self.inputs.source_url(&format!("{}.{}", self.prefix, field)),
            label: label.to_string(),
            summary,
        });
    }

    /// Risk label when the rule awarded points, reassuring label otherwise
    fn tiered(
        &mut self,
        field: &str,
        evidence_type: EvidenceType,
        points: u8,
        labels: (&str, &str),
        summary: String,
    ) {
        let label = if points > 0 { labels.0 } else { labels.1 };
        self.record(field, evidence_type, points, label, summary);
    }

    fn finish(self) -> ModuleScore {
        ModuleScore {
            name: self.module,
            score: self.points.min(100) as u8,
            weight: self.module.weight(),
            evidence: self.evidence,
        }
    }
}

// ============================================
// Identity / team
// ============================================

fn score_identity(inputs: &ModuleInputs, t: &IdentityTiers, now: DateTime<Utc>) -> ModuleScore {
    let mut m = ModuleScorer::new(RiskModule::Identity, "identity", inputs, now);
    let Some(input) = &inputs.identity else {
        return m.finish();
    };
    let IdentityInput {
        account_age_days,
        domain_age_days,
        has_verification_links,
        links_consistent,
        team_anonymous,
        team_kyc,
    } = input;

    if let Some(days) = *account_age_days {
        m.tiered(
            "account_age_days",
            EvidenceType::AccountAge,
            t.account_age_days.points(f64::from(days)),
            ("New account", "Established account"),
            format!("Account created {} days ago", days),
        );
    }

    if let Some(days) = *domain_age_days {
        m.tiered(
            "domain_age_days",
            EvidenceType::DomainAge,
            t.domain_age_days.points(f64::from(days)),
            ("New domain", "Established domain"),
            format!("Domain registered {} days ago", days),
        );
    }

    match *has_verification_links {
        Some(false) => m.record(
            "has_verification_links",
            EvidenceType::VerificationLinks,
            t.missing_links_points,
            "No verification links",
            "No official website or social links to cross-check".to_string(),
        ),
        Some(true) => m.record(
            "has_verification_links",
            EvidenceType::VerificationLinks,
            0,
            "Verification links present",
            "Official links are published".to_string(),
        ),
        None => {}
    }

    match *links_consistent {
        Some(false) => m.record(
            "links_consistent",
            EvidenceType::LinkConsistency,
            t.inconsistent_links_points,
            "Inconsistent links",
            "Published links point to different accounts".to_string(),
        ),
        Some(true) => m.record(
            "links_consistent",
            EvidenceType::LinkConsistency,
            0,
            "Consistent links",
            "Published links agree with each other".to_string(),
        ),
        None => {}
    }

    match (*team_anonymous, *team_kyc) {
        (Some(true), Some(true)) => m.record(
            "team_anonymous",
            EvidenceType::AnonymousTeam,
            t.anonymous_kyc_points,
            "Anonymous team (KYC)",
            "Team is anonymous but has passed KYC".to_string(),
        ),
        (Some(true), _) => m.record(
            "team_anonymous",
            EvidenceType::AnonymousTeam,
            t.anonymous_team_points,
            "Anonymous team",
            "Team is anonymous with no KYC".to_string(),
        ),
        (Some(false), _) | (None, Some(true)) => m.record(
            "team_anonymous",
            EvidenceType::AnonymousTeam,
            0,
            "Public team",
            "Team members are publicly identified".to_string(),
        ),
        _ => {}
    }

    m.finish()
}

// ============================================
// Social / narrative manipulation
// ============================================

fn score_social(inputs: &ModuleInputs, t: &SocialTiers, now: DateTime<Utc>) -> ModuleScore {
    let mut m = ModuleScorer::new(RiskModule::SocialBehavior, "social", inputs, now);
    let Some(input) = &inputs.social else {
        return m.finish();
    };
    let SocialInput {
        engagement_rate_pct,
        burst_posting_detected,
        amplifier_cluster_size,
        follower_growth_pct_per_day,
    } = input;

    if let Some(rate) = *engagement_rate_pct {
        let low = t.engagement_low_pct.points(rate);
        let high = t.engagement_high_pct.points(rate);
        let label = if low > 0 {
            "Low engagement"
        } else if high > 0 {
            "Engagement farming"
        } else {
            "Organic engagement"
        };
        m.record(
            "engagement_rate_pct",
            EvidenceType::EngagementRate,
            low.max(high),
            label,
            format!("Engagement rate {:.2}%", rate),
        );
    }

    match *burst_posting_detected {
        Some(true) => m.record(
            "burst_posting_detected",
            EvidenceType::BurstPosting,
            t.burst_posting_points,
            "Burst posting",
            "Posts arrive in coordinated bursts".to_string(),
        ),
        Some(false) => m.record(
            "burst_posting_detected",
            EvidenceType::BurstPosting,
            0,
            "Steady posting",
            "No burst posting pattern".to_string(),
        ),
        None => {}
    }

    if let Some(size) = *amplifier_cluster_size {
        m.tiered(
            "amplifier_cluster_size",
            EvidenceType::ShillClusterSize,
            t.amplifier_cluster_size.points(f64::from(size)),
            ("Shill cluster", "No shill cluster"),
            format!("{} coordinated amplifier accounts", size),
        );
    }

    if let Some(growth) = *follower_growth_pct_per_day {
        m.tiered(
            "follower_growth_pct_per_day",
            EvidenceType::FollowerGrowth,
            t.follower_growth_pct_per_day.points(growth),
            ("Follower spike", "Normal follower growth"),
            format!("Followers growing {:.1}% per day", growth),
        );
    }

    m.finish()
}

// ============================================
// Wallet behaviour
// ============================================

fn score_wallet(inputs: &ModuleInputs, t: &WalletTiers, now: DateTime<Utc>) -> ModuleScore {
    let mut m = ModuleScorer::new(RiskModule::WalletBehavior, "wallet", inputs, now);
    let Some(input) = &inputs.wallet else {
        return m.finish();
    };
    let WalletInput {
        deployer_age_days,
        funded_by_fresh_wallet,
        team_exchange_deposits,
        suspicious_flow_count,
        flagged_associations,
    } = input;

    if let Some(days) = *deployer_age_days {
        m.tiered(
            "deployer_age_days",
            EvidenceType::DeployerWalletAge,
            t.deployer_age_days.points(f64::from(days)),
            ("Fresh deployer wallet", "Aged deployer wallet"),
            format!("Deployer wallet is {} days old", days),
        );
    }

    match *funded_by_fresh_wallet {
        Some(true) => m.record(
            "funded_by_fresh_wallet",
            EvidenceType::FreshWalletFunding,
            t.fresh_funding_points,
            "Funded by fresh wallet",
            "Deployer was funded from a newly created wallet".to_string(),
        ),
        Some(false) => m.record(
            "funded_by_fresh_wallet",
            EvidenceType::FreshWalletFunding,
            0,
            "Established funding source",
            "Deployer funding comes from an established wallet".to_string(),
        ),
        None => {}
    }

    if let Some(count) = *team_exchange_deposits {
        m.tiered(
            "team_exchange_deposits",
            EvidenceType::ExchangeDeposits,
            t.team_exchange_deposits.points(f64::from(count)),
            ("Team exchange deposits", "No team exchange deposits"),
            format!("{} exchange deposits from team wallets", count),
        );
    }

    if let Some(count) = *suspicious_flow_count {
        m.tiered(
            "suspicious_flow_count",
            EvidenceType::SuspiciousFlows,
            t.suspicious_flow_count.points(f64::from(count)),
            ("Suspicious wallet flows", "Clean wallet flows"),
            format!("{} suspicious transaction-flow patterns", count),
        );
    }

    if let Some(count) = *flagged_associations {
        m.tiered(
            "flagged_associations",
            EvidenceType::FlaggedAssociation,
            t.flagged_associations.points(f64::from(count)),
            ("Linked to flagged wallets", "No flagged links"),
            format!("{} associations with previously flagged wallets", count),
        );
    }

    m.finish()
}

// ============================================
// Liquidity / token
// ============================================

fn score_liquidity(inputs: &ModuleInputs, t: &LiquidityTiers, now: DateTime<Utc>) -> ModuleScore {
    let mut m = ModuleScorer::new(RiskModule::Liquidity, "liquidity", inputs, now);
    let Some(input) = &inputs.liquidity else {
        return m.finish();
    };
    let LiquidityInput {
        mint_authority_active,
        freeze_authority_active,
        honeypot_detected,
        creator_holding_pct,
        lp_locked_pct,
        lp_lock_days_remaining,
        recent_lp_withdrawal_pct,
        top10_holder_pct,
        largest_holder_pct,
        unlock_30d_pct,
        liquidity_usd,
        pool_changes_24h,
    } = input;

    match *mint_authority_active {
        Some(true) => m.record(
            "mint_authority_active",
            EvidenceType::MintAuthority,
            t.mint_authority_points,
            "Mint authority active",
            "Supply can still be minted".to_string(),
        ),
        Some(false) => m.record(
            "mint_authority_active",
            EvidenceType::MintAuthority,
            0,
            "Mint authority revoked",
            "Supply is fixed".to_string(),
        ),
        None => {}
    }

    match *freeze_authority_active {
        Some(true) => m.record(
            "freeze_authority_active",
            EvidenceType::FreezeAuthority,
            t.freeze_authority_points,
            "Freeze authority active",
            "Holder accounts can be frozen".to_string(),
        ),
        Some(false) => m.record(
            "freeze_authority_active",
            EvidenceType::FreezeAuthority,
            0,
            "Freeze authority revoked",
            "Holder accounts cannot be frozen".to_string(),
        ),
        None => {}
    }

    match *honeypot_detected {
        Some(true) => m.record(
            "honeypot_detected",
            EvidenceType::Honeypot,
            t.honeypot_points,
            "Honeypot",
            "Holders cannot sell".to_string(),
        ),
        Some(false) => m.record(
            "honeypot_detected",
            EvidenceType::Honeypot,
            0,
            "Sellable",
            "No sell restriction detected".to_string(),
        ),
        None => {}
    }

    if let Some(pct) = *creator_holding_pct {
        m.tiered(
            "creator_holding_pct",
            EvidenceType::CreatorHoldings,
            t.creator_holding_pct.points(pct),
            ("Creator holds supply", "Creator holdings small"),
            format!("Creator holds {:.1}% of supply", pct),
        );
    }

    let unlocked = lp_locked_pct.is_some_and(|pct| pct < 1.0);
    if let Some(pct) = *lp_locked_pct {
        let points = t.lp_locked_pct.points(pct);
        let label = match (unlocked, points) {
            (true, _) => "LP not locked",
            (false, 0) => "LP locked",
            (false, _) => "LP partially locked",
        };
        m.record(
            "lp_locked_pct",
            EvidenceType::LiquidityLockState,
            points,
            label,
            format!("{:.1}% of liquidity is locked", pct),
        );
    }

    if let Some(days) = *lp_lock_days_remaining {
        if !unlocked {
            m.tiered(
                "lp_lock_days_remaining",
                EvidenceType::LiquidityLockDuration,
                t.lp_lock_days_remaining.points(f64::from(days)),
                ("Short LP lock", "Long LP lock"),
                format!("Liquidity lock expires in {} days", days),
            );
        }
    }

    if let Some(pct) = *recent_lp_withdrawal_pct {
        m.tiered(
            "recent_lp_withdrawal_pct",
            EvidenceType::LiquidityWithdrawal,
            t.recent_lp_withdrawal_pct.points(pct),
            ("LP pulled", "No LP withdrawal"),
            format!("{:.1}% of liquidity withdrawn recently", pct),
        );
    }

    if let Some(pct) = *top10_holder_pct {
        m.tiered(
            "top10_holder_pct",
            EvidenceType::HolderConcentration,
            t.top10_holder_pct.points(pct),
            ("Holder concentration", "Distributed holders"),
            format!("Top 10 holders own {:.1}% of supply", pct),
        );
    }

    if let Some(pct) = *largest_holder_pct {
        m.tiered(
            "largest_holder_pct",
            EvidenceType::LargestHolder,
            t.largest_holder_pct.points(pct),
            ("Whale holder", "No dominant holder"),
            format!("Largest holder owns {:.1}% of supply", pct),
        );
    }

    if let Some(pct) = *unlock_30d_pct {
        m.tiered(
            "unlock_30d_pct",
            EvidenceType::UnlockSchedule,
            t.unlock_30d_pct.points(pct),
            ("Upcoming unlock", "No near-term unlock"),
            format!("{:.1}% of supply unlocks within 30 days", pct),
        );
    }

    if let Some(usd) = *liquidity_usd {
        m.tiered(
            "liquidity_usd",
            EvidenceType::LiquidityDepth,
            t.liquidity_usd.points(usd),
            ("Thin liquidity", "Deep liquidity"),
            format!("${:.0} of pooled liquidity", usd),
        );
    }

    if let Some(changes) = *pool_changes_24h {
        m.tiered(
            "pool_changes_24h",
            EvidenceType::PoolChurn,
            t.pool_changes_24h.points(f64::from(changes)),
            ("Pool churn", "Stable pools"),
            format!("{} pool changes in the last 24h", changes),
        );
    }

    m.finish()
}
