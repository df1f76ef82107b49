//! Type definitions for LarpScore
//! All core data structures shared by the resolver, the pipeline and the API

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================
// Entities
// ============================================

/// What a free-form query was classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Ticker,
    ContractAddress,
    SocialHandle,
    Domain,
    NameServiceRecord,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Ticker,
        EntityKind::ContractAddress,
        EntityKind::SocialHandle,
        EntityKind::Domain,
        EntityKind::NameServiceRecord,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Ticker => "ticker",
            EntityKind::ContractAddress => "contract-address",
            EntityKind::SocialHandle => "social-handle",
            EntityKind::Domain => "domain",
            EntityKind::NameServiceRecord => "name-service-record",
        }
    }

    /// Prefix used in canonical ids (cache keys)
    pub fn canonical_prefix(&self) -> &'static str {
        match self {
            EntityKind::Ticker => "ticker",
            EntityKind::ContractAddress => "contract",
            EntityKind::SocialHandle => "social",
            EntityKind::Domain => "domain",
            EntityKind::NameServiceRecord => "ns",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger family a contract address belongs to.
///
/// `Evm` means "EVM-style, specific network not yet determined"; the
/// network actually used is reported by the adapter that disambiguated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Solana,
    Evm,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Solana => "solana",
            Chain::Evm => "evm",
        }
    }
}

/// Platform a social handle was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Twitter,
    Telegram,
    Discord,
    GitHub,
    Instagram,
    TikTok,
    YouTube,
}

impl SocialPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialPlatform::Twitter => "twitter",
            SocialPlatform::Telegram => "telegram",
            SocialPlatform::Discord => "discord",
            SocialPlatform::GitHub => "github",
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::TikTok => "tiktok",
            SocialPlatform::YouTube => "youtube",
        }
    }
}

/// Immutable result of resolving a query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedEntity {
    pub kind: EntityKind,
    /// As typed by the user (trimmed)
    pub raw_value: String,
    /// Canonicalized form used by adapters and cache keys
    pub normalized_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<Chain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<SocialPlatform>,
}

impl ResolvedEntity {
    pub fn new(kind: EntityKind, raw_value: impl Into<String>, normalized_value: impl Into<String>) -> Self {
        Self {
            kind,
            raw_value: raw_value.into(),
            normalized_value: normalized_value.into(),
            chain: None,
            platform: None,
        }
    }

    pub fn with_chain(mut self, chain: Chain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_platform(mut self, platform: SocialPlatform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Cache key for this entity, e.g. `ticker:PEPE`, `contract:solana:<mint>`
    /// or `social:github:<handle>`.
    ///
    /// Social handles carry their platform (`any` when unknown) because the
    /// platform decides which adapters run.
    pub fn canonical_id(&self) -> String {
        let prefix = self.kind.canonical_prefix();
        match (self.chain, self.kind) {
            (Some(chain), _) => format!("{}:{}:{}", prefix, chain.as_str(), self.normalized_value),
            (None, EntityKind::SocialHandle) => format!(
                "{}:{}:{}",
                prefix,
                self.platform.map_or("any", |p| p.as_str()),
                self.normalized_value
            ),
            (None, _) => format!("{}:{}", prefix, self.normalized_value),
        }
    }
}

// ============================================
// Evidence
// ============================================

/// Evidence severity, ranked for top-tag extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
    Good,
}

impl Severity {
    /// Weight used when ranking top tags (only critical and warning count)
    pub fn tag_weight(&self) -> u8 {
        match self {
            Severity::Critical => 3,
            Severity::Warning => 2,
            Severity::Info | Severity::Good => 0,
        }
    }

    /// Severity implied by the points a rule awarded
    pub fn from_points(points: u8) -> Self {
        match points {
            0 => Severity::Good,
            1..=9 => Severity::Info,
            10..=24 => Severity::Warning,
            _ => Severity::Critical,
        }
    }
}

/// Closed set of evidence categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvidenceType {
    AccountAge,
    DomainAge,
    VerificationLinks,
    LinkConsistency,
    AnonymousTeam,
    EngagementRate,
    BurstPosting,
    ShillClusterSize,
    FollowerGrowth,
    DeployerWalletAge,
    FreshWalletFunding,
    ExchangeDeposits,
    SuspiciousFlows,
    FlaggedAssociation,
    MintAuthority,
    FreezeAuthority,
    Honeypot,
    CreatorHoldings,
    LiquidityLockState,
    LiquidityLockDuration,
    LiquidityWithdrawal,
    HolderConcentration,
    LargestHolder,
    UnlockSchedule,
    LiquidityDepth,
    PoolChurn,
}

/// A single atomic observation. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Unique within a report
    pub id: String,
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    /// Empty when the fact is not externally verifiable
    #[serde(default)]
    pub source_url: String,
    /// Short label used for top tags
    pub label: String,
    pub summary: String,
}

// ============================================
// Scores & Reports
// ============================================

/// The four fixed risk dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskModule {
    Identity,
    SocialBehavior,
    WalletBehavior,
    Liquidity,
}

impl RiskModule {
    pub const ALL: [RiskModule; 4] = [
        RiskModule::Identity,
        RiskModule::SocialBehavior,
        RiskModule::WalletBehavior,
        RiskModule::Liquidity,
    ];

    /// Fixed weight; the four weights sum to 1.0
    pub fn weight(&self) -> f64 {
        match self {
            RiskModule::Identity => 0.25,
            RiskModule::SocialBehavior => 0.25,
            RiskModule::WalletBehavior => 0.25,
            RiskModule::Liquidity => 0.25,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskModule::Identity => "identity",
            RiskModule::SocialBehavior => "social-behavior",
            RiskModule::WalletBehavior => "wallet-behavior",
            RiskModule::Liquidity => "liquidity",
        }
    }
}

/// One risk dimension's contribution to a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleScore {
    pub name: RiskModule,
    /// 0-100
    pub score: u8,
    pub weight: f64,
    pub evidence: Vec<Evidence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Derived from the ratio of supplied optional fields
    pub fn from_completeness(supplied: usize, possible: usize) -> Self {
        if possible == 0 {
            return Confidence::Low;
        }
        let ratio = supplied as f64 / possible as f64;
        if ratio >= 0.7 {
            Confidence::High
        } else if ratio >= 0.4 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// Risk level classification, a pure function of the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            70..=u8::MAX => RiskLevel::Critical,
            50..=69 => RiskLevel::High,
            30..=49 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Low => "✅",
            RiskLevel::Medium => "🟡",
            RiskLevel::High => "🔴",
            RiskLevel::Critical => "💀",
        }
    }
}

/// Priority tier of an intelligence source.
/// Free authoritative APIs beat scraped pages, which beat inferred answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTier {
    Api,
    Scrape,
    Inferred,
}

/// Outcome of one adapter for one scan, kept for traceability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub adapter: String,
    pub tier: SourceTier,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub latency_ms: u64,
}

/// The externally visible LarpScore report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Composite score (0-100)
    pub score: u8,
    pub confidence: Confidence,
    pub risk_level: RiskLevel,
    /// Deduplicated, severity-ranked, at most 6
    pub top_tags: Vec<String>,
    /// Exactly the four module scores
    pub breakdown: Vec<ModuleScore>,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceStatus>,
}

impl Report {
    pub fn module(&self, module: RiskModule) -> Option<&ModuleScore> {
        self.breakdown.iter().find(|m| m.name == module)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} Score: {}/100 | Risk: {} | Confidence: {:?} | Tags: [{}]",
            self.risk_level.emoji(),
            self.score,
            self.risk_level.as_str(),
            self.confidence,
            self.top_tags.join(", ")
        )
    }
}

// ============================================
// Scan Jobs
// ============================================

/// Job lifecycle: queued → fetching → scoring → complete, or failed
/// from fetching/scoring. Never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Queued,
    Fetching,
    Scoring,
    Complete,
    Failed,
}

impl ScanStatus {
    fn rank(&self) -> u8 {
        match self {
            ScanStatus::Queued => 0,
            ScanStatus::Fetching => 1,
            ScanStatus::Scoring => 2,
            ScanStatus::Complete | ScanStatus::Failed => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Complete | ScanStatus::Failed)
    }

    /// Whether `next` is a legal forward step from `self`
    pub fn can_transition_to(&self, next: ScanStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            ScanStatus::Failed => matches!(self, ScanStatus::Fetching | ScanStatus::Scoring),
            _ => next.rank() > self.rank(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Queued => "queued",
            ScanStatus::Fetching => "fetching",
            ScanStatus::Scoring => "scoring",
            ScanStatus::Complete => "complete",
            ScanStatus::Failed => "failed",
        }
    }
}

/// Orchestration record for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: String,
    pub entity: ResolvedEntity,
    pub status: ScanStatus,
    pub progress_percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Served from a fresh cache entry; no adapter was invoked
    pub cached: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScanJob {
    pub fn new(id: impl Into<String>, entity: ResolvedEntity) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            entity,
            status: ScanStatus::Queued,
            progress_percent: 0,
            result: None,
            error: None,
            cached: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A report stored for a canonical entity id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedReport {
    pub canonical_id: String,
    pub report: Report,
    pub cached_at: DateTime<Utc>,
}

impl CachedReport {
    pub fn new(canonical_id: impl Into<String>, report: Report) -> Self {
        Self {
            canonical_id: canonical_id.into(),
            report,
            cached_at: Utc::now(),
        }
    }

    /// Fresh if `now - cached_at < ttl`
    pub fn is_fresh(&self, ttl: std::time::Duration, now: DateTime<Utc>) -> bool {
        match Duration::from_std(ttl) {
            Ok(ttl) => now.signed_duration_since(self.cached_at) < ttl,
            // TTL too large to represent: never stale
            Err(_) => true,
        }
    }

    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.cached_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_id_includes_chain_for_contracts() {
        let entity = ResolvedEntity::new(EntityKind::ContractAddress, "0xAbC", "0xabc")
            .with_chain(Chain::Evm);
        assert_eq!(entity.canonical_id(), "contract:evm:0xabc");

        let ticker = ResolvedEntity::new(EntityKind::Ticker, "$pepe", "PEPE");
        assert_eq!(ticker.canonical_id(), "ticker:PEPE");
    }

    #[test]
    fn test_canonical_id_includes_platform_for_social_handles() {
        let github = ResolvedEntity::new(EntityKind::SocialHandle, "github.com/abcd", "abcd")
            .with_platform(SocialPlatform::GitHub);
        let discord = ResolvedEntity::new(EntityKind::SocialHandle, "discord.gg/abcd", "abcd")
            .with_platform(SocialPlatform::Discord);
        let bare = ResolvedEntity::new(EntityKind::SocialHandle, "@abcd", "abcd");

        assert_eq!(github.canonical_id(), "social:github:abcd");
        assert_eq!(discord.canonical_id(), "social:discord:abcd");
        assert_eq!(bare.canonical_id(), "social:any:abcd");
    }

    #[test]
    fn test_status_transitions_are_forward_only() {
        assert!(ScanStatus::Queued.can_transition_to(ScanStatus::Fetching));
        assert!(ScanStatus::Fetching.can_transition_to(ScanStatus::Scoring));
        assert!(ScanStatus::Scoring.can_transition_to(ScanStatus::Complete));
        assert!(ScanStatus::Fetching.can_transition_to(ScanStatus::Failed));
        assert!(ScanStatus::Scoring.can_transition_to(ScanStatus::Failed));

        assert!(!ScanStatus::Queued.can_transition_to(ScanStatus::Failed));
        assert!(!ScanStatus::Fetching.can_transition_to(ScanStatus::Queued));
        assert!(!ScanStatus::Complete.can_transition_to(ScanStatus::Failed));
        assert!(!ScanStatus::Failed.can_transition_to(ScanStatus::Complete));
    }

    #[test]
    fn test_severity_from_points() {
        assert_eq!(Severity::from_points(0), Severity::Good);
        assert_eq!(Severity::from_points(8), Severity::Info);
        assert_eq!(Severity::from_points(10), Severity::Warning);
        assert_eq!(Severity::from_points(25), Severity::Critical);
    }

    #[test]
    fn test_cached_report_freshness() {
        let report = Report {
            score: 0,
            confidence: Confidence::Low,
            risk_level: RiskLevel::Low,
            top_tags: vec![],
            breakdown: vec![],
            last_updated: Utc::now(),
            sources: vec![],
        };
        let cached = CachedReport::new("ticker:PEPE", report);
        let ttl = std::time::Duration::from_secs(300);

        assert!(cached.is_fresh(ttl, cached.cached_at));
        assert!(cached.is_fresh(ttl, cached.cached_at + Duration::seconds(299)));
        assert!(!cached.is_fresh(ttl, cached.cached_at + Duration::seconds(300)));
    }
}
