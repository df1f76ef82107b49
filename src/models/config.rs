//! Configuration module for LarpScore
//!
//! Every tunable lives here: timeouts, cache TTLs and the scoring tier
//! tables. Defaults come from `utils/constants.rs` and are overridable via
//! environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::EntityKind;
use crate::utils::constants::{
    DEFAULT_ADAPTER_TIMEOUT_MS, DEFAULT_HOST, DEFAULT_JOB_RETENTION_SECS, DEFAULT_PORT,
    TTL_CONTRACT_SECS, TTL_DOMAIN_SECS, TTL_NAME_SERVICE_SECS, TTL_SOCIAL_SECS, TTL_TICKER_SECS,
};

/// Read a numeric env var, ignoring (and logging) unparsable values
fn env_u64(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("⚠️ Ignoring {}={:?}: not a number", key, raw);
            None
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// `1`, `true`, `yes` or `on` (any case) count as set
pub(crate) fn env_flag(key: &str) -> bool {
    env_nonempty(key).is_some_and(|v| {
        matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
    })
}

// ============================================
// Server
// ============================================

/// HTTP server bind configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        // Hosting platforms set PORT; LARP_PORT is for local dev
        let port = std::env::var("PORT")
            .or_else(|_| std::env::var("LARP_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            host: std::env::var("LARP_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port,
        }
    }
}

// ============================================
// Cache TTLs
// ============================================

/// Freshness window per entity kind
#[derive(Debug, Clone, PartialEq)]
pub struct CacheTtl {
    pub ticker: Duration,
    pub contract_address: Duration,
    pub social_handle: Duration,
    pub domain: Duration,
    pub name_service_record: Duration,
}

impl CacheTtl {
    /// Same TTL for every kind
    pub fn uniform(ttl: Duration) -> Self {
        Self {
            ticker: ttl,
            contract_address: ttl,
            social_handle: ttl,
            domain: ttl,
            name_service_record: ttl,
        }
    }

    pub fn for_kind(&self, kind: EntityKind) -> Duration {
        match kind {
            EntityKind::Ticker => self.ticker,
            EntityKind::ContractAddress => self.contract_address,
            EntityKind::SocialHandle => self.social_handle,
            EntityKind::Domain => self.domain,
            EntityKind::NameServiceRecord => self.name_service_record,
        }
    }

    /// Longest configured TTL, used when pruning entries of unknown kind
    pub fn max(&self) -> Duration {
        [
            self.ticker,
            self.contract_address,
            self.social_handle,
            self.domain,
            self.name_service_record,
        ]
        .into_iter()
        .max()
        .unwrap_or_default()
    }
}

impl Default for CacheTtl {
    fn default() -> Self {
        if let Some(secs) = env_u64("LARP_CACHE_TTL_SECS") {
            return Self::uniform(Duration::from_secs(secs));
        }

        Self {
            ticker: Duration::from_secs(TTL_TICKER_SECS),
            contract_address: Duration::from_secs(TTL_CONTRACT_SECS),
            social_handle: Duration::from_secs(TTL_SOCIAL_SECS),
            domain: Duration::from_secs(TTL_DOMAIN_SECS),
            name_service_record: Duration::from_secs(TTL_NAME_SERVICE_SECS),
        }
    }
}

// ============================================
// Scan pipeline
// ============================================

/// Configuration for the scan pipeline
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Upper bound on each adapter call, independent of the others
    pub adapter_timeout: Duration,
    pub cache_ttl: CacheTtl,
    /// Directory for the on-disk report store; memory-only when unset
    pub cache_dir: Option<PathBuf>,
    /// How long finished jobs stay queryable
    pub job_retention: Duration,
    /// Optional token for the code-hosting adapter
    pub github_token: Option<String>,
    pub scoring: ScoringConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let github_token = env_nonempty("GITHUB_TOKEN");
        if github_token.is_some() {
            info!("🔑 GITHUB_TOKEN configured (token hidden)");
        }

        Self {
            adapter_timeout: Duration::from_millis(
                env_u64("LARP_ADAPTER_TIMEOUT_MS").unwrap_or(DEFAULT_ADAPTER_TIMEOUT_MS),
            ),
            cache_ttl: CacheTtl::default(),
            cache_dir: env_nonempty("LARP_CACHE_DIR").map(PathBuf::from),
            job_retention: Duration::from_secs(
                env_u64("LARP_JOB_RETENTION_SECS").unwrap_or(DEFAULT_JOB_RETENTION_SECS),
            ),
            github_token,
            scoring: ScoringConfig::from_env(),
        }
    }
}

// ============================================
// Scoring tiers
// ============================================

/// How a band's bound is compared against a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandKind {
    /// Matches when `value < bound` (ages, depths); bounds ascending
    Below,
    /// Matches when `value >= bound` (counts, percentages); bounds descending
    AtLeast,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub bound: f64,
    pub points: u8,
}

/// Ordered threshold tiers; the first matching band wins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    pub kind: BandKind,
    pub bands: Vec<Band>,
}

impl Bands {
    pub fn below(bands: &[(f64, u8)]) -> Self {
        Self::from_pairs(BandKind::Below, bands)
    }

    pub fn at_least(bands: &[(f64, u8)]) -> Self {
        Self::from_pairs(BandKind::AtLeast, bands)
    }

    fn from_pairs(kind: BandKind, bands: &[(f64, u8)]) -> Self {
        Self {
            kind,
            bands: bands
                .iter()
                .map(|&(bound, points)| Band { bound, points })
                .collect(),
        }
    }

    /// Points awarded for `value`, 0 when no band matches
    pub fn points(&self, value: f64) -> u8 {
        self.bands
            .iter()
            .find(|band| match self.kind {
                BandKind::Below => value < band.bound,
                BandKind::AtLeast => value >= band.bound,
            })
            .map_or(0, |band| band.points)
    }

    /// Bands must be ordered so that the first match is the most severe
    fn validate(&self, name: &str) -> AppResult<()> {
        let ordered = self.bands.windows(2).all(|w| match self.kind {
            BandKind::Below => w[0].bound < w[1].bound,
            BandKind::AtLeast => w[0].bound > w[1].bound,
        });
        let finite = self.bands.iter().all(|b| b.bound.is_finite());

        if ordered && finite {
            Ok(())
        } else {
            Err(AppError::new(
                ErrorCode::ConfigInvalidValue,
                format!("Scoring bands '{}' are not strictly ordered", name),
            ))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityTiers {
    pub account_age_days: Bands,
    pub domain_age_days: Bands,
    pub missing_links_points: u8,
    pub inconsistent_links_points: u8,
    pub anonymous_team_points: u8,
    /// Anonymous team that did pass KYC
    pub anonymous_kyc_points: u8,
}

impl Default for IdentityTiers {
    fn default() -> Self {
        Self {
            account_age_days: Bands::below(&[(30.0, 30), (90.0, 20), (180.0, 10)]),
            domain_age_days: Bands::below(&[(30.0, 25), (90.0, 15), (180.0, 8)]),
            missing_links_points: 15,
            inconsistent_links_points: 20,
            anonymous_team_points: 25,
            anonymous_kyc_points: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialTiers {
    /// Suspiciously low engagement (bought followers)
    pub engagement_low_pct: Bands,
    /// Suspiciously high engagement (engagement farming)
    pub engagement_high_pct: Bands,
    pub burst_posting_points: u8,
    pub amplifier_cluster_size: Bands,
    pub follower_growth_pct_per_day: Bands,
}

impl Default for SocialTiers {
    fn default() -> Self {
        Self {
            engagement_low_pct: Bands::below(&[(0.5, 20), (1.0, 8)]),
            engagement_high_pct: Bands::at_least(&[(15.0, 25), (10.0, 10)]),
            burst_posting_points: 20,
            amplifier_cluster_size: Bands::at_least(&[(20.0, 35), (10.0, 25), (5.0, 15), (3.0, 8)]),
            follower_growth_pct_per_day: Bands::at_least(&[(50.0, 25), (20.0, 15), (10.0, 8)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletTiers {
    pub deployer_age_days: Bands,
    pub fresh_funding_points: u8,
    pub team_exchange_deposits: Bands,
    pub suspicious_flow_count: Bands,
    pub flagged_associations: Bands,
}

impl Default for WalletTiers {
    fn default() -> Self {
        Self {
            deployer_age_days: Bands::below(&[(30.0, 25), (90.0, 15), (180.0, 8)]),
            fresh_funding_points: 20,
            team_exchange_deposits: Bands::at_least(&[(3.0, 25), (1.0, 15)]),
            suspicious_flow_count: Bands::at_least(&[(5.0, 25), (2.0, 15), (1.0, 8)]),
            flagged_associations: Bands::at_least(&[(3.0, 40), (1.0, 30)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidityTiers {
    pub mint_authority_points: u8,
    pub freeze_authority_points: u8,
    pub honeypot_points: u8,
    pub creator_holding_pct: Bands,
    /// First band is "not locked at all"
    pub lp_locked_pct: Bands,
    /// Applied only when some liquidity is locked
    pub lp_lock_days_remaining: Bands,
    pub recent_lp_withdrawal_pct: Bands,
    pub top10_holder_pct: Bands,
    pub largest_holder_pct: Bands,
    pub unlock_30d_pct: Bands,
    pub liquidity_usd: Bands,
    pub pool_changes_24h: Bands,
}

impl Default for LiquidityTiers {
    fn default() -> Self {
        Self {
            mint_authority_points: 20,
            freeze_authority_points: 15,
            honeypot_points: 50,
            creator_holding_pct: Bands::at_least(&[(20.0, 20), (5.0, 8)]),
            lp_locked_pct: Bands::below(&[(1.0, 30), (50.0, 20), (90.0, 8)]),
            lp_lock_days_remaining: Bands::below(&[(30.0, 15), (90.0, 8)]),
            recent_lp_withdrawal_pct: Bands::at_least(&[(50.0, 30), (20.0, 20), (5.0, 10)]),
            top10_holder_pct: Bands::at_least(&[(80.0, 20), (50.0, 12), (30.0, 5)]),
            largest_holder_pct: Bands::at_least(&[(20.0, 15), (10.0, 8)]),
            unlock_30d_pct: Bands::at_least(&[(20.0, 15), (5.0, 8)]),
            liquidity_usd: Bands::below(&[(10_000.0, 15), (50_000.0, 8)]),
            pool_changes_24h: Bands::at_least(&[(10.0, 15), (5.0, 8)]),
        }
    }
}

/// Point tables for all four risk modules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub identity: IdentityTiers,
    pub social: SocialTiers,
    pub wallet: WalletTiers,
    pub liquidity: LiquidityTiers,
}

impl ScoringConfig {
    /// Load overrides from the JSON file named by `LARP_SCORING_CONFIG`,
    /// falling back to defaults if unset or invalid
    pub fn from_env() -> Self {
        let Some(path) = env_nonempty("LARP_SCORING_CONFIG") else {
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                info!("📐 Scoring tiers loaded from {}", path);
                config
            }
            Err(e) => {
                warn!("⚠️ {} - using default scoring tiers", e);
                Self::default()
            }
        }
    }

    pub fn load(path: &str) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::with_source(
                ErrorCode::ConfigInvalidValue,
                format!("Cannot read scoring config {}", path),
                e,
            )
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            AppError::with_source(
                ErrorCode::ConfigInvalidValue,
                format!("Invalid scoring config {}", path),
                e,
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        let i = &self.identity;
        let s = &self.social;
        let w = &self.wallet;
        let l = &self.liquidity;
        let all = [
            ("identity.account_age_days", &i.account_age_days),
            ("identity.domain_age_days", &i.domain_age_days),
            ("social.engagement_low_pct", &s.engagement_low_pct),
            ("social.engagement_high_pct", &s.engagement_high_pct),
            ("social.amplifier_cluster_size", &s.amplifier_cluster_size),
            ("social.follower_growth_pct_per_day", &s.follower_growth_pct_per_day),
            ("wallet.deployer_age_days", &w.deployer_age_days),
            ("wallet.team_exchange_deposits", &w.team_exchange_deposits),
            ("wallet.suspicious_flow_count", &w.suspicious_flow_count),
            ("wallet.flagged_associations", &w.flagged_associations),
            ("liquidity.creator_holding_pct", &l.creator_holding_pct),
            ("liquidity.lp_locked_pct", &l.lp_locked_pct),
            ("liquidity.lp_lock_days_remaining", &l.lp_lock_days_remaining),
            ("liquidity.recent_lp_withdrawal_pct", &l.recent_lp_withdrawal_pct),
            ("liquidity.top10_holder_pct", &l.top10_holder_pct),
            ("liquidity.largest_holder_pct", &l.largest_holder_pct),
            ("liquidity.unlock_30d_pct", &l.unlock_30d_pct),
            ("liquidity.liquidity_usd", &l.liquidity_usd),
            ("liquidity.pool_changes_24h", &l.pool_changes_24h),
        ];
        for (name, bands) in all {
            bands.validate(name)?;
        }
        Ok(())
    }
}
