//! Constants Module - Single Source of Truth
//!
//! Every constant, conversion helper and source endpoint used across the
//! application is defined here. No hardcoded values in other modules.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "LarpScore";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outbound HTTP requests
pub const USER_AGENT: &str = concat!("LarpScore/", env!("CARGO_PKG_VERSION"));

// ============================================
// SERVER & PIPELINE DEFAULTS
// ============================================

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Per-adapter timeout (milliseconds)
pub const DEFAULT_ADAPTER_TIMEOUT_MS: u64 = 8_000;

/// Finished jobs stay queryable for an hour
pub const DEFAULT_JOB_RETENTION_SECS: u64 = 3_600;

/// Maintenance sweep interval (seconds)
pub const MAINTENANCE_INTERVAL_SECS: u64 = 60;

/// Inbound API rate limit: requests per window per key
pub const API_RATE_LIMIT_REQUESTS: u32 = 100;
/// Inbound API rate limit window (seconds)
pub const API_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Accepted API key prefixes
pub const API_KEY_PREFIXES: [&str; 2] = ["sk_", "pk_"];

/// Retries on HTTP 429 before declaring a source rate-limited
pub const RATE_LIMIT_MAX_RETRIES: u32 = 2;
/// Base backoff before a rate-limit retry (milliseconds)
pub const RATE_LIMIT_BASE_BACKOFF_MS: u64 = 250;
/// Random jitter added to each backoff, in percent
pub const RETRY_JITTER_PERCENT: u64 = 20;

/// Crawled pages are truncated to this many bytes before parsing
pub const MAX_CRAWL_BYTES: usize = 512 * 1024;

// ============================================
// CACHE TTLs (seconds) - per entity kind
// ============================================

pub const TTL_TICKER_SECS: u64 = 5 * 60;
pub const TTL_CONTRACT_SECS: u64 = 15 * 60;
pub const TTL_SOCIAL_SECS: u64 = 60 * 60;
pub const TTL_DOMAIN_SECS: u64 = 6 * 60 * 60;
pub const TTL_NAME_SERVICE_SECS: u64 = 6 * 60 * 60;

// ============================================
// REPORT SHAPE
// ============================================

/// Maximum number of top tags on a report
pub const MAX_TOP_TAGS: usize = 6;

// ============================================
// ENTITY GRAMMAR
// ============================================

/// Reserved name-service suffixes (checked before the domain grammar)
pub const NAME_SERVICE_SUFFIXES: [&str; 5] = [".eth", ".sol", ".bnb", ".crypto", ".nft"];

// ============================================
// SOURCE ENDPOINTS
// ============================================

pub const DEXSCREENER_BASE_URL: &str = "https://api.dexscreener.com/latest/dex";
pub const DEXSCREENER_PAGE_URL: &str = "https://dexscreener.com";
pub const GOPLUS_BASE_URL: &str = "https://api.gopluslabs.io/api/v1";
pub const GOPLUS_PAGE_URL: &str = "https://gopluslabs.io/token-security";
pub const RUGCHECK_BASE_URL: &str = "https://api.rugcheck.xyz/v1";
pub const RUGCHECK_PAGE_URL: &str = "https://rugcheck.xyz/tokens";
pub const RDAP_BASE_URL: &str = "https://rdap.org";
pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const GITHUB_PAGE_URL: &str = "https://github.com";
pub const DISCORD_API_URL: &str = "https://discord.com/api/v10";
pub const DISCORD_INVITE_URL: &str = "https://discord.gg";
pub const WAYBACK_AVAILABLE_URL: &str = "https://archive.org/wayback/available";
pub const WAYBACK_PAGE_URL: &str = "https://web.archive.org/web";

/// Discord snowflake epoch (2015-01-01T00:00:00Z) in milliseconds
pub const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

// ============================================
// CHAIN IDS - Single Source of Truth
// ============================================

/// Ethereum Mainnet
pub const CHAIN_ID_ETHEREUM: u64 = 1;
/// BNB Smart Chain
pub const CHAIN_ID_BSC: u64 = 56;
/// Polygon
pub const CHAIN_ID_POLYGON: u64 = 137;
/// Arbitrum One
pub const CHAIN_ID_ARBITRUM: u64 = 42161;
/// Optimism
pub const CHAIN_ID_OPTIMISM: u64 = 10;
/// Avalanche C-Chain
pub const CHAIN_ID_AVALANCHE: u64 = 43114;
/// Base
pub const CHAIN_ID_BASE: u64 = 8453;

/// Get human-readable chain name
pub fn get_chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "Ethereum",
        CHAIN_ID_BSC => "BNB Smart Chain",
        CHAIN_ID_POLYGON => "Polygon",
        CHAIN_ID_ARBITRUM => "Arbitrum One",
        CHAIN_ID_OPTIMISM => "Optimism",
        CHAIN_ID_AVALANCHE => "Avalanche C-Chain",
        CHAIN_ID_BASE => "Base",
        _ => "Unknown",
    }
}

/// Convert a DexScreener chain slug to a numeric EVM chain ID
pub fn dexscreener_name_to_chain_id(name: &str) -> Option<u64> {
    match name.to_lowercase().as_str() {
        "ethereum" => Some(CHAIN_ID_ETHEREUM),
        "bsc" => Some(CHAIN_ID_BSC),
        "polygon" => Some(CHAIN_ID_POLYGON),
        "arbitrum" => Some(CHAIN_ID_ARBITRUM),
        "optimism" => Some(CHAIN_ID_OPTIMISM),
        "avalanche" => Some(CHAIN_ID_AVALANCHE),
        "base" => Some(CHAIN_ID_BASE),
        _ => None,
    }
}
