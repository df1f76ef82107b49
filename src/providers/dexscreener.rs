//! DexScreener market feed
//!
//! Route discovery for contract addresses: which chain carries the token,
//! how deep its pools are, how recently they appeared, and which websites
//! and social accounts the listing advertises.
//!
//! API: https://api.dexscreener.com/latest/dex/tokens/{tokenAddress}
//! Free, no API key required

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::errors::AppResult;
use crate::models::types::{EntityKind, ResolvedEntity, SourceTier};
use crate::utils::constants::{DEXSCREENER_BASE_URL, DEXSCREENER_PAGE_URL};

use super::adapter::{AdapterOutcome, IntelAdapter, Unavailable};
use super::http::SourceClient;

/// DexScreener API response
#[derive(Debug, Deserialize)]
pub struct DexScreenerResponse {
    #[serde(default)]
    pub pairs: Option<Vec<DexPair>>,
}

/// A trading pair from DexScreener
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    /// Chain slug (e.g., "solana", "ethereum", "bsc")
    pub chain_id: String,
    pub dex_id: String,
    pub pair_address: String,
    pub base_token: DexToken,
    pub liquidity: Option<DexLiquidity>,
    pub volume: Option<DexVolume>,
    /// Pool creation time, unix milliseconds
    pub pair_created_at: Option<i64>,
    pub info: Option<DexInfo>,
    pub url: Option<String>,
}

impl DexPair {
    fn liquidity_usd(&self) -> f64 {
        self.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.pair_created_at
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexToken {
    pub address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexLiquidity {
    pub usd: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexVolume {
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DexInfo {
    #[serde(default)]
    pub websites: Vec<DexLink>,
    #[serde(default)]
    pub socials: Vec<DexLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexLink {
    pub url: String,
}

/// Market snapshot for one token, restricted to its deepest chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketData {
    pub chain: String,
    pub symbol: Option<String>,
    pub pair_count: usize,
    pub best_pair_address: String,
    pub best_dex: String,
    /// Summed across all pools on `chain`
    pub liquidity_usd: f64,
    pub volume_24h_usd: Option<f64>,
    pub oldest_pair_created_at: Option<DateTime<Utc>>,
    pub newest_pair_created_at: Option<DateTime<Utc>>,
    pub pairs_created_24h: u32,
    pub websites: Vec<String>,
    pub socials: Vec<String>,
    pub url: String,
}

impl MarketData {
    /// Build a snapshot from pairs sorted by liquidity, highest first
    pub fn from_pairs(pairs: &[DexPair], now: DateTime<Utc>) -> Option<Self> {
        let best = pairs.first()?;
        let on_chain: Vec<&DexPair> = pairs
            .iter()
            .filter(|p| p.chain_id.eq_ignore_ascii_case(&best.chain_id))
            .collect();

        let created: Vec<DateTime<Utc>> = on_chain.iter().filter_map(|p| p.created_at()).collect();
        let day_ago = now - Duration::hours(24);

        let mut websites = Vec::new();
        let mut socials = Vec::new();
        for pair in &on_chain {
            if let Some(info) = &pair.info {
                push_unique(&mut websites, info.websites.iter().map(|l| l.url.clone()));
                push_unique(&mut socials, info.socials.iter().map(|l| l.url.clone()));
            }
        }

        Some(Self {
            chain: best.chain_id.to_lowercase(),
            symbol: best.base_token.symbol.clone(),
            pair_count: on_chain.len(),
            best_pair_address: best.pair_address.clone(),
            best_dex: best.dex_id.clone(),
            liquidity_usd: on_chain.iter().map(|p| p.liquidity_usd()).sum(),
            volume_24h_usd: best.volume.as_ref().and_then(|v| v.h24),
            oldest_pair_created_at: created.iter().min().copied(),
            newest_pair_created_at: created.iter().max().copied(),
            pairs_created_24h: created.iter().filter(|t| **t >= day_ago).count() as u32,
            websites,
            socials,
            url: best.url.clone().unwrap_or_else(|| {
                format!(
                    "{}/{}/{}",
                    DEXSCREENER_PAGE_URL,
                    best.chain_id.to_lowercase(),
                    best.pair_address
                )
            }),
        })
    }
}

fn push_unique(target: &mut Vec<String>, items: impl Iterator<Item = String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

/// DexScreener API client
#[derive(Clone)]
pub struct DexScreenerClient {
    http: SourceClient,
    base_url: String,
}

impl DexScreenerClient {
    pub fn new(http: SourceClient) -> Self {
        Self {
            http,
            base_url: DEXSCREENER_BASE_URL.to_string(),
        }
    }

    /// Fetch all pairs for a token address, sorted by liquidity (highest first)
    pub async fn token_pairs(&self, token_address: &str) -> AppResult<Vec<DexPair>> {
        let url = format!("{}/tokens/{}", self.base_url, token_address);
        debug!("🔍 DexScreener: Fetching pairs for {}", token_address);

        let data: DexScreenerResponse = self.http.get_json("dexscreener", &url, &[]).await?;
        let mut pairs = data.pairs.unwrap_or_default();
        pairs.sort_by(|a, b| {
            b.liquidity_usd()
                .partial_cmp(&a.liquidity_usd())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!("📊 DexScreener: Found {} pairs", pairs.len());
        Ok(pairs)
    }

    /// 🎯 AUTO-DETECT: chain slug carrying the deepest liquidity for a token
    pub async fn auto_detect_chain(&self, token_address: &str) -> Option<String> {
        let pairs = self.token_pairs(token_address).await.ok()?;
        let best = pairs.first()?;
        info!(
            "🎯 Auto-detected: {} on {}",
            best.base_token.symbol.as_deref().unwrap_or("Unknown"),
            best.chain_id
        );
        Some(best.chain_id.to_lowercase())
    }
}

/// `market-feed` adapter
pub struct MarketFeedAdapter {
    client: DexScreenerClient,
}

impl MarketFeedAdapter {
    pub fn new(client: DexScreenerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IntelAdapter for MarketFeedAdapter {
    fn id(&self) -> &'static str {
        "market-feed"
    }

    fn tier(&self) -> SourceTier {
        SourceTier::Api
    }

    fn applies_to(&self) -> &'static [EntityKind] {
        &[EntityKind::ContractAddress]
    }

    async fn fetch(&self, entity: &ResolvedEntity) -> AdapterOutcome {
        let result = match self.client.token_pairs(&entity.normalized_value).await {
            Ok(pairs) => MarketData::from_pairs(&pairs, Utc::now()).ok_or(Unavailable::NotFound),
            Err(e) => Err(e.into()),
        };
        result.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "schemaVersion": "1.0.0",
        "pairs": [
            {
                "chainId": "solana",
                "dexId": "raydium",
                "url": "https://dexscreener.com/solana/pairA",
                "pairAddress": "pairA",
                "baseToken": {"address": "Mint111", "name": "Larp", "symbol": "LARP"},
                "quoteToken": {"address": "So111", "name": "Wrapped SOL", "symbol": "SOL"},
                "liquidity": {"usd": 12000.5, "base": 1, "quote": 2},
                "volume": {"h24": 5000},
                "pairCreatedAt": 1700000000000,
                "info": {
                    "websites": [{"label": "Website", "url": "https://larp.example"}],
                    "socials": [{"type": "twitter", "url": "https://x.com/larp"}]
                }
            },
            {
                "chainId": "solana",
                "dexId": "meteora",
                "pairAddress": "pairB",
                "baseToken": {"address": "Mint111", "symbol": "LARP"},
                "liquidity": {"usd": 3000},
                "pairCreatedAt": 1700050000000,
                "info": {"socials": [{"type": "twitter", "url": "https://x.com/larp"}]}
            },
            {
                "chainId": "base",
                "dexId": "uniswap",
                "pairAddress": "pairC",
                "baseToken": {"address": "0xabc", "symbol": "LARP"},
                "liquidity": {"usd": 50}
            }
        ]
    }"#;

    #[test]
    fn test_snapshot_from_fixture() {
        let response: DexScreenerResponse = serde_json::from_str(FIXTURE).unwrap();
        let pairs = response.pairs.unwrap();
        let now = Utc.timestamp_millis_opt(1_700_060_000_000).unwrap();

        let market = MarketData::from_pairs(&pairs, now).unwrap();
        assert_eq!(market.chain, "solana");
        assert_eq!(market.pair_count, 2);
        assert_eq!(market.best_dex, "raydium");
        assert!((market.liquidity_usd - 15000.5).abs() < 1e-9);
        assert_eq!(market.pairs_created_24h, 2);
        assert_eq!(market.websites, vec!["https://larp.example"]);
        assert_eq!(market.socials, vec!["https://x.com/larp"]);
        assert_eq!(market.url, "https://dexscreener.com/solana/pairA");
    }

    #[test]
    fn test_empty_pairs_is_none() {
        let response: DexScreenerResponse = serde_json::from_str(r#"{"pairs": null}"#).unwrap();
        let pairs = response.pairs.unwrap_or_default();
        assert!(MarketData::from_pairs(&pairs, Utc::now()).is_none());
    }
}
