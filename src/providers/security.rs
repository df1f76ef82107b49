//! On-chain security reports
//!
//! Solana mints go to RugCheck, EVM contracts go to GoPlus. EVM addresses
//! do not carry their network, so the chain is taken from the market feed
//! (deepest liquidity wins) with Ethereum as the fallback. The chain that
//! was actually queried is reported in the payload.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{Chain, EntityKind, ResolvedEntity, SourceTier};
use crate::utils::constants::{
    dexscreener_name_to_chain_id, get_chain_name, CHAIN_ID_ETHEREUM, GOPLUS_BASE_URL,
    GOPLUS_PAGE_URL, RUGCHECK_BASE_URL, RUGCHECK_PAGE_URL,
};

use super::adapter::{AdapterOutcome, IntelAdapter, Unavailable};
use super::dexscreener::DexScreenerClient;
use super::http::{parse_flag, parse_num, SourceClient};

/// Normalized security report, whichever provider produced it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecurityReport {
    pub provider: String,
    pub chain: String,
    pub mint_authority_active: Option<bool>,
    pub freeze_authority_active: Option<bool>,
    pub is_honeypot: Option<bool>,
    pub lp_locked_pct: Option<f64>,
    pub top10_holder_pct: Option<f64>,
    pub largest_holder_pct: Option<f64>,
    pub creator_address: Option<String>,
    pub creator_holding_pct: Option<f64>,
    /// Other tokens by the same creator already flagged as scams
    pub same_creator_flagged: Option<u32>,
    /// Insider wallet networks detected among holders
    pub insider_networks: Option<u32>,
    pub risks: Vec<String>,
    pub url: String,
}

// ============================================
// RugCheck (Solana)
// ============================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RugCheckReport {
    pub mint_authority: Option<String>,
    pub freeze_authority: Option<String>,
    pub creator: Option<String>,
    #[serde(default)]
    pub top_holders: Vec<RugCheckHolder>,
    #[serde(default)]
    pub markets: Vec<RugCheckMarket>,
    #[serde(default)]
    pub risks: Vec<RugCheckRisk>,
    pub graph_insiders_detected: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RugCheckHolder {
    pub address: String,
    /// Percent of supply, 0-100
    #[serde(default)]
    pub pct: f64,
}

#[derive(Debug, Deserialize)]
pub struct RugCheckMarket {
    pub lp: Option<RugCheckLp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RugCheckLp {
    pub lp_locked_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RugCheckRisk {
    pub name: String,
    #[serde(default)]
    pub level: String,
}

impl RugCheckReport {
    pub fn into_report(self, mint: &str) -> SecurityReport {
        let top10: f64 = self.top_holders.iter().take(10).map(|h| h.pct).sum();
        let largest = self
            .top_holders
            .iter()
            .map(|h| h.pct)
            .fold(None, |max: Option<f64>, pct| Some(max.map_or(pct, |m| m.max(pct))));
        let creator_holding = self.creator.as_ref().and_then(|creator| {
            self.top_holders
                .iter()
                .find(|h| &h.address == creator)
                .map(|h| h.pct)
        });

        SecurityReport {
            provider: "rugcheck".to_string(),
            chain: "solana".to_string(),
            mint_authority_active: Some(self.mint_authority.is_some()),
            freeze_authority_active: Some(self.freeze_authority.is_some()),
            is_honeypot: None,
            lp_locked_pct: self
                .markets
                .iter()
                .find_map(|m| m.lp.as_ref().and_then(|lp| lp.lp_locked_pct)),
            top10_holder_pct: (!self.top_holders.is_empty()).then_some(top10),
            largest_holder_pct: largest,
            creator_address: self.creator,
            creator_holding_pct: creator_holding,
            same_creator_flagged: None,
            insider_networks: self.graph_insiders_detected,
            risks: self
                .risks
                .into_iter()
                .map(|r| if r.level.is_empty() { r.name } else { format!("{} ({})", r.name, r.level) })
                .collect(),
            url: format!("{}/{}", RUGCHECK_PAGE_URL, mint),
        }
    }
}

// ============================================
// GoPlus (EVM)
// ============================================

#[derive(Debug, Deserialize)]
pub struct GoPlusResponse {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: HashMap<String, GoPlusToken>,
}

/// GoPlus encodes most numbers and flags as strings
#[derive(Debug, Deserialize)]
pub struct GoPlusToken {
    pub is_mintable: Option<String>,
    pub is_honeypot: Option<String>,
    pub creator_address: Option<String>,
    pub creator_percent: Option<String>,
    pub honeypot_with_same_creator: Option<String>,
    #[serde(default)]
    pub holders: Vec<GoPlusHolder>,
    #[serde(default)]
    pub lp_holders: Vec<GoPlusHolder>,
}

#[derive(Debug, Deserialize)]
pub struct GoPlusHolder {
    pub address: String,
    /// Fraction of supply, 0-1
    pub percent: Option<String>,
    #[serde(default)]
    pub is_locked: i64,
}

impl GoPlusToken {
    pub fn into_report(self, chain_id: u64, address: &str) -> SecurityReport {
        let holder_pcts: Vec<f64> = self
            .holders
            .iter()
            .filter_map(|h| parse_num(&h.percent))
            .map(|p| p * 100.0)
            .collect();
        let lp_locked: f64 = self
            .lp_holders
            .iter()
            .filter(|h| h.is_locked == 1)
            .filter_map(|h| parse_num(&h.percent))
            .sum::<f64>()
            * 100.0;

        let mut risks = Vec::new();
        if parse_flag(&self.is_honeypot) == Some(true) {
            risks.push("Honeypot".to_string());
        }
        if parse_flag(&self.is_mintable) == Some(true) {
            risks.push("Mintable".to_string());
        }

        SecurityReport {
            provider: "goplus".to_string(),
            chain: get_chain_name(chain_id).to_lowercase(),
            mint_authority_active: parse_flag(&self.is_mintable),
            freeze_authority_active: None,
            is_honeypot: parse_flag(&self.is_honeypot),
            lp_locked_pct: (!self.lp_holders.is_empty()).then_some(lp_locked.min(100.0)),
            top10_holder_pct: (!holder_pcts.is_empty())
                .then(|| holder_pcts.iter().take(10).sum::<f64>().min(100.0)),
            largest_holder_pct: holder_pcts.iter().copied().reduce(f64::max),
            creator_address: self.creator_address,
            creator_holding_pct: parse_num(&self.creator_percent).map(|p| p * 100.0),
            same_creator_flagged: parse_num(&self.honeypot_with_same_creator).map(|n| n as u32),
            insider_networks: None,
            risks,
            url: format!("{}/{}/{}", GOPLUS_PAGE_URL, chain_id, address),
        }
    }
}

/// `security-report` adapter
pub struct SecurityReportAdapter {
    http: SourceClient,
    market: DexScreenerClient,
}

impl SecurityReportAdapter {
    pub fn new(http: SourceClient, market: DexScreenerClient) -> Self {
        Self { http, market }
    }

    async fn rugcheck(&self, mint: &str) -> AppResult<SecurityReport> {
        let url = format!("{}/tokens/{}/report", RUGCHECK_BASE_URL, mint);
        let report: RugCheckReport = self.http.get_json("rugcheck", &url, &[]).await?;
        Ok(report.into_report(mint))
    }

    async fn goplus(&self, address: &str) -> AppResult<SecurityReport> {
        let chain_id = match self.market.auto_detect_chain(address).await {
            Some(slug) => dexscreener_name_to_chain_id(&slug).unwrap_or(CHAIN_ID_ETHEREUM),
            None => {
                debug!("No market listing for {}, assuming Ethereum", address);
                CHAIN_ID_ETHEREUM
            }
        };

        let url = format!(
            "{}/token_security/{}?contract_addresses={}",
            GOPLUS_BASE_URL, chain_id, address
        );
        let response: GoPlusResponse = self.http.get_json("goplus", &url, &[]).await?;
        if response.code != 1 {
            return Err(AppError::external(format!(
                "GoPlus error {}: {}",
                response.code, response.message
            )));
        }

        let token = response
            .result
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(address))
            .map(|(_, token)| token)
            .ok_or_else(|| AppError::not_found(format!("GoPlus has no record for {}", address)))?;

        info!("🛡️ GoPlus report for {} on {}", address, get_chain_name(chain_id));
        Ok(token.into_report(chain_id, address))
    }
}

#[async_trait]
impl IntelAdapter for SecurityReportAdapter {
    fn id(&self) -> &'static str {
        "security-report"
    }

    fn tier(&self) -> SourceTier {
        SourceTier::Api
    }

    fn applies_to(&self) -> &'static [EntityKind] {
        &[EntityKind::ContractAddress]
    }

    async fn fetch(&self, entity: &ResolvedEntity) -> AdapterOutcome {
        let result = match entity.chain {
            Some(Chain::Solana) => self.rugcheck(&entity.normalized_value).await,
            Some(Chain::Evm) => self.goplus(&entity.normalized_value).await,
            None => return AdapterOutcome::Unavailable(Unavailable::NotApplicable),
        };
        result.map_err(Unavailable::from).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rugcheck_fixture() {
        let json = r#"{
            "mint": "Mint111",
            "mintAuthority": "Auth111",
            "freezeAuthority": null,
            "creator": "Dev111",
            "topHolders": [
                {"address": "Dev111", "pct": 30.0, "insider": true},
                {"address": "W2", "pct": 12.5},
                {"address": "W3", "pct": 7.5}
            ],
            "markets": [{"marketType": "raydium", "lp": {"lpLockedPct": 0}}],
            "risks": [{"name": "Mint Authority still enabled", "level": "danger", "score": 3000}],
            "graphInsidersDetected": 2
        }"#;
        let report: RugCheckReport = serde_json::from_str(json).unwrap();
        let sec = report.into_report("Mint111");

        assert_eq!(sec.provider, "rugcheck");
        assert_eq!(sec.mint_authority_active, Some(true));
        assert_eq!(sec.freeze_authority_active, Some(false));
        assert_eq!(sec.lp_locked_pct, Some(0.0));
        assert_eq!(sec.top10_holder_pct, Some(50.0));
        assert_eq!(sec.largest_holder_pct, Some(30.0));
        assert_eq!(sec.creator_holding_pct, Some(30.0));
        assert_eq!(sec.insider_networks, Some(2));
        assert_eq!(sec.risks, vec!["Mint Authority still enabled (danger)"]);
        assert_eq!(sec.url, "https://rugcheck.xyz/tokens/Mint111");
    }

    #[test]
    fn test_goplus_fixture() {
        let json = r#"{
            "code": 1,
            "message": "OK",
            "result": {
                "0xabc": {
                    "is_mintable": "1",
                    "is_honeypot": "0",
                    "creator_address": "0xdev",
                    "creator_percent": "0.05",
                    "honeypot_with_same_creator": "2",
                    "holders": [
                        {"address": "0x1", "percent": "0.40", "is_locked": 0},
                        {"address": "0x2", "percent": "0.10", "is_locked": 0}
                    ],
                    "lp_holders": [
                        {"address": "0xdead", "percent": "0.60", "is_locked": 1},
                        {"address": "0x3", "percent": "0.40", "is_locked": 0}
                    ]
                }
            }
        }"#;
        let response: GoPlusResponse = serde_json::from_str(json).unwrap();
        let token = response.result.into_values().next().unwrap();
        let sec = token.into_report(CHAIN_ID_ETHEREUM, "0xabc");

        assert_eq!(sec.chain, "ethereum");
        assert_eq!(sec.mint_authority_active, Some(true));
        assert_eq!(sec.is_honeypot, Some(false));
        assert!((sec.lp_locked_pct.unwrap() - 60.0).abs() < 1e-9);
        assert!((sec.top10_holder_pct.unwrap() - 50.0).abs() < 1e-9);
        assert!((sec.largest_holder_pct.unwrap() - 40.0).abs() < 1e-9);
        assert_eq!(sec.same_creator_flagged, Some(2));
        assert_eq!(sec.risks, vec!["Mintable"]);
    }
}
