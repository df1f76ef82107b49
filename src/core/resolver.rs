//! Entity Resolver
//!
//! Classifies a free-form query into exactly one typed entity. Rules are a
//! precedence list, evaluated top to bottom; the first rule that matches
//! wins and later rules are never consulted:
//!
//! 1. `$`/`#` prefix + ticker grammar        → ticker
//! 2. 32-44 char base58                      → contract address (Solana)
//! 3. `0x` + 40 hex digits                   → contract address (EVM, network unknown)
//! 4. social URL fragment, or `@handle`      → social handle
//! 5. reserved name-service suffix           → name-service record
//! 6. domain grammar                         → domain
//! 7. bare all-caps ticker                   → ticker
//!    bare handle-shaped string              → social handle
//!
//! Resolution is pure: no I/O, no hidden state.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::types::{Chain, EntityKind, ResolvedEntity, SocialPlatform};
use crate::utils::constants::NAME_SERVICE_SUFFIXES;

lazy_static! {
    static ref TICKER: Regex = Regex::new(r"(?i)^[A-Z][A-Z0-9]{0,9}$").unwrap();
    static ref BARE_TICKER: Regex = Regex::new(r"^[A-Z][A-Z0-9]{0,9}$").unwrap();
    static ref BASE58: Regex = Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").unwrap();
    static ref HANDLE: Regex = Regex::new(r"^[A-Za-z0-9_]{1,15}$").unwrap();
    static ref DOMAIN_LABEL: Regex = Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").unwrap();
    static ref TLD: Regex = Regex::new(r"^[a-z]{2,63}$").unwrap();
    static ref URL_HANDLE: Regex = Regex::new(r"^@?([A-Za-z0-9_.\-]{1,64})").unwrap();
}

/// URL fragments that identify a social platform, most specific first
const SOCIAL_FRAGMENTS: [(&str, SocialPlatform); 12] = [
    ("discord.com/invite/", SocialPlatform::Discord),
    ("discord.gg/", SocialPlatform::Discord),
    ("twitter.com/", SocialPlatform::Twitter),
    ("x.com/", SocialPlatform::Twitter),
    ("t.me/", SocialPlatform::Telegram),
    ("telegram.me/", SocialPlatform::Telegram),
    ("github.com/", SocialPlatform::GitHub),
    ("instagram.com/", SocialPlatform::Instagram),
    ("tiktok.com/@", SocialPlatform::TikTok),
    ("youtube.com/@", SocialPlatform::YouTube),
    ("youtube.com/c/", SocialPlatform::YouTube),
    ("youtube.com/channel/", SocialPlatform::YouTube),
];

/// Resolve a query into an entity. `None` is the NoMatch outcome.
pub fn resolve(query: &str) -> Option<ResolvedEntity> {
    let raw = query.trim();
    if raw.is_empty() {
        return None;
    }

    ticker_with_prefix(raw)
        .or_else(|| base58_address(raw))
        .or_else(|| evm_address(raw))
        .or_else(|| social_handle(raw))
        .or_else(|| name_service_record(raw))
        .or_else(|| domain(raw))
        .or_else(|| bare_fallback(raw))
}

/// Rule 1
fn ticker_with_prefix(raw: &str) -> Option<ResolvedEntity> {
    let rest = raw.strip_prefix('$').or_else(|| raw.strip_prefix('#'))?;
    TICKER
        .is_match(rest)
        .then(|| ResolvedEntity::new(EntityKind::Ticker, raw, rest.to_uppercase()))
}

/// Rule 2. Base58 is case-significant, so the value is kept verbatim.
fn base58_address(raw: &str) -> Option<ResolvedEntity> {
    BASE58.is_match(raw).then(|| {
        ResolvedEntity::new(EntityKind::ContractAddress, raw, raw).with_chain(Chain::Solana)
    })
}

/// Rule 3
fn evm_address(raw: &str) -> Option<ResolvedEntity> {
    let hex_part = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
    if hex_part.len() != 40 {
        return None;
    }
    let bytes = hex::decode(hex_part).ok()?;
    Some(
        ResolvedEntity::new(
            EntityKind::ContractAddress,
            raw,
            format!("0x{}", hex::encode(bytes)),
        )
        .with_chain(Chain::Evm),
    )
}

/// Rule 4
fn social_handle(raw: &str) -> Option<ResolvedEntity> {
    if let Some(handle) = raw.strip_prefix('@') {
        return HANDLE
            .is_match(handle)
            .then(|| ResolvedEntity::new(EntityKind::SocialHandle, raw, handle.to_lowercase()));
    }

    // ASCII lowering keeps byte offsets aligned with `raw`
    let lowered = raw.to_ascii_lowercase();
    for (fragment, platform) in SOCIAL_FRAGMENTS {
        let Some(pos) = lowered.find(fragment) else {
            continue;
        };
        // The fragment must start a host, not sit inside another name
        // (e.g. "box.com/" must not match "x.com/")
        let before = &lowered[..pos];
        if !(before.is_empty() || before.ends_with("//") || before.ends_with('.')) {
            continue;
        }

        let tail = &raw[pos + fragment.len()..];
        let handle = URL_HANDLE.captures(tail)?.get(1)?.as_str();
        let handle = handle.trim_end_matches('.');
        if handle.is_empty() {
            return None;
        }
        // Discord invite codes are case-sensitive; every other handle is not
        let handle = match platform {
            SocialPlatform::Discord => handle.to_string(),
            _ => handle.to_lowercase(),
        };
        return Some(
            ResolvedEntity::new(EntityKind::SocialHandle, raw, handle).with_platform(platform),
        );
    }
    None
}

/// Rule 5
fn name_service_record(raw: &str) -> Option<ResolvedEntity> {
    let lowered = raw.to_lowercase();
    let suffix = NAME_SERVICE_SUFFIXES
        .iter()
        .find(|suffix| lowered.ends_with(*suffix))?;
    let name = &lowered[..lowered.len() - suffix.len()];
    let labels_ok = !name.is_empty() && name.split('.').all(|l| DOMAIN_LABEL.is_match(l));
    labels_ok.then(|| ResolvedEntity::new(EntityKind::NameServiceRecord, raw, lowered.clone()))
}

/// Rule 6. Accepts bare hosts and URLs; scheme, `www.`, port and path are dropped.
fn domain(raw: &str) -> Option<ResolvedEntity> {
    let host = host_of(raw)?;
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return None;
    }
    let tld_ok = labels.last().is_some_and(|tld| TLD.is_match(tld));
    let labels_ok = labels.iter().all(|l| DOMAIN_LABEL.is_match(l));
    (tld_ok && labels_ok).then(|| ResolvedEntity::new(EntityKind::Domain, raw, host))
}

fn host_of(raw: &str) -> Option<String> {
    let lowered = raw.to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()?
        .split(':')
        .next()?
        .trim_end_matches('.');
    let host = host.strip_prefix("www.").unwrap_or(host);
    (!host.is_empty()).then(|| host.to_string())
}

/// Rule 7
fn bare_fallback(raw: &str) -> Option<ResolvedEntity> {
    if BARE_TICKER.is_match(raw) {
        return Some(ResolvedEntity::new(EntityKind::Ticker, raw, raw));
    }
    if HANDLE.is_match(raw) {
        return Some(ResolvedEntity::new(EntityKind::SocialHandle, raw, raw.to_lowercase()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(query: &str) -> Option<EntityKind> {
        resolve(query).map(|e| e.kind)
    }

    #[test]
    fn test_prefixed_ticker() {
        let e = resolve("$pepe").unwrap();
        assert_eq!(e.kind, EntityKind::Ticker);
        assert_eq!(e.normalized_value, "PEPE");
        assert_eq!(e.raw_value, "$pepe");

        let e = resolve("#Wif").unwrap();
        assert_eq!(e.normalized_value, "WIF");
    }

    #[test]
    fn test_prefixed_ticker_too_long_falls_through() {
        // 11 chars after '$' is not a ticker; nothing else matches either
        assert_eq!(kind_of("$ABCDEFGHIJK"), None);
    }

    #[test]
    fn test_base58_contract() {
        let mint = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
        let e = resolve(mint).unwrap();
        assert_eq!(e.kind, EntityKind::ContractAddress);
        assert_eq!(e.chain, Some(Chain::Solana));
        assert_eq!(e.normalized_value, mint);
    }

    #[test]
    fn test_base58_rejects_excluded_alphabet() {
        // contains '0' and 'O'
        let bad = "0PjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1O";
        assert_ne!(kind_of(bad), Some(EntityKind::ContractAddress));
    }

    #[test]
    fn test_evm_contract_is_lowercased() {
        let e = resolve("0xdAC17F958D2ee523a2206206994597C13D831ec7").unwrap();
        assert_eq!(e.kind, EntityKind::ContractAddress);
        assert_eq!(e.chain, Some(Chain::Evm));
        assert_eq!(e.normalized_value, "0xdac17f958d2ee523a2206206994597c13d831ec7");
    }

    #[test]
    fn test_social_handles() {
        let e = resolve("@ElonMusk").unwrap();
        assert_eq!(e.kind, EntityKind::SocialHandle);
        assert_eq!(e.normalized_value, "elonmusk");
        assert_eq!(e.platform, None);

        let e = resolve("https://x.com/SomeProject/status/123").unwrap();
        assert_eq!(e.kind, EntityKind::SocialHandle);
        assert_eq!(e.platform, Some(SocialPlatform::Twitter));
        assert_eq!(e.normalized_value, "someproject");

        let e = resolve("discord.gg/AbCd123").unwrap();
        assert_eq!(e.platform, Some(SocialPlatform::Discord));
        assert_eq!(e.normalized_value, "AbCd123");
    }

    #[test]
    fn test_social_canonical_ids_separate_platforms_and_invite_case() {
        let upper = resolve("https://discord.gg/AbCd123").unwrap();
        let lower = resolve("https://discord.gg/aBcD123").unwrap();
        let github = resolve("https://github.com/AbCd123").unwrap();

        assert_eq!(upper.canonical_id(), "social:discord:AbCd123");
        assert_eq!(lower.canonical_id(), "social:discord:aBcD123");
        assert_eq!(github.canonical_id(), "social:github:abcd123");
        assert_eq!(resolve("@AbCd123").unwrap().canonical_id(), "social:any:abcd123");
    }

    #[test]
    fn test_fragment_inside_other_host_is_not_social() {
        let e = resolve("https://dropbox.com/files").unwrap();
        assert_eq!(e.kind, EntityKind::Domain);
        assert_eq!(e.normalized_value, "dropbox.com");
    }

    #[test]
    fn test_name_service_beats_domain() {
        let e = resolve("Vitalik.eth").unwrap();
        assert_eq!(e.kind, EntityKind::NameServiceRecord);
        assert_eq!(e.normalized_value, "vitalik.eth");
    }

    #[test]
    fn test_domains() {
        let e = resolve("https://www.Example.co.uk/about?x=1").unwrap();
        assert_eq!(e.kind, EntityKind::Domain);
        assert_eq!(e.normalized_value, "example.co.uk");

        assert_eq!(kind_of("bad_label.com"), None);
    }

    #[test]
    fn test_bare_fallbacks() {
        assert_eq!(kind_of("PEPE"), Some(EntityKind::Ticker));
        assert_eq!(kind_of("pepe_fan"), Some(EntityKind::SocialHandle));
        assert_eq!(kind_of("this is not anything"), None);
        assert_eq!(kind_of("   "), None);
        assert_eq!(kind_of(""), None);
    }
}
