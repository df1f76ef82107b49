//! Entity resolution properties

use larpscore::models::types::{Chain, SocialPlatform};
use larpscore::{resolve, EntityKind};

const BASE58: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Deterministic pseudo-random base58 string of `len` chars
fn base58_string(seed: usize, len: usize) -> String {
    let alphabet = BASE58.as_bytes();
    (0..len)
        .map(|i| alphabet[(seed * 31 + i * 17 + i * i) % alphabet.len()] as char)
        .collect()
}

#[test]
fn test_ticker_grammar_always_resolves_to_uppercase_ticker() {
    for raw in ["$pepe", "#Bonk", "$WIF", "$a1", "#ABCDEFGHIJ", "PEPE", "BONK2"] {
        let entity = resolve(raw).unwrap_or_else(|| panic!("{} did not resolve", raw));
        assert_eq!(entity.kind, EntityKind::Ticker, "{}", raw);
        assert_eq!(entity.normalized_value, entity.normalized_value.to_uppercase());
        assert!(!entity.normalized_value.starts_with(['$', '#']));
    }
}

#[test]
fn test_base58_strings_resolve_to_contracts() {
    for len in 32..=44 {
        for seed in 0..5 {
            let raw = base58_string(seed, len);
            let entity = resolve(&raw).unwrap();
            assert_eq!(entity.kind, EntityKind::ContractAddress, "{}", raw);
            assert_eq!(entity.chain, Some(Chain::Solana));
            // Case is significant in base58
            assert_eq!(entity.normalized_value, raw);
        }
    }
}

#[test]
fn test_evm_addresses_resolve_to_evm_contracts() {
    let entity = resolve("0x6982508145454Ce325dDbE47a25d4ec3d2311933").unwrap();
    assert_eq!(entity.kind, EntityKind::ContractAddress);
    assert_eq!(entity.chain, Some(Chain::Evm));
    assert_eq!(
        entity.canonical_id(),
        "contract:evm:0x6982508145454ce325ddbe47a25d4ec3d2311933"
    );
}

#[test]
fn test_resolution_is_idempotent() {
    let queries = [
        "$PEPE",
        "https://x.com/SomeProject",
        "@larp_dev",
        "vitalik.eth",
        "Example.XYZ",
        "discord.gg/AbCdEf",
        "0x6982508145454ce325ddbe47a25d4ec3d2311933",
    ];
    for q in queries {
        assert_eq!(resolve(q), resolve(q), "{}", q);
    }
}

#[test]
fn test_social_and_web_entities() {
    let twitter = resolve("https://twitter.com/LarpProject").unwrap();
    assert_eq!(twitter.kind, EntityKind::SocialHandle);
    assert_eq!(twitter.platform, Some(SocialPlatform::Twitter));

    assert_eq!(resolve("vitalik.eth").unwrap().kind, EntityKind::NameServiceRecord);
    assert_eq!(resolve("https://www.example.xyz/about").unwrap().kind, EntityKind::Domain);
}

#[test]
fn test_unclassifiable_input() {
    assert!(resolve("").is_none());
    assert!(resolve("   ").is_none());
    assert!(resolve("not a thing at all").is_none());
}
