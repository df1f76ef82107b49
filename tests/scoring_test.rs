//! Scoring engine properties

use larpscore::models::inputs::{IdentityInput, LiquidityInput, SocialInput, WalletInput};
use larpscore::{Confidence, ModuleInputs, RiskLevel, RiskModule, ScoringEngine};

fn sample_inputs() -> Vec<ModuleInputs> {
    vec![
        ModuleInputs::default(),
        ModuleInputs {
            liquidity: Some(LiquidityInput {
                mint_authority_active: Some(true),
                lp_locked_pct: Some(0.0),
                top10_holder_pct: Some(62.0),
                ..Default::default()
            }),
            ..Default::default()
        },
        ModuleInputs {
            identity: Some(IdentityInput {
                account_age_days: Some(3),
                domain_age_days: Some(5),
                team_anonymous: Some(true),
                ..Default::default()
            }),
            social: Some(SocialInput {
                engagement_rate_pct: Some(0.2),
                burst_posting_detected: Some(true),
                ..Default::default()
            }),
            wallet: Some(WalletInput {
                deployer_age_days: Some(1),
                funded_by_fresh_wallet: Some(true),
                flagged_associations: Some(3),
                ..Default::default()
            }),
            liquidity: Some(LiquidityInput {
                lp_locked_pct: Some(100.0),
                liquidity_usd: Some(2_000_000.0),
                ..Default::default()
            }),
            ..Default::default()
        },
    ]
}

#[test]
fn test_risk_level_thresholds_are_exact() {
    assert_eq!(RiskLevel::from_score(100), RiskLevel::Critical);
    assert_eq!(RiskLevel::from_score(70), RiskLevel::Critical);
    assert_eq!(RiskLevel::from_score(69), RiskLevel::High);
    assert_eq!(RiskLevel::from_score(50), RiskLevel::High);
    assert_eq!(RiskLevel::from_score(49), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_score(30), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_score(29), RiskLevel::Low);
    assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
}

#[test]
fn test_module_weights_sum_to_one() {
    let total: f64 = RiskModule::ALL.iter().map(|m| m.weight()).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_composite_is_rounded_weighted_sum() {
    let engine = ScoringEngine::default();
    for inputs in sample_inputs() {
        let report = engine.score(&inputs).unwrap();
        assert_eq!(report.breakdown.len(), 4);

        let expected: f64 = report
            .breakdown
            .iter()
            .map(|m| m.weight * f64::from(m.score))
            .sum();
        assert_eq!(report.score, expected.round().clamp(0.0, 100.0) as u8);
        assert_eq!(report.risk_level, RiskLevel::from_score(report.score));
        assert!(report.top_tags.len() <= 6);
    }
}

#[test]
fn test_empty_modules_score_zero_without_evidence() {
    let engine = ScoringEngine::default();
    let inputs = ModuleInputs {
        identity: Some(IdentityInput::default()),
        social: Some(SocialInput::default()),
        wallet: Some(WalletInput::default()),
        liquidity: Some(LiquidityInput::default()),
        ..Default::default()
    };

    let report = engine.score(&inputs).unwrap();
    for module in &report.breakdown {
        assert_eq!(module.score, 0, "{}", module.name.as_str());
        assert!(module.evidence.is_empty());
    }
    assert_eq!(report.score, 0);
    assert_eq!(report.confidence, Confidence::Low);
    assert_eq!(report.risk_level, RiskLevel::Low);
}

#[test]
fn test_confidence_never_drops_as_fields_are_added() {
    let engine = ScoringEngine::default();
    let mut inputs = ModuleInputs::default();
    let mut last = engine.score(&inputs).unwrap().confidence;

    let steps: Vec<Box<dyn Fn(&mut ModuleInputs)>> = vec![
        Box::new(|i: &mut ModuleInputs| i.identity.get_or_insert_with(Default::default).account_age_days = Some(400)),
        Box::new(|i: &mut ModuleInputs| i.identity.get_or_insert_with(Default::default).domain_age_days = Some(400)),
        Box::new(|i: &mut ModuleInputs| i.identity.get_or_insert_with(Default::default).has_verification_links = Some(true)),
        Box::new(|i: &mut ModuleInputs| i.identity.get_or_insert_with(Default::default).links_consistent = Some(true)),
        Box::new(|i: &mut ModuleInputs| i.identity.get_or_insert_with(Default::default).team_anonymous = Some(false)),
        Box::new(|i: &mut ModuleInputs| i.identity.get_or_insert_with(Default::default).team_kyc = Some(true)),
        Box::new(|i: &mut ModuleInputs| i.social.get_or_insert_with(Default::default).engagement_rate_pct = Some(4.0)),
        Box::new(|i: &mut ModuleInputs| i.social.get_or_insert_with(Default::default).burst_posting_detected = Some(false)),
        Box::new(|i: &mut ModuleInputs| i.social.get_or_insert_with(Default::default).amplifier_cluster_size = Some(0)),
        Box::new(|i: &mut ModuleInputs| i.social.get_or_insert_with(Default::default).follower_growth_pct_per_day = Some(0.5)),
        Box::new(|i: &mut ModuleInputs| i.wallet.get_or_insert_with(Default::default).deployer_age_days = Some(900)),
        Box::new(|i: &mut ModuleInputs| i.wallet.get_or_insert_with(Default::default).funded_by_fresh_wallet = Some(false)),
        Box::new(|i: &mut ModuleInputs| i.wallet.get_or_insert_with(Default::default).team_exchange_deposits = Some(0)),
        Box::new(|i: &mut ModuleInputs| i.wallet.get_or_insert_with(Default::default).suspicious_flow_count = Some(0)),
        Box::new(|i: &mut ModuleInputs| i.wallet.get_or_insert_with(Default::default).flagged_associations = Some(0)),
        Box::new(|i: &mut ModuleInputs| i.liquidity.get_or_insert_with(Default::default).mint_authority_active = Some(false)),
        Box::new(|i: &mut ModuleInputs| i.liquidity.get_or_insert_with(Default::default).freeze_authority_active = Some(false)),
        Box::new(|i: &mut ModuleInputs| i.liquidity.get_or_insert_with(Default::default).honeypot_detected = Some(false)),
        Box::new(|i: &mut ModuleInputs| i.liquidity.get_or_insert_with(Default::default).creator_holding_pct = Some(1.0)),
        Box::new(|i: &mut ModuleInputs| i.liquidity.get_or_insert_with(Default::default).lp_locked_pct = Some(100.0)),
        Box::new(|i: &mut ModuleInputs| i.liquidity.get_or_insert_with(Default::default).lp_lock_days_remaining = Some(365)),
        Box::new(|i: &mut ModuleInputs| i.liquidity.get_or_insert_with(Default::default).recent_lp_withdrawal_pct = Some(0.0)),
        Box::new(|i: &mut ModuleInputs| i.liquidity.get_or_insert_with(Default::default).top10_holder_pct = Some(15.0)),
        Box::new(|i: &mut ModuleInputs| i.liquidity.get_or_insert_with(Default::default).largest_holder_pct = Some(3.0)),
        Box::new(|i: &mut ModuleInputs| i.liquidity.get_or_insert_with(Default::default).unlock_30d_pct = Some(0.0)),
        Box::new(|i: &mut ModuleInputs| i.liquidity.get_or_insert_with(Default::default).liquidity_usd = Some(5_000_000.0)),
        Box::new(|i: &mut ModuleInputs| i.liquidity.get_or_insert_with(Default::default).pool_changes_24h = Some(0)),
    ];
    assert_eq!(steps.len(), ModuleInputs::MAX_FIELDS);

    for step in steps {
        step(&mut inputs);
        let confidence = engine.score(&inputs).unwrap().confidence;
        assert!(confidence >= last);
        last = confidence;
    }
    assert_eq!(last, Confidence::High);
    assert_eq!(inputs.supplied_fields(), ModuleInputs::MAX_FIELDS);
}

#[test]
fn test_liquidity_red_flags_surface_as_tags() {
    let engine = ScoringEngine::default();
    let inputs = sample_inputs().remove(1);
    let report = engine.score(&inputs).unwrap();

    let liquidity = report.module(RiskModule::Liquidity).unwrap();
    assert!(liquidity.score >= 45);
    assert!(report.top_tags.iter().any(|t| t == "Mint authority active"));
    assert!(report.top_tags.iter().any(|t| t == "LP not locked"));
    // Liquidity alone is capped at its weight
    assert!(report.score <= 25);
}
