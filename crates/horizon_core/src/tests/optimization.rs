use crate::model::{
    AccountKind, AdultProfile, InvestmentAccount, McSettings, MarketAssumptions,
    SavingsOptimizationInput,
};
use crate::optimize_savings;
use crate::tests::capitalization::deterministic_market;

fn optimization_input(market: MarketAssumptions) -> SavingsOptimizationInput {
    SavingsOptimizationInput {
        adults: vec![AdultProfile {
            first_name: None,
            current_age: 45.0,
            retirement_age: 65.0,
            life_expectancy: Some(85.0),
        }],
        savings_phases: Vec::new(),
        investment_accounts: vec![InvestmentAccount {
            monthly_contribution: Some(1.0),
            ..InvestmentAccount::new(AccountKind::Pea, 0.0)
        }],
        market_assumptions: market,
        spending_profile: Vec::new(),
        target_monthly_income: 1_500.0,
        state_pension_monthly_income: 900.0,
        additional_income_streams: Vec::new(),
        tax_parameters: None,
        settings: McSettings {
            confidence_level: 0.9,
            tolerance_ratio: 0.05,
            max_iterations: 100,
            batch_size: 50,
        },
        max_probes: 24,
        target_final_capital: 200_000.0,
        capitalization_only: false,
        calculate_minimum_savings: true,
    }
}

#[test]
fn test_bisection_finds_sufficient_scale() {
    let input = optimization_input(deterministic_market(7.0));
    let result = optimize_savings(&input, 17).unwrap();

    assert!(!result.saturated);
    assert!(result.scale > 0.0);
    assert!(result.scale <= 512.0);
    assert!(result.recommended_monthly_savings > 0.0);

    // The chosen scale meets the target within the capital tolerance
    // (max(100, 5% of 200 000) = 10 000).
    assert!(
        result.residual_error >= -10_000.0,
        "residual error {}",
        result.residual_error
    );
    assert!(result.minimum_capital_at_retirement > 0.0);

    // Probes bracket then refine: every probed scale stays in [0, 512]
    // and the bracket endpoints appear among the steps.
    assert!(result.steps.len() >= 3);
    for step in &result.steps {
        assert!((0.0..=512.0).contains(&step.scale));
    }
    let probed_scales: Vec<f64> = result.steps.iter().map(|s| s.scale).collect();
    assert!(probed_scales.contains(&1.0));
    assert!(probed_scales.contains(&0.0));

    // Baseline curves reflect the real (unscaled) plan.
    assert!(result.retirement_results.is_some());
    assert!(!result.monte_carlo_result.monthly_percentiles.is_empty());
}

#[test]
fn test_funded_portfolio_with_zero_target_needs_no_savings() {
    let mut input = optimization_input(deterministic_market(7.0));
    input.investment_accounts = vec![InvestmentAccount::new(AccountKind::Cto, 10_000.0)];
    input.target_final_capital = 0.0;
    input.capitalization_only = true;

    let result = optimize_savings(&input, 5).unwrap();
    assert_eq!(result.scale, 0.0);
    assert_eq!(result.recommended_monthly_savings, 0.0);
    assert!(result.residual_error >= -100.0);
    assert!(!result.saturated);
    assert!(result.retirement_results.is_none());
}

#[test]
fn test_minimum_savings_disabled_reports_plan_as_entered() {
    let mut input = optimization_input(deterministic_market(7.0));
    input.investment_accounts[0].monthly_contribution = Some(250.0);
    input.calculate_minimum_savings = false;

    let result = optimize_savings(&input, 5).unwrap();
    assert_eq!(result.scale, 1.0);
    assert!((result.recommended_monthly_savings - 250.0).abs() < 1e-9);
    assert_eq!(result.steps.len(), 1);
}

#[test]
fn test_capitalization_only_ignores_depletion() {
    let mut input = optimization_input(deterministic_market(7.0));
    input.capitalization_only = true;
    input.target_final_capital = 50_000.0;

    let result = optimize_savings(&input, 29).unwrap();
    assert!(!result.saturated);
    assert!(result.retirement_results.is_none());
    // Deterministic accumulation: scaled contributions alone must reach
    // the target at retirement.
    assert!(result.minimum_capital_at_retirement >= 50_000.0 - 10_000.0);
}

#[test]
fn test_impossible_target_saturates() {
    let mut input = optimization_input(deterministic_market(7.0));
    // No contributions to scale: no multiple of zero funds anything.
    input.investment_accounts = vec![InvestmentAccount::new(AccountKind::Pea, 0.0)];
    input.target_final_capital = 1_000_000.0;
    input.capitalization_only = true;
    input.max_probes = 6;

    let result = optimize_savings(&input, 13).unwrap();
    assert!(result.saturated);
    assert_eq!(result.recommended_monthly_savings, 0.0);
    assert!(result.residual_error < 0.0);
}
