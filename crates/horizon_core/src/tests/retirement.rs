use crate::model::{
    AccountKind, AdultProfile, InvestmentAccount, McSettings, RetirementMonteCarloInput,
    SpendingPhase,
};
use crate::monte_carlo_retirement;
use crate::tests::capitalization::deterministic_market;

fn retiree(retirement_age: f64, life_expectancy: f64) -> AdultProfile {
    AdultProfile {
        first_name: None,
        current_age: retirement_age,
        retirement_age,
        life_expectancy: Some(life_expectancy),
    }
}

fn small_settings() -> McSettings {
    McSettings {
        max_iterations: 100,
        batch_size: 50,
        ..McSettings::default()
    }
}

fn livret_retiree(
    balance: f64,
    target_income: f64,
    pension: f64,
    life_expectancy: f64,
) -> RetirementMonteCarloInput {
    RetirementMonteCarloInput {
        adults: vec![retiree(65.0, life_expectancy)],
        investment_accounts: vec![InvestmentAccount {
            initial_cost_basis: Some(balance),
            ..InvestmentAccount::new(AccountKind::Livret, balance)
        }],
        market_assumptions: deterministic_market(7.0),
        spending_profile: Vec::new(),
        target_monthly_income: target_income,
        state_pension_monthly_income: pension,
        additional_income_streams: Vec::new(),
        tax_parameters: None,
        settings: small_settings(),
    }
}

#[test]
fn test_one_month_horizon_runs_exactly_one_step() {
    let input = livret_retiree(50_000.0, 1_000.0, 0.0, 65.0 + 1.0 / 12.0);
    let result = monte_carlo_retirement(&input, 3).unwrap();

    assert_eq!(result.monthly_percentiles.len(), 1);
    let only = &result.monthly_percentiles[0];
    // Livret withdrawals are untaxed: net equals the required income.
    assert!((only.monthly_net_withdrawal - 1_000.0).abs() < 0.1);
    assert!((only.cumulative_net_withdrawal - only.monthly_net_withdrawal).abs() < 1e-9);
}

#[test]
fn test_pension_covering_target_means_no_withdrawals() {
    let input = livret_retiree(50_000.0, 1_000.0, 1_500.0, 85.0);
    let result = monte_carlo_retirement(&input, 3).unwrap();

    assert!(result.taxes_by_kind.is_empty());
    assert_eq!(result.total_taxes, 0.0);
    for point in &result.monthly_percentiles {
        assert_eq!(point.monthly_net_withdrawal, 0.0);
    }

    // Untouched capital just compounds at the livret rate.
    let months = result.monthly_percentiles.len() as i32;
    let expected = 50_000.0 * (1.0_f64 + 0.015 / 12.0).powi(months);
    assert!((result.final_band.p50 - expected).abs() / expected < 1e-9);
}

#[test]
fn test_spending_phases_modulate_withdrawals() {
    let mut input = livret_retiree(500_000.0, 1_000.0, 0.0, 85.0);
    input.spending_profile = vec![SpendingPhase {
        label: None,
        from_age: 65.0,
        to_age: 70.0,
        spending_ratio: 1.5,
    }];
    let result = monte_carlo_retirement(&input, 3).unwrap();

    let early = &result.monthly_percentiles[0];
    assert!((early.monthly_net_withdrawal - 1_500.0).abs() < 0.1);
    // Past the phase the ratio falls back to 1.0.
    let late = &result.monthly_percentiles[100];
    assert!((late.monthly_net_withdrawal - 1_000.0).abs() < 0.1);
}

#[test]
fn test_taxed_mix_accumulates_breakdown_by_kind() {
    let input = RetirementMonteCarloInput {
        adults: vec![retiree(65.0, 85.0)],
        investment_accounts: vec![
            InvestmentAccount {
                opening_age: Some(50.0),
                initial_cost_basis: Some(100_000.0),
                ..InvestmentAccount::new(AccountKind::Pea, 200_000.0)
            },
            InvestmentAccount {
                initial_cost_basis: Some(80_000.0),
                ..InvestmentAccount::new(AccountKind::Cto, 100_000.0)
            },
        ],
        market_assumptions: deterministic_market(7.0),
        spending_profile: Vec::new(),
        target_monthly_income: 2_500.0,
        state_pension_monthly_income: 500.0,
        additional_income_streams: Vec::new(),
        tax_parameters: None,
        settings: small_settings(),
    };
    let result = monte_carlo_retirement(&input, 9).unwrap();

    let pea = result.taxes_by_kind.get(&AccountKind::Pea).unwrap();
    let cto = result.taxes_by_kind.get(&AccountKind::Cto).unwrap();

    // Mature PEA pays social contributions only; the CTO pays both.
    assert_eq!(pea.income_tax, 0.0);
    assert!(pea.social_contributions > 0.0);
    assert!(cto.income_tax > 0.0);
    assert!(cto.social_contributions > 0.0);

    assert!(
        (result.total_taxes
            - (result.total_income_tax + result.total_social_contributions))
            .abs()
            < 1e-9
    );
    assert!(result.total_income_tax > 0.0);

    // Withdrawal accounting reconciles: gross = net + taxes, per kind.
    for breakdown in result.taxes_by_kind.values() {
        let reconstructed =
            breakdown.net_withdrawal + breakdown.income_tax + breakdown.social_contributions;
        assert!((breakdown.gross_withdrawal - reconstructed).abs() < 1e-6);
        assert!(breakdown.capital_gain <= breakdown.gross_withdrawal + 1e-9);
    }
}

#[test]
fn test_depleting_portfolio_floors_at_zero() {
    // 20 years of 2 000/month from 50 000 exhausts the account quickly;
    // balances and percentile cuts must never go negative.
    let input = livret_retiree(50_000.0, 2_000.0, 0.0, 85.0);
    let result = monte_carlo_retirement(&input, 3).unwrap();

    for point in &result.monthly_percentiles {
        assert!(point.band.p5 >= 0.0);
        assert!(point.band.p50 >= 0.0);
    }
    assert!(result.final_band.p50 < 1.0);

    // Net withdrawals taper off as the account empties instead of going
    // negative or overshooting.
    let total_net: f64 = result
        .monthly_percentiles
        .iter()
        .map(|p| p.monthly_net_withdrawal)
        .sum();
    assert!(total_net <= 50_000.0 * 1.05);
}

#[test]
fn test_band_ordering_under_volatility() {
    let mut input = RetirementMonteCarloInput {
        adults: vec![retiree(65.0, 90.0)],
        investment_accounts: vec![InvestmentAccount {
            opening_age: Some(50.0),
            initial_cost_basis: Some(300_000.0),
            ..InvestmentAccount::new(AccountKind::Pea, 600_000.0)
        }],
        market_assumptions: crate::model::MarketAssumptions::default(),
        spending_profile: Vec::new(),
        target_monthly_income: 2_000.0,
        state_pension_monthly_income: 800.0,
        additional_income_streams: Vec::new(),
        tax_parameters: None,
        settings: small_settings(),
    };
    input.settings.max_iterations = 200;
    let result = monte_carlo_retirement(&input, 21).unwrap();

    let band = result.final_band;
    assert!(band.p5 <= band.p10);
    assert!(band.p10 <= band.p50);
    assert!(band.p50 <= band.p90);
    assert!(band.p90 <= band.p95);
    assert!(band.p5 >= 0.0);
    assert!(result.iterations >= 50);
}
