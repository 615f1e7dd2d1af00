//! Criterion benchmarks for the horizon_core engine
//!
//! Run with: cargo bench -p horizon_core

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use horizon_core::model::{
    AccountKind, AdultProfile, CapitalizationInput, InvestmentAccount, MarketAssumptions,
    McSettings, MonteCarloInput, RetirementMonteCarloInput,
};
use horizon_core::returns::ReturnSampler;
use horizon_core::{monte_carlo_capitalization, monte_carlo_retirement, simulate_capitalization};

use rand::SeedableRng;
use rand::rngs::SmallRng;

fn household() -> Vec<AdultProfile> {
    vec![AdultProfile {
        first_name: None,
        current_age: 40.0,
        retirement_age: 65.0,
        life_expectancy: Some(90.0),
    }]
}

fn accounts() -> Vec<InvestmentAccount> {
    vec![
        InvestmentAccount {
            monthly_contribution: Some(500.0),
            opening_age: Some(35.0),
            ..InvestmentAccount::new(AccountKind::Pea, 30_000.0)
        },
        InvestmentAccount {
            monthly_contribution: Some(300.0),
            allocation_equities: Some(60.0),
            allocation_bonds: Some(30.0),
            ..InvestmentAccount::new(AccountKind::AssuranceVie, 50_000.0)
        },
        InvestmentAccount {
            monthly_contribution: Some(100.0),
            ..InvestmentAccount::new(AccountKind::Livret, 10_000.0)
        },
    ]
}

fn capitalization_input() -> CapitalizationInput {
    CapitalizationInput {
        adults: household(),
        savings_phases: Vec::new(),
        investment_accounts: accounts(),
        market_assumptions: MarketAssumptions::default(),
        tax_parameters: None,
    }
}

fn bench_return_sampler(c: &mut Criterion) {
    let sampler = ReturnSampler::new(&MarketAssumptions::default());
    let mut rng = SmallRng::seed_from_u64(42);

    c.bench_function("return_sampler_draw", |b| {
        b.iter(|| black_box(sampler.sample(&mut rng)));
    });
}

fn bench_deterministic_preview(c: &mut Criterion) {
    let input = capitalization_input();
    c.bench_function("deterministic_preview_25y", |b| {
        b.iter(|| black_box(simulate_capitalization(&input).unwrap()));
    });
}

fn bench_monte_carlo_capitalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("monte_carlo_capitalization");
    group.sample_size(10);

    for iterations in [100, 500] {
        let input = MonteCarloInput {
            scenario: capitalization_input(),
            settings: McSettings {
                tolerance_ratio: 1e-4,
                max_iterations: iterations,
                batch_size: iterations,
                ..McSettings::default()
            },
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(iterations),
            &input,
            |b, input| b.iter(|| black_box(monte_carlo_capitalization(input, 42).unwrap())),
        );
    }
    group.finish();
}

fn bench_monte_carlo_retirement(c: &mut Criterion) {
    let input = RetirementMonteCarloInput {
        adults: household(),
        investment_accounts: accounts()
            .into_iter()
            .map(|account| InvestmentAccount {
                current_balance: 200_000.0,
                monthly_contribution: Some(0.0),
                ..account
            })
            .collect(),
        market_assumptions: MarketAssumptions::default(),
        spending_profile: Vec::new(),
        target_monthly_income: 3_000.0,
        state_pension_monthly_income: 1_200.0,
        additional_income_streams: Vec::new(),
        tax_parameters: None,
        settings: McSettings {
            tolerance_ratio: 1e-4,
            max_iterations: 200,
            batch_size: 200,
            ..McSettings::default()
        },
    };

    let mut group = c.benchmark_group("monte_carlo_retirement");
    group.sample_size(10);
    group.bench_function("200_paths_25y", |b| {
        b.iter(|| black_box(monte_carlo_retirement(&input, 42).unwrap()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_return_sampler,
    bench_deterministic_preview,
    bench_monte_carlo_capitalization,
    bench_monte_carlo_retirement
);
criterion_main!(benches);
