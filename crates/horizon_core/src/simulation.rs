//! Monte Carlo capitalization: stochastic accumulation paths under the
//! batched driver
//!
//! One path walks the months from the current age to retirement, funding
//! accounts from their explicit contributions, then growing each balance
//! with its sampled net return. The driver layers batching, confidence
//! control and percentile aggregation on top.

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::capitalization::{
    AccountState, active_monthly_contribution, build_states, distribute_contributions,
};
use crate::driver::{self, PathSample};
use crate::error::Result;
use crate::model::{
    MonteCarloInput, MonteCarloPoint, MonteCarloResult, SimulationWarning, WarningKind,
};
use crate::progress::ProgressReporter;
use crate::returns::{ReturnSampler, account_net_return};

/// One accumulation path. Returns the cumulative-contribution series as the
/// auxiliary data (initial capital counts as contributed).
fn simulate_accumulation_path(
    payload: &MonteCarloInput,
    total_months: usize,
    sampler: &ReturnSampler,
    seed: u64,
) -> PathSample<Vec<f64>> {
    let scenario = &payload.scenario;
    let current_age = scenario.adults[0].current_age;
    let market = &scenario.market_assumptions;

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut states = build_states(&scenario.investment_accounts, current_age);

    let mut monthly_totals = Vec::with_capacity(total_months);
    let mut monthly_contributions = Vec::with_capacity(total_months);
    let mut cumulative_contribution: f64 = states.iter().map(AccountState::balance).sum();

    for _month in 0..total_months {
        let active = active_monthly_contribution(&states);
        let contributions = distribute_contributions(&states, active);

        let sample = sampler.sample(&mut rng);

        for (state, contribution) in states.iter_mut().zip(&contributions) {
            if *contribution > 0.0 {
                state.tax.record_contribution(*contribution);
                cumulative_contribution += contribution;
            }

            let monthly_return = account_net_return(&state.account, &sample, market);
            state.tax.balance *= 1.0 + monthly_return;
        }

        monthly_totals.push(states.iter().map(AccountState::balance).sum());
        monthly_contributions.push(cumulative_contribution);
    }

    PathSample {
        final_capital: monthly_totals.last().copied().unwrap_or(cumulative_contribution),
        monthly_totals,
        aux: monthly_contributions,
        warnings: Vec::new(),
    }
}

/// Stochastic accumulation under the Monte Carlo driver.
pub fn monte_carlo_capitalization(payload: &MonteCarloInput, seed: u64) -> Result<MonteCarloResult> {
    monte_carlo_capitalization_with_progress(payload, seed, &ProgressReporter::disabled())
}

/// Same as [`monte_carlo_capitalization`], reporting progress at batch
/// boundaries and honoring cancellation through the reporter.
pub fn monte_carlo_capitalization_with_progress(
    payload: &MonteCarloInput,
    seed: u64,
    reporter: &ProgressReporter<'_>,
) -> Result<MonteCarloResult> {
    let (primary, total_months) = payload.scenario.validate()?;
    let start_age = primary.current_age;
    let settings = payload.settings.effective();

    let sampler = ReturnSampler::new(&payload.scenario.market_assumptions);
    let mut warnings = Vec::new();
    if sampler.uses_independent_draws() {
        warnings.push(SimulationWarning {
            kind: WarningKind::CovarianceFallback,
            month_index: None,
            message: "covariance matrix is not positive-definite; using independent draws"
                .to_string(),
        });
    }

    let outcome = driver::run_monte_carlo(&settings, seed, reporter, "capitalization", |path_seed| {
        simulate_accumulation_path(payload, total_months, &sampler, path_seed)
    });
    let iterations = outcome.iterations();
    let confidence_reached = outcome.confidence.reached;
    warnings.extend(outcome.warnings);

    let stats = driver::final_stats(
        &outcome.finals,
        settings.confidence_level,
        settings.tolerance_ratio,
    );

    let bands = driver::monthly_bands(&outcome.paths, total_months);
    let contributions = outcome.reference.unwrap_or_default();
    let monthly_percentiles = bands
        .into_iter()
        .enumerate()
        .map(|(month, band)| MonteCarloPoint {
            month_index: month + 1,
            age: start_age + month as f64 / 12.0,
            band,
            cumulative_contribution: contributions.get(month).copied().unwrap_or(0.0),
        })
        .collect();

    Ok(MonteCarloResult {
        iterations,
        confidence_level: settings.confidence_level,
        tolerance_ratio: settings.tolerance_ratio,
        confidence_reached,
        error_margin: stats.confidence.margin,
        error_margin_ratio: stats.confidence.margin_ratio,
        mean_final_capital: stats.mean,
        standard_deviation: stats.std_dev,
        final_band: stats.band,
        monthly_percentiles,
        warnings,
    })
}
