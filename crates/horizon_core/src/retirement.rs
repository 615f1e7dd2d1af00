//! Monte Carlo retirement: decumulation paths with per-account taxation
//!
//! Each month a path computes the net income the portfolio must provide,
//! inverts it into a gross withdrawal through an iterative solver (the
//! account mix makes the effective tax rate path-dependent), debits the
//! accounts, then applies the sampled growth. Aberrant values never abort a
//! path: the affected month withdraws nothing, balances are clamped, and
//! the condition is reported once per run as a warning.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rustc_hash::FxHashMap;

use crate::capitalization::{AccountState, build_states};
use crate::driver::{self, PathSample};
use crate::error::Result;
use crate::model::{
    ABERRANT_VALUE_CAP, AccountKind, RetirementMonteCarloInput, RetirementMonteCarloResult,
    RetirementPoint, SimulationWarning, TaxBreakdown, TaxParameters, WarningKind,
    additional_income_at, spending_ratio_at,
};
use crate::progress::ProgressReporter;
use crate::returns::{ReturnSampler, account_net_return};
use crate::taxes::{WithdrawalTax, withdrawal_tax};

/// Initial effective-rate assumption seeding the solver.
const INITIAL_TAX_RATE_GUESS: f64 = 0.20;

/// Share of the total balance the solver may propose as gross.
const MAX_GROSS_BALANCE_SHARE: f64 = 0.99;

const SOLVER_MAX_ITERATIONS: usize = 10;

/// Absolute tolerance on the achieved net, in currency units.
const NET_ABSOLUTE_TOLERANCE: f64 = 0.1;

/// Relative overshoot tolerated once the target is covered.
const NET_RELATIVE_TOLERANCE: f64 = 0.01;

/// Reference-path auxiliary series kept for display.
#[derive(Debug, Default)]
struct RetirementAux {
    monthly_net: Vec<f64>,
    cumulative_net: Vec<f64>,
    taxes_by_kind: FxHashMap<AccountKind, TaxBreakdown>,
}

/// Result of solving one month's withdrawal.
struct WithdrawalPlan {
    /// `(account_index, tax_result)` pairs from the final solver iteration.
    per_account: Vec<(usize, WithdrawalTax)>,
    total_net: f64,
    anomaly: bool,
}

impl WithdrawalPlan {
    fn empty() -> Self {
        Self {
            per_account: Vec::new(),
            total_net: 0.0,
            anomaly: false,
        }
    }

    fn anomalous() -> Self {
        Self {
            anomaly: true,
            ..Self::empty()
        }
    }
}

/// Find the gross withdrawal whose after-tax proceeds cover `required_net`.
///
/// The shares are fixed from the entry balances; each iteration re-taxes
/// the per-account proposals, measures the achieved net, and adjusts the
/// gross estimate through the observed effective rate. The adjustment step
/// is clamped (60% of the estimate, 20% of the total balance) so one noisy
/// rate cannot launch the estimate into the tails.
fn solve_gross_withdrawal(
    states: &[AccountState],
    required_net: f64,
    current_age: f64,
    params: &TaxParameters,
) -> WithdrawalPlan {
    let total_balance: f64 = states.iter().map(AccountState::balance).sum();
    if required_net <= 0.0 || total_balance <= 0.0 {
        return WithdrawalPlan::empty();
    }

    let gross_cap = MAX_GROSS_BALANCE_SHARE * total_balance;
    let mut estimated_gross = (required_net / (1.0 - INITIAL_TAX_RATE_GUESS)).min(gross_cap);
    let shares: Vec<f64> = states
        .iter()
        .map(|state| state.balance() / total_balance)
        .collect();

    let mut per_account: Vec<(usize, WithdrawalTax)> = Vec::with_capacity(states.len());
    let mut total_net = 0.0;

    for _ in 0..SOLVER_MAX_ITERATIONS {
        per_account.clear();
        total_net = 0.0;

        for (index, state) in states.iter().enumerate() {
            if state.balance() <= 0.0 || shares[index] <= 0.0 {
                continue;
            }
            let gross = (shares[index] * estimated_gross).min(state.balance());
            let tax = withdrawal_tax(&state.tax, gross, current_age, params);
            total_net += tax.net_withdrawal;
            per_account.push((index, tax));
        }

        if !estimated_gross.is_finite()
            || !total_net.is_finite()
            || estimated_gross <= 0.0
            || total_net < 0.0
            || estimated_gross > ABERRANT_VALUE_CAP
            || total_net > ABERRANT_VALUE_CAP
        {
            return WithdrawalPlan::anomalous();
        }

        let shortfall = required_net - total_net;
        if shortfall.abs() < NET_ABSOLUTE_TOLERANCE
            || (total_net >= required_net
                && shortfall.abs() / required_net < NET_RELATIVE_TOLERANCE)
        {
            break;
        }

        let effective_rate = (1.0 - total_net / estimated_gross).clamp(0.0, 0.5);
        let step_cap = (0.6 * estimated_gross).min(0.2 * total_balance);
        let step = (shortfall / (1.0 - effective_rate)).clamp(-step_cap, step_cap);
        estimated_gross = (estimated_gross + step).min(gross_cap);
        if estimated_gross <= 0.0 {
            estimated_gross = 0.01;
        }
    }

    WithdrawalPlan {
        per_account,
        total_net,
        anomaly: false,
    }
}

/// Per-path flags ensuring a warning class is reported at most once.
#[derive(Default)]
struct PathWarnings {
    numeric_anomaly: Option<usize>,
    balance_cap: Option<usize>,
}

impl PathWarnings {
    fn into_warnings(self) -> Vec<SimulationWarning> {
        let mut warnings = Vec::new();
        if let Some(month) = self.numeric_anomaly {
            warnings.push(SimulationWarning {
                kind: WarningKind::NumericAnomaly,
                month_index: Some(month),
                message: "aberrant value in withdrawal solver; month skipped".to_string(),
            });
        }
        if let Some(month) = self.balance_cap {
            warnings.push(SimulationWarning {
                kind: WarningKind::BalanceCap,
                month_index: Some(month),
                message: "balance clamped at aberrant-value cap".to_string(),
            });
        }
        warnings
    }
}

/// One decumulation path from retirement age to life expectancy.
fn simulate_retirement_path(
    payload: &RetirementMonteCarloInput,
    total_months: usize,
    sampler: &ReturnSampler,
    seed: u64,
) -> PathSample<RetirementAux> {
    let retirement_age = payload.adults[0].retirement_age;
    let market = &payload.market_assumptions;
    let params = payload.tax_parameters.unwrap_or_default();

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut states = build_states(&payload.investment_accounts, retirement_age);

    let mut aux = RetirementAux {
        monthly_net: Vec::with_capacity(total_months),
        cumulative_net: Vec::with_capacity(total_months),
        taxes_by_kind: FxHashMap::default(),
    };
    let mut path_warnings = PathWarnings::default();
    let mut monthly_totals = Vec::with_capacity(total_months);
    let mut cumulative_net = 0.0;

    for month_index in 0..total_months {
        let age = retirement_age + month_index as f64 / 12.0;

        let required_net = (payload.target_monthly_income
            * spending_ratio_at(&payload.spending_profile, age)
            - payload.state_pension_monthly_income
            - additional_income_at(&payload.additional_income_streams, age))
        .max(0.0);

        let plan = solve_gross_withdrawal(&states, required_net, age, &params);
        if plan.anomaly && path_warnings.numeric_anomaly.is_none() {
            path_warnings.numeric_anomaly = Some(month_index + 1);
        }

        for (index, tax) in &plan.per_account {
            states[*index].tax.record_withdrawal(tax.gross_withdrawal);
            aux.taxes_by_kind
                .entry(states[*index].account.kind)
                .or_default()
                .absorb(tax);
        }

        cumulative_net += plan.total_net;
        aux.monthly_net.push(plan.total_net);
        aux.cumulative_net.push(cumulative_net);

        let sample = sampler.sample(&mut rng);
        for state in &mut states {
            if state.balance() <= 0.0 {
                continue;
            }
            let monthly_return = account_net_return(&state.account, &sample, market);
            state.tax.balance *= 1.0 + monthly_return;
            if state.tax.balance > ABERRANT_VALUE_CAP {
                state.tax.balance = ABERRANT_VALUE_CAP;
                if path_warnings.balance_cap.is_none() {
                    path_warnings.balance_cap = Some(month_index + 1);
                }
            }
        }

        monthly_totals.push(states.iter().map(AccountState::balance).sum());
    }

    PathSample {
        final_capital: states.iter().map(AccountState::balance).sum(),
        monthly_totals,
        aux,
        warnings: path_warnings.into_warnings(),
    }
}

/// Stochastic decumulation under the Monte Carlo driver.
pub fn monte_carlo_retirement(
    payload: &RetirementMonteCarloInput,
    seed: u64,
) -> Result<RetirementMonteCarloResult> {
    monte_carlo_retirement_with_progress(payload, seed, &ProgressReporter::disabled())
}

/// Same as [`monte_carlo_retirement`], reporting progress at batch
/// boundaries and honoring cancellation through the reporter.
pub fn monte_carlo_retirement_with_progress(
    payload: &RetirementMonteCarloInput,
    seed: u64,
    reporter: &ProgressReporter<'_>,
) -> Result<RetirementMonteCarloResult> {
    let (primary, total_months) = payload.validate()?;
    let retirement_age = primary.retirement_age;
    let settings = payload.settings.effective();

    let sampler = ReturnSampler::new(&payload.market_assumptions);
    let mut warnings = Vec::new();
    if sampler.uses_independent_draws() {
        warnings.push(SimulationWarning {
            kind: WarningKind::CovarianceFallback,
            month_index: None,
            message: "covariance matrix is not positive-definite; using independent draws"
                .to_string(),
        });
    }

    let outcome = driver::run_monte_carlo(&settings, seed, reporter, "retirement", |path_seed| {
        simulate_retirement_path(payload, total_months, &sampler, path_seed)
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
    let reference = outcome.reference.unwrap_or_default();
    let monthly_percentiles = bands
        .into_iter()
        .enumerate()
        .map(|(month, band)| RetirementPoint {
            month_index: month + 1,
            age: retirement_age + month as f64 / 12.0,
            monthly_net_withdrawal: reference.monthly_net.get(month).copied().unwrap_or(0.0),
            cumulative_net_withdrawal: reference.cumulative_net.get(month).copied().unwrap_or(0.0),
            band,
        })
        .collect();

    let total_income_tax: f64 = reference.taxes_by_kind.values().map(|t| t.income_tax).sum();
    let total_social_contributions: f64 = reference
        .taxes_by_kind
        .values()
        .map(|t| t.social_contributions)
        .sum();

    Ok(RetirementMonteCarloResult {
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
        taxes_by_kind: reference.taxes_by_kind,
        total_income_tax,
        total_social_contributions,
        total_taxes: total_income_tax + total_social_contributions,
        warnings,
    })
}

#[cfg(test)]
mod solver_tests {
    use super::*;
    use crate::model::{AccountKind, InvestmentAccount};

    fn single_pea(balance: f64, cost_basis: f64, opening_age: f64) -> Vec<AccountState> {
        let account = InvestmentAccount {
            opening_age: Some(opening_age),
            initial_cost_basis: Some(cost_basis),
            ..InvestmentAccount::new(AccountKind::Pea, balance)
        };
        build_states(&[account], 60.0)
    }

    #[test]
    fn test_zero_target_returns_immediately() {
        let states = single_pea(100_000.0, 50_000.0, 50.0);
        let plan = solve_gross_withdrawal(&states, 0.0, 60.0, &TaxParameters::default());
        assert!(plan.per_account.is_empty());
        assert_eq!(plan.total_net, 0.0);
        assert!(!plan.anomaly);
    }

    #[test]
    fn test_empty_portfolio_withdraws_nothing() {
        let states = single_pea(0.0, 0.0, 50.0);
        let plan = solve_gross_withdrawal(&states, 1_000.0, 60.0, &TaxParameters::default());
        assert!(plan.per_account.is_empty());
        assert_eq!(plan.total_net, 0.0);
    }

    #[test]
    fn test_mature_pea_converges_to_net_target() {
        // Gain ratio 0.5 and social contributions only: the net of a gross
        // g is g · (1 − 0.5 · 0.172), so 8 500 net needs g ≈ 9 299.78.
        let states = single_pea(100_000.0, 50_000.0, 50.0);
        let plan = solve_gross_withdrawal(&states, 8_500.0, 60.0, &TaxParameters::default());

        assert!(!plan.anomaly);
        assert!(
            (plan.total_net - 8_500.0).abs() < NET_ABSOLUTE_TOLERANCE,
            "net = {}",
            plan.total_net
        );

        let gross: f64 = plan.per_account.iter().map(|(_, t)| t.gross_withdrawal).sum();
        assert!((gross - 9_299.78).abs() < 1.0, "gross = {gross}");

        // Taxes reconcile with the achieved net.
        let taxes: f64 = plan
            .per_account
            .iter()
            .map(|(_, t)| t.income_tax + t.social_contributions)
            .sum();
        assert!((gross - taxes - plan.total_net).abs() < 1e-9);
    }

    #[test]
    fn test_target_beyond_portfolio_is_capped() {
        let states = single_pea(10_000.0, 10_000.0, 50.0);
        let plan = solve_gross_withdrawal(&states, 50_000.0, 60.0, &TaxParameters::default());

        let gross: f64 = plan.per_account.iter().map(|(_, t)| t.gross_withdrawal).sum();
        assert!(gross <= 10_000.0 * MAX_GROSS_BALANCE_SHARE + 1e-9);
        assert!(plan.total_net < 50_000.0);
    }

    #[test]
    fn test_shares_follow_balances() {
        let accounts = vec![
            InvestmentAccount {
                initial_cost_basis: Some(15_000.0),
                ..InvestmentAccount::new(AccountKind::Livret, 15_000.0)
            },
            InvestmentAccount {
                initial_cost_basis: Some(30_000.0),
                ..InvestmentAccount::new(AccountKind::Cto, 45_000.0)
            },
        ];
        let states = build_states(&accounts, 65.0);
        let plan = solve_gross_withdrawal(&states, 2_000.0, 65.0, &TaxParameters::default());

        assert_eq!(plan.per_account.len(), 2);
        let livret_gross = plan.per_account[0].1.gross_withdrawal;
        let cto_gross = plan.per_account[1].1.gross_withdrawal;
        // 25% / 75% balance split drives the proposals.
        assert!((cto_gross / livret_gross - 3.0).abs() < 1e-6);
    }
}
