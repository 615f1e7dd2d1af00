//! Scale evaluation: one full accumulation + decumulation measurement
//!
//! Evaluating a scale runs the accumulation Monte Carlo with scaled
//! contributions, seeds three decumulation clusters from the accumulation
//! percentiles (pessimistic / median / optimistic starting capital), and
//! scores the outcome against the target with a penalty for median paths
//! that deplete before the horizon.

use crate::driver::derive_path_seed;
use crate::error::Result;
use crate::model::{
    CapitalizationInput, InvestmentAccount, McSettings, MonteCarloInput, MonteCarloResult,
    RetirementPoint, RetirementScenarios, SavingsOptimizationInput,
};
use crate::progress::ProgressReporter;
use crate::retirement::monte_carlo_retirement_with_progress;
use crate::simulation::monte_carlo_capitalization_with_progress;

/// Fallback penalty base when neither a target income nor a pension is set.
const DEFAULT_PENALTY_BASE: f64 = 1_000.0;

/// Everything measured about one scale.
#[derive(Debug, Clone)]
pub(crate) struct EvaluationOutcome {
    pub scale: f64,
    pub total_savings: f64,
    pub final_capital: f64,
    pub effective_final_capital: f64,
    /// `effective_final_capital - target_final_capital`.
    pub error: f64,
    pub depletion_months: usize,
    pub sufficient: bool,
    /// Inner Monte Carlo budget this outcome was measured with.
    pub mc_budget: usize,
    pub accumulation: MonteCarloResult,
    pub retirement: Option<RetirementScenarios>,
}

pub(crate) fn scale_accounts(
    accounts: &[InvestmentAccount],
    scale: f64,
) -> Vec<InvestmentAccount> {
    accounts
        .iter()
        .map(|account| account.with_scaled_contribution(scale))
        .collect()
}

/// Relative weights used to split a capital amount across accounts:
/// contribution first, then declared share, then current balance, then an
/// equal fallback.
pub(crate) fn account_weights(accounts: &[InvestmentAccount]) -> Vec<f64> {
    if accounts.is_empty() {
        return Vec::new();
    }

    let raw: Vec<f64> = accounts
        .iter()
        .map(|account| {
            let contribution = account.contribution();
            if contribution > 0.0 {
                return contribution;
            }
            let share = account.monthly_contribution_share.unwrap_or(0.0);
            if share > 0.0 {
                return share;
            }
            if account.current_balance > 0.0 {
                return account.current_balance;
            }
            1.0
        })
        .collect();

    let total: f64 = raw.iter().sum();
    if total <= 0.0 {
        return vec![1.0 / accounts.len() as f64; accounts.len()];
    }
    raw.into_iter().map(|weight| weight / total).collect()
}

/// Accounts holding `total_capital` split by weight, stripped of
/// contributions (nothing is funded during retirement).
pub(crate) fn build_retirement_accounts(
    accounts: &[InvestmentAccount],
    total_capital: f64,
) -> Vec<InvestmentAccount> {
    if total_capital <= 0.0 {
        return accounts
            .iter()
            .map(|account| InvestmentAccount {
                current_balance: 0.0,
                monthly_contribution: Some(0.0),
                monthly_contribution_share: Some(0.0),
                ..account.clone()
            })
            .collect();
    }

    let weights = account_weights(accounts);
    accounts
        .iter()
        .zip(&weights)
        .map(|(account, weight)| InvestmentAccount {
            current_balance: total_capital * weight,
            monthly_contribution: Some(0.0),
            monthly_contribution_share: Some(weight * 100.0),
            ..account.clone()
        })
        .collect()
}

/// Run the pessimistic / median / optimistic decumulation cluster from the
/// accumulation percentiles.
pub(crate) fn run_retirement_scenarios(
    payload: &SavingsOptimizationInput,
    scaled_accounts: &[InvestmentAccount],
    accumulation: &MonteCarloResult,
    settings: McSettings,
    seed: u64,
    reporter: &ProgressReporter<'_>,
) -> Result<RetirementScenarios> {
    let band = accumulation.final_band;
    let scenario = |starting_capital: f64, scenario_index: u64| {
        let accounts = build_retirement_accounts(scaled_accounts, starting_capital);
        let input = payload.retirement_input(accounts, settings);
        monte_carlo_retirement_with_progress(
            &input,
            derive_path_seed(seed, scenario_index),
            reporter,
        )
    };

    Ok(RetirementScenarios {
        pessimistic: scenario(band.p10, 0)?,
        median: scenario(band.p50, 1)?,
        optimistic: scenario(band.p90, 2)?,
    })
}

/// Months left at the first median depletion, 0 when the median path holds
/// to the horizon.
pub(crate) fn depletion_months(median_series: &[RetirementPoint]) -> usize {
    let Some(final_index) = median_series.len().checked_sub(1) else {
        return 0;
    };
    for (index, point) in median_series[..final_index].iter().enumerate() {
        if point.band.p50 <= 0.0 {
            return final_index - index;
        }
    }
    0
}

/// Evaluate one contribution scale with the given inner Monte Carlo budget.
pub(crate) fn evaluate_scale(
    payload: &SavingsOptimizationInput,
    scale: f64,
    mc_budget: usize,
    tolerance_capital: f64,
    seed: u64,
    reporter: &ProgressReporter<'_>,
) -> Result<EvaluationOutcome> {
    let scaled_accounts = scale_accounts(&payload.investment_accounts, scale);
    let total_savings: f64 = scaled_accounts
        .iter()
        .map(InvestmentAccount::contribution)
        .sum();

    let settings = payload.settings.with_max_iterations(mc_budget).effective();
    let mc_input = MonteCarloInput {
        scenario: CapitalizationInput {
            adults: payload.adults.clone(),
            savings_phases: payload.savings_phases.clone(),
            investment_accounts: scaled_accounts.clone(),
            market_assumptions: payload.market_assumptions.clone(),
            tax_parameters: payload.tax_parameters,
        },
        settings,
    };

    let accumulation =
        monte_carlo_capitalization_with_progress(&mc_input, derive_path_seed(seed, 0), reporter)?;

    let retirement = if payload.capitalization_only {
        None
    } else {
        Some(run_retirement_scenarios(
            payload,
            &scaled_accounts,
            &accumulation,
            settings,
            derive_path_seed(seed, 1),
            reporter,
        )?)
    };

    let final_capital = match &retirement {
        Some(scenarios) => scenarios.median.median_final_capital(),
        None => accumulation.median_final_capital(),
    };

    let depletion = match &retirement {
        Some(scenarios) => depletion_months(&scenarios.median.monthly_percentiles),
        None => 0,
    };

    let penalty = if depletion > 0 {
        let base = if payload.target_monthly_income > 0.0 {
            payload.target_monthly_income
        } else if payload.state_pension_monthly_income > 0.0 {
            payload.state_pension_monthly_income
        } else {
            DEFAULT_PENALTY_BASE
        };
        base.max(1.0) * depletion.max(1) as f64
    } else {
        0.0
    };

    let effective_final_capital = final_capital - penalty;
    let error = effective_final_capital - payload.target_final_capital;
    let sufficient =
        (depletion == 0 || payload.capitalization_only) && error >= -tolerance_capital;

    Ok(EvaluationOutcome {
        scale,
        total_savings,
        final_capital,
        effective_final_capital,
        error,
        depletion_months: depletion,
        sufficient,
        mc_budget,
        accumulation,
        retirement,
    })
}
