//! Deterministic capitalization preview and shared contribution plumbing
//!
//! The preview walks the accumulation months with expected returns only (no
//! draws), which makes it cheap enough for interactive use while staying
//! structurally identical to the stochastic accumulation path.
//!
//! Contribution semantics: the funded total each month is the sum of the
//! explicit per-account amounts. Savings phases are accepted in the input
//! for display purposes but never add to that total.

use crate::error::Result;
use crate::model::{CapitalizationInput, CapitalizationPoint, CapitalizationResult, InvestmentAccount};
use crate::returns::account_net_expected_return;
use crate::taxes::{AccountTaxState, check_deposit_limit};

/// Per-account simulation state: the immutable configuration plus the
/// path-owned fiscal state (which carries the live balance).
#[derive(Debug, Clone)]
pub(crate) struct AccountState {
    pub account: InvestmentAccount,
    pub tax: AccountTaxState,
}

impl AccountState {
    pub(crate) fn new(account: &InvestmentAccount, current_age: f64) -> Self {
        Self {
            account: account.clone(),
            tax: AccountTaxState::new(account, current_age),
        }
    }

    pub(crate) fn balance(&self) -> f64 {
        self.tax.balance
    }
}

pub(crate) fn build_states(accounts: &[InvestmentAccount], current_age: f64) -> Vec<AccountState> {
    accounts
        .iter()
        .map(|account| AccountState::new(account, current_age))
        .collect()
}

/// Funded monthly total: the sum of explicit per-account contributions.
pub(crate) fn active_monthly_contribution(states: &[AccountState]) -> f64 {
    states.iter().map(|state| state.account.contribution()).sum()
}

/// Split a monthly total across accounts.
///
/// Preference order: explicit per-account amounts (pro-rated down when the
/// total is smaller than their sum), then share percentages, then an equal
/// split across accounts whose ceiling is not reached. Every candidate
/// passes the deposit-limit check; overflow is dropped, not redistributed.
pub(crate) fn distribute_contributions(states: &[AccountState], total: f64) -> Vec<f64> {
    if states.is_empty() {
        return Vec::new();
    }
    if total <= 0.0 {
        return vec![0.0; states.len()];
    }

    let explicit: Vec<f64> = states
        .iter()
        .map(|state| state.account.contribution())
        .collect();
    let explicit_total: f64 = explicit.iter().sum();

    let proposed: Vec<f64> = if explicit_total > 0.0 {
        // Never fund more than the accounts themselves declare.
        let scale = total.min(explicit_total) / explicit_total;
        explicit.iter().map(|amount| amount * scale).collect()
    } else {
        let share_total: f64 = states
            .iter()
            .map(|state| state.account.monthly_contribution_share.unwrap_or(0.0))
            .sum();
        if share_total > 0.0 {
            states
                .iter()
                .map(|state| {
                    total * state.account.monthly_contribution_share.unwrap_or(0.0) / share_total
                })
                .collect()
        } else {
            let eligible: Vec<bool> = states
                .iter()
                .map(|state| check_deposit_limit(state.account.kind, state.balance(), 1.0).0)
                .collect();
            let count = eligible.iter().filter(|e| **e).count();
            if count == 0 {
                return vec![0.0; states.len()];
            }
            let equal = total / count as f64;
            eligible
                .iter()
                .map(|open| if *open { equal } else { 0.0 })
                .collect()
        }
    };

    states
        .iter()
        .zip(&proposed)
        .map(|(state, &amount)| {
            if amount <= 0.0 {
                return 0.0;
            }
            let (accepted, allowed) =
                check_deposit_limit(state.account.kind, state.balance(), amount);
            if accepted { amount.min(allowed) } else { 0.0 }
        })
        .collect()
}

/// Deterministic month-by-month accumulation from the current age to
/// retirement, using expected net returns only.
pub fn simulate_capitalization(payload: &CapitalizationInput) -> Result<CapitalizationResult> {
    let (primary, total_months) = payload.validate()?;

    let mut states = build_states(&payload.investment_accounts, primary.current_age);
    let start_capital: f64 = states.iter().map(AccountState::balance).sum();

    let mut total_contributions = 0.0;
    let mut total_gains = 0.0;
    let mut monthly_series = Vec::with_capacity(total_months);

    for month_index in 0..total_months {
        let age = primary.current_age + month_index as f64 / 12.0;
        let active = active_monthly_contribution(&states);
        let contributions = distribute_contributions(&states, active);

        let mut month_contribution = 0.0;
        let mut month_gain = 0.0;

        for (state, contribution) in states.iter_mut().zip(&contributions) {
            if *contribution > 0.0 {
                state.tax.record_contribution(*contribution);
                month_contribution += contribution;
            }

            let monthly_return =
                account_net_expected_return(&state.account, &payload.market_assumptions);
            let gain = state.tax.balance * monthly_return;
            state.tax.balance += gain;
            month_gain += gain;
        }

        total_contributions += month_contribution;
        total_gains += month_gain;

        monthly_series.push(CapitalizationPoint {
            month_index: month_index + 1,
            age,
            contributions: month_contribution,
            gains: month_gain,
            total_capital: states.iter().map(AccountState::balance).sum(),
        });
    }

    Ok(CapitalizationResult {
        start_capital,
        end_capital: states.iter().map(AccountState::balance).sum(),
        total_contributions,
        total_gains,
        monthly_series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountKind;

    fn states_of(accounts: Vec<InvestmentAccount>) -> Vec<AccountState> {
        build_states(&accounts, 40.0)
    }

    #[test]
    fn test_explicit_amounts_pro_rated_down() {
        let states = states_of(vec![
            InvestmentAccount {
                monthly_contribution: Some(300.0),
                ..InvestmentAccount::new(AccountKind::Pea, 0.0)
            },
            InvestmentAccount {
                monthly_contribution: Some(100.0),
                ..InvestmentAccount::new(AccountKind::Cto, 0.0)
            },
        ]);

        let split = distribute_contributions(&states, 200.0);
        assert!((split[0] - 150.0).abs() < 1e-9);
        assert!((split[1] - 50.0).abs() < 1e-9);

        // A larger pool never funds beyond the declared amounts.
        let split = distribute_contributions(&states, 1_000.0);
        assert!((split[0] - 300.0).abs() < 1e-9);
        assert!((split[1] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_share_percentages_used_without_explicit_amounts() {
        let states = states_of(vec![
            InvestmentAccount {
                monthly_contribution_share: Some(75.0),
                ..InvestmentAccount::new(AccountKind::Pea, 0.0)
            },
            InvestmentAccount {
                monthly_contribution_share: Some(25.0),
                ..InvestmentAccount::new(AccountKind::Cto, 0.0)
            },
        ]);

        let split = distribute_contributions(&states, 400.0);
        assert!((split[0] - 300.0).abs() < 1e-9);
        assert!((split[1] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_equal_split_skips_full_accounts() {
        let states = states_of(vec![
            InvestmentAccount::new(AccountKind::Livret, 22_950.0),
            InvestmentAccount::new(AccountKind::Cto, 0.0),
        ]);

        let split = distribute_contributions(&states, 500.0);
        assert_eq!(split[0], 0.0);
        assert!((split[1] - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_ceiling_overflow_is_dropped() {
        let states = states_of(vec![InvestmentAccount {
            monthly_contribution: Some(1_000.0),
            ..InvestmentAccount::new(AccountKind::Livret, 22_500.0)
        }]);

        let split = distribute_contributions(&states, 1_000.0);
        assert!((split[0] - 450.0).abs() < 1e-9);
    }
}
