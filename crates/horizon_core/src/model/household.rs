//! Household profiles: adults, savings/spending phases, extra incomes
//!
//! Ages are fractional years throughout; the simulation advances them by
//! 1/12 per step. The first adult of a payload is the primary profile whose
//! ages bound the simulation horizons.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdultProfile {
    #[serde(default)]
    pub first_name: Option<String>,
    pub current_age: f64,
    pub retirement_age: f64,
    #[serde(default)]
    pub life_expectancy: Option<f64>,
}

/// Declared savings period.
///
/// Phases are display metadata: the plan is funded solely by the explicit
/// per-account contributions, and the optimizer scales only those. Phases
/// stay in the input shape so callers can round-trip them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsPhase {
    #[serde(default)]
    pub label: Option<String>,
    pub from_age: f64,
    pub to_age: f64,
    pub monthly_contribution: f64,
}

/// Spending multiplier applied to the target income over an age range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingPhase {
    #[serde(default)]
    pub label: Option<String>,
    pub from_age: f64,
    pub to_age: f64,
    pub spending_ratio: f64,
}

/// Extra monthly income that starts at a given age and never stops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalIncome {
    #[serde(default)]
    pub label: Option<String>,
    pub monthly_amount: f64,
    /// Missing start age means the income is always active.
    #[serde(default)]
    pub start_age: Option<f64>,
}

/// Household-level tax parameters.
///
/// The marginal rates are accepted for forward compatibility with
/// progressive-scale regimes but are not used by the current flat-tax
/// rules; `is_couple` selects the assurance-vie abatement.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TaxParameters {
    #[serde(default)]
    pub tmi_savings_phase: Option<f64>,
    #[serde(default)]
    pub tmi_retirement_phase: Option<f64>,
    #[serde(default)]
    pub is_couple: bool,
}

/// Spending ratio at an age: the first covering phase wins, 1.0 when no
/// phase covers the age.
#[must_use]
pub fn spending_ratio_at(profile: &[SpendingPhase], age: f64) -> f64 {
    for phase in profile {
        if phase.from_age <= age && age <= phase.to_age {
            return phase.spending_ratio.max(0.0);
        }
    }
    1.0
}

/// Total monthly amount of the additional incomes active at an age.
#[must_use]
pub fn additional_income_at(incomes: &[AdditionalIncome], age: f64) -> f64 {
    incomes
        .iter()
        .filter(|income| income.start_age.is_none_or(|start| age >= start))
        .map(|income| income.monthly_amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spending_ratio_defaults_to_one() {
        let profile = vec![SpendingPhase {
            label: None,
            from_age: 65.0,
            to_age: 75.0,
            spending_ratio: 1.2,
        }];
        assert_eq!(spending_ratio_at(&profile, 70.0), 1.2);
        assert_eq!(spending_ratio_at(&profile, 80.0), 1.0);
        assert_eq!(spending_ratio_at(&[], 70.0), 1.0);
    }

    #[test]
    fn test_additional_income_activation() {
        let incomes = vec![
            AdditionalIncome {
                label: None,
                monthly_amount: 300.0,
                start_age: Some(70.0),
            },
            AdditionalIncome {
                label: None,
                monthly_amount: 100.0,
                start_age: None,
            },
        ];
        assert_eq!(additional_income_at(&incomes, 65.0), 100.0);
        assert_eq!(additional_income_at(&incomes, 70.0), 400.0);
    }
}
