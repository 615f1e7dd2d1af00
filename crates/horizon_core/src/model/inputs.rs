//! Entry-point payloads and Monte Carlo settings

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::{
    AdditionalIncome, AdultProfile, InvestmentAccount, MarketAssumptions, SavingsPhase,
    SpendingPhase, TaxParameters,
};

/// Monte Carlo convergence knobs.
///
/// Out-of-range values are clamped by [`McSettings::effective`] rather than
/// rejected, so a persisted payload from an older caller still runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct McSettings {
    /// Coverage probability of the stopping interval, in [0.5, 0.999].
    pub confidence_level: f64,
    /// Relative half-width that stops sampling, in [1e-4, 0.5].
    pub tolerance_ratio: f64,
    /// Hard ceiling on the number of paths.
    pub max_iterations: usize,
    /// Paths per batch; confidence is checked at batch boundaries.
    pub batch_size: usize,
}

impl Default for McSettings {
    fn default() -> Self {
        Self {
            confidence_level: 0.9,
            tolerance_ratio: 0.05,
            max_iterations: 20_000,
            batch_size: 500,
        }
    }
}

impl McSettings {
    #[must_use]
    pub fn effective(self) -> Self {
        Self {
            confidence_level: self.confidence_level.clamp(0.5, 0.999),
            tolerance_ratio: self.tolerance_ratio.clamp(1e-4, 0.5),
            max_iterations: self.max_iterations.max(10),
            batch_size: self.batch_size.max(10),
        }
    }

    #[must_use]
    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }
}

/// Input of the deterministic capitalization preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalizationInput {
    pub adults: Vec<AdultProfile>,
    #[serde(default)]
    pub savings_phases: Vec<SavingsPhase>,
    pub investment_accounts: Vec<InvestmentAccount>,
    #[serde(default)]
    pub market_assumptions: MarketAssumptions,
    #[serde(default)]
    pub tax_parameters: Option<TaxParameters>,
}

impl CapitalizationInput {
    /// Primary adult and accumulation horizon in months.
    pub(crate) fn validate(&self) -> Result<(&AdultProfile, usize)> {
        let primary = self.adults.first().ok_or(EngineError::MissingAdultProfile)?;
        if primary.retirement_age <= primary.current_age {
            return Err(EngineError::RetirementBeforeCurrentAge {
                current_age: primary.current_age,
                retirement_age: primary.retirement_age,
            });
        }
        validate_accounts(&self.investment_accounts)?;
        let total_months = months_between(primary.current_age, primary.retirement_age);
        if total_months == 0 {
            return Err(EngineError::EmptyHorizon);
        }
        Ok((primary, total_months))
    }
}

/// Input of the stochastic capitalization simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloInput {
    #[serde(flatten)]
    pub scenario: CapitalizationInput,
    #[serde(default)]
    pub settings: McSettings,
}

/// Input of the retirement (decumulation) simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementMonteCarloInput {
    pub adults: Vec<AdultProfile>,
    pub investment_accounts: Vec<InvestmentAccount>,
    #[serde(default)]
    pub market_assumptions: MarketAssumptions,
    #[serde(default)]
    pub spending_profile: Vec<SpendingPhase>,
    pub target_monthly_income: f64,
    #[serde(default)]
    pub state_pension_monthly_income: f64,
    #[serde(default)]
    pub additional_income_streams: Vec<AdditionalIncome>,
    #[serde(default)]
    pub tax_parameters: Option<TaxParameters>,
    #[serde(default)]
    pub settings: McSettings,
}

impl RetirementMonteCarloInput {
    /// Primary adult and decumulation horizon in months.
    pub(crate) fn validate(&self) -> Result<(&AdultProfile, usize)> {
        let primary = self.adults.first().ok_or(EngineError::MissingAdultProfile)?;
        let life_expectancy = primary.life_expectancy.filter(|le| *le > primary.retirement_age);
        let Some(life_expectancy) = life_expectancy else {
            return Err(EngineError::LifeExpectancyBeforeRetirement {
                retirement_age: primary.retirement_age,
                life_expectancy: primary.life_expectancy,
            });
        };
        validate_accounts(&self.investment_accounts)?;
        if self.target_monthly_income < 0.0 {
            return Err(EngineError::NegativeAmount {
                field: "target_monthly_income",
                value: self.target_monthly_income,
            });
        }
        if self.state_pension_monthly_income < 0.0 {
            return Err(EngineError::NegativeAmount {
                field: "state_pension_monthly_income",
                value: self.state_pension_monthly_income,
            });
        }
        let total_months = months_between(primary.retirement_age, life_expectancy);
        if total_months == 0 {
            return Err(EngineError::EmptyHorizon);
        }
        Ok((primary, total_months))
    }
}

/// Input of the savings optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsOptimizationInput {
    pub adults: Vec<AdultProfile>,
    #[serde(default)]
    pub savings_phases: Vec<SavingsPhase>,
    pub investment_accounts: Vec<InvestmentAccount>,
    #[serde(default)]
    pub market_assumptions: MarketAssumptions,
    #[serde(default)]
    pub spending_profile: Vec<SpendingPhase>,
    #[serde(default)]
    pub target_monthly_income: f64,
    #[serde(default)]
    pub state_pension_monthly_income: f64,
    #[serde(default)]
    pub additional_income_streams: Vec<AdditionalIncome>,
    #[serde(default)]
    pub tax_parameters: Option<TaxParameters>,
    /// Inner Monte Carlo settings; `max_iterations` is the full per-run
    /// budget targeted by the adaptive ramp.
    #[serde(default = "optimizer_settings")]
    pub settings: McSettings,
    /// Bisection probe ceiling.
    #[serde(default = "default_max_probes")]
    pub max_probes: usize,
    /// Capital to hold at the end of life.
    #[serde(default)]
    pub target_final_capital: f64,
    /// Skip the decumulation phase entirely.
    #[serde(default)]
    pub capitalization_only: bool,
    /// When false, skip the search and report the plan as entered.
    #[serde(default = "default_true")]
    pub calculate_minimum_savings: bool,
}

/// Whole months in an age span, tolerant of the binary representation of
/// twelfths (65 + 1/12 must yield exactly one month).
fn months_between(from_age: f64, to_age: f64) -> usize {
    (((to_age - from_age) * 12.0) + 1e-9).floor().max(0.0) as usize
}

fn optimizer_settings() -> McSettings {
    McSettings {
        tolerance_ratio: 0.01,
        ..McSettings::default()
    }
}

fn default_max_probes() -> usize {
    20
}

fn default_true() -> bool {
    true
}

impl SavingsOptimizationInput {
    pub(crate) fn validate(&self) -> Result<()> {
        let accumulation = CapitalizationInput {
            adults: self.adults.clone(),
            savings_phases: self.savings_phases.clone(),
            investment_accounts: self.investment_accounts.clone(),
            market_assumptions: self.market_assumptions.clone(),
            tax_parameters: self.tax_parameters,
        };
        accumulation.validate()?;
        if !self.capitalization_only {
            self.retirement_input(self.investment_accounts.clone(), self.settings)
                .validate()?;
        }
        Ok(())
    }

    /// Retirement payload sharing this optimization's household and market.
    pub(crate) fn retirement_input(
        &self,
        investment_accounts: Vec<InvestmentAccount>,
        settings: McSettings,
    ) -> RetirementMonteCarloInput {
        RetirementMonteCarloInput {
            adults: self.adults.clone(),
            investment_accounts,
            market_assumptions: self.market_assumptions.clone(),
            spending_profile: self.spending_profile.clone(),
            target_monthly_income: self.target_monthly_income,
            state_pension_monthly_income: self.state_pension_monthly_income,
            additional_income_streams: self.additional_income_streams.clone(),
            tax_parameters: self.tax_parameters,
            settings,
        }
    }
}

fn validate_accounts(accounts: &[InvestmentAccount]) -> Result<()> {
    for account in accounts {
        if account.current_balance < 0.0 {
            return Err(EngineError::NegativeAmount {
                field: "current_balance",
                value: account.current_balance,
            });
        }
        if let Some(contribution) = account.monthly_contribution
            && contribution < 0.0
        {
            return Err(EngineError::NegativeAmount {
                field: "monthly_contribution",
                value: contribution,
            });
        }
    }
    Ok(())
}
