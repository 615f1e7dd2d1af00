mod accounts;
mod household;
mod inputs;
mod market;
mod results;

pub use accounts::{AccountKind, InvestmentAccount};
pub use household::{
    AdditionalIncome, AdultProfile, SavingsPhase, SpendingPhase, TaxParameters,
    additional_income_at, spending_ratio_at,
};
pub use inputs::{
    CapitalizationInput, McSettings, MonteCarloInput, RetirementMonteCarloInput,
    SavingsOptimizationInput,
};
pub use market::{AssetAssumption, AssetClass, MarketAssumptions};
pub use results::{
    ABERRANT_VALUE_CAP, CapitalizationPoint, CapitalizationResult, MonteCarloPoint,
    MonteCarloResult, PercentileBand, RetirementMonteCarloResult, RetirementPoint,
    RetirementScenarios, SimulationWarning, TaxBreakdown, WarningKind,
};
