//! Optimization result types

use serde::{Deserialize, Serialize};

use crate::model::{MonteCarloResult, RetirementScenarios};

/// One probe of the bisection, in evaluation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationStep {
    pub iteration: usize,
    pub scale: f64,
    /// Total scaled monthly savings across accounts.
    pub monthly_savings: f64,
    /// Median end-of-life capital (before the depletion penalty).
    pub final_capital: f64,
    pub effective_final_capital: f64,
    /// Months between median depletion and the horizon; 0 when the median
    /// path never empties.
    pub depletion_months: usize,
}

/// Final recommendation of the savings optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedSavingsResult {
    /// Smallest sufficient uniform scale on the per-account contributions.
    pub scale: f64,
    pub recommended_monthly_savings: f64,
    /// Median capital at retirement under the chosen scale.
    pub minimum_capital_at_retirement: f64,
    /// Baseline accumulation curves (real contributions, scale 1).
    pub monte_carlo_result: MonteCarloResult,
    /// Baseline decumulation scenario curves; absent in
    /// capitalization-only mode.
    pub retirement_results: Option<RetirementScenarios>,
    pub steps: Vec<OptimizationStep>,
    /// Effective final capital minus the target.
    pub residual_error: f64,
    pub residual_error_ratio: f64,
    /// True when bracketing exhausted its attempts without finding a
    /// sufficient scale; the result is then the best-effort candidate.
    pub saturated: bool,
}
