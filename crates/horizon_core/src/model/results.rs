//! Result types shared by the simulators, the driver and the optimizer

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::model::AccountKind;
use crate::stats;
use crate::taxes::WithdrawalTax;

/// Values at or above this magnitude are treated as aberrant: they are
/// clamped in the growth step and excluded from percentile aggregation.
pub const ABERRANT_VALUE_CAP: f64 = 1e12;

/// The five percentile cuts reported everywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentileBand {
    pub p5: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
}

impl PercentileBand {
    /// Nearest-rank cuts of an ascending-sorted sample.
    #[must_use]
    pub fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            p5: stats::percentile_from_sorted(sorted, 0.05),
            p10: stats::percentile_from_sorted(sorted, 0.10),
            p50: stats::percentile_from_sorted(sorted, 0.50),
            p90: stats::percentile_from_sorted(sorted, 0.90),
            p95: stats::percentile_from_sorted(sorted, 0.95),
        }
    }
}

/// One month of the deterministic capitalization preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalizationPoint {
    pub month_index: usize,
    pub age: f64,
    pub contributions: f64,
    pub gains: f64,
    pub total_capital: f64,
}

/// Deterministic capitalization preview output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalizationResult {
    pub start_capital: f64,
    pub end_capital: f64,
    pub total_contributions: f64,
    pub total_gains: f64,
    pub monthly_series: Vec<CapitalizationPoint>,
}

/// Non-fatal conditions encountered during a run, one entry per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// Covariance matrix was not positive-definite; the sampler fell back
    /// to independent draws.
    CovarianceFallback,
    /// NaN / negative / aberrant value in the withdrawal solver; the
    /// affected month withdrew nothing.
    NumericAnomaly,
    /// A balance hit the aberrant-value cap and was clamped.
    BalanceCap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationWarning {
    pub kind: WarningKind,
    /// Month of first occurrence, when tied to one.
    pub month_index: Option<usize>,
    pub message: String,
}

/// One month of the capitalization percentile trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloPoint {
    pub month_index: usize,
    pub age: f64,
    pub band: PercentileBand,
    /// Contributions accumulated so far on the reference path (initial
    /// capital included).
    pub cumulative_contribution: f64,
}

/// Aggregated output of the capitalization Monte Carlo run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub iterations: usize,
    pub confidence_level: f64,
    pub tolerance_ratio: f64,
    pub confidence_reached: bool,
    /// Absolute half-width of the mean confidence interval.
    pub error_margin: f64,
    /// Half-width relative to |mean|.
    pub error_margin_ratio: f64,
    pub mean_final_capital: f64,
    pub standard_deviation: f64,
    pub final_band: PercentileBand,
    pub monthly_percentiles: Vec<MonteCarloPoint>,
    pub warnings: Vec<SimulationWarning>,
}

impl MonteCarloResult {
    #[must_use]
    pub fn median_final_capital(&self) -> f64 {
        self.final_band.p50
    }
}

/// Withdrawal taxation totals for one account kind.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub gross_withdrawal: f64,
    pub capital_gain: f64,
    pub income_tax: f64,
    pub social_contributions: f64,
    pub net_withdrawal: f64,
}

impl TaxBreakdown {
    pub fn absorb(&mut self, tax: &WithdrawalTax) {
        self.gross_withdrawal += tax.gross_withdrawal;
        self.capital_gain += tax.capital_gain;
        self.income_tax += tax.income_tax;
        self.social_contributions += tax.social_contributions;
        self.net_withdrawal += tax.net_withdrawal;
    }
}

/// One month of the retirement percentile trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementPoint {
    pub month_index: usize,
    pub age: f64,
    /// Net income drawn from the portfolio this month on the reference path.
    pub monthly_net_withdrawal: f64,
    pub cumulative_net_withdrawal: f64,
    pub band: PercentileBand,
}

/// Aggregated output of the retirement Monte Carlo run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementMonteCarloResult {
    pub iterations: usize,
    pub confidence_level: f64,
    pub tolerance_ratio: f64,
    pub confidence_reached: bool,
    pub error_margin: f64,
    pub error_margin_ratio: f64,
    pub mean_final_capital: f64,
    pub standard_deviation: f64,
    pub final_band: PercentileBand,
    pub monthly_percentiles: Vec<RetirementPoint>,
    /// Whole-retirement taxation totals by account kind (reference path).
    pub taxes_by_kind: FxHashMap<AccountKind, TaxBreakdown>,
    pub total_income_tax: f64,
    pub total_social_contributions: f64,
    pub total_taxes: f64,
    pub warnings: Vec<SimulationWarning>,
}

impl RetirementMonteCarloResult {
    #[must_use]
    pub fn median_final_capital(&self) -> f64 {
        self.final_band.p50
    }
}

/// Decumulation runs seeded from the pessimistic / median / optimistic
/// capitalization outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementScenarios {
    pub pessimistic: RetirementMonteCarloResult,
    pub median: RetirementMonteCarloResult,
    pub optimistic: RetirementMonteCarloResult,
}
