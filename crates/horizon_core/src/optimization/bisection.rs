//! Bisection search for the minimum sufficient contribution scale
//!
//! The optimizer brackets the target by doubling the scale, then bisects,
//! spending few Monte Carlo iterations while the bracket is wide and the
//! full budget once it narrows. The chosen scale is re-measured once with
//! the full budget so the reported numbers are precise.

use crate::driver::derive_path_seed;
use crate::error::Result;
use crate::model::SavingsOptimizationInput;
use crate::progress::ProgressReporter;

use super::evaluator::{EvaluationOutcome, evaluate_scale};
use super::result::{OptimizationStep, RecommendedSavingsResult};

/// Doubling stops past this scale: needing more than 512× the entered
/// savings means the plan cannot be rescued by scaling alone.
const MAX_BRACKET_SCALE: f64 = 512.0;

const MAX_BRACKET_ATTEMPTS: usize = 12;

/// Bisection stops once the bracket is this narrow.
const MIN_BRACKET_WIDTH: f64 = 1e-4;

/// Floor on the inner Monte Carlo budget.
const MIN_MC_BUDGET: usize = 100;

/// Inner Monte Carlo budget for a probe, from the bracket-width ratio.
///
/// Wide brackets only need a coarse sufficiency signal; the budget ramps to
/// the full configuration as the bracket tightens.
fn adaptive_mc_budget(width_ratio: f64, full_budget: usize) -> usize {
    let full = full_budget.max(MIN_MC_BUDGET);
    if width_ratio > 0.5 {
        MIN_MC_BUDGET
    } else if width_ratio > 0.1 {
        (full / 8).clamp(MIN_MC_BUDGET, full)
    } else if width_ratio > 0.01 {
        (full / 2).clamp(MIN_MC_BUDGET, full)
    } else {
        full
    }
}

/// Probe bookkeeping: steps in evaluation order plus the running best
/// candidates.
struct Search<'a> {
    payload: &'a SavingsOptimizationInput,
    reporter: &'a ProgressReporter<'a>,
    root_seed: u64,
    tolerance_capital: f64,
    steps: Vec<OptimizationStep>,
    /// Fewest depletion months, then largest effective capital.
    best_candidate: Option<EvaluationOutcome>,
    /// Cheapest sufficient probe.
    best_sufficient: Option<EvaluationOutcome>,
}

impl Search<'_> {
    fn evaluate(&mut self, scale: f64, mc_budget: usize) -> Result<EvaluationOutcome> {
        let iteration = self.steps.len();
        let outcome = evaluate_scale(
            self.payload,
            scale,
            mc_budget,
            self.tolerance_capital,
            derive_path_seed(self.root_seed, iteration as u64),
            self.reporter,
        )?;

        self.steps.push(OptimizationStep {
            iteration,
            scale: outcome.scale,
            monthly_savings: outcome.total_savings,
            final_capital: outcome.final_capital,
            effective_final_capital: outcome.effective_final_capital,
            depletion_months: outcome.depletion_months,
        });
        self.reporter.report(
            "optimization",
            0.0,
            format!(
                "probe {iteration}: scale {:.4}, effective capital {:.0}",
                outcome.scale, outcome.effective_final_capital
            ),
            false,
        );

        self.register(&outcome);
        Ok(outcome)
    }

    fn register(&mut self, outcome: &EvaluationOutcome) {
        let better_candidate = match &self.best_candidate {
            None => true,
            Some(best) => {
                outcome.depletion_months < best.depletion_months
                    || (outcome.depletion_months == best.depletion_months
                        && outcome.effective_final_capital > best.effective_final_capital)
            }
        };
        if better_candidate {
            self.best_candidate = Some(outcome.clone());
        }

        if outcome.sufficient {
            let cheaper = match &self.best_sufficient {
                None => true,
                Some(best) => outcome.total_savings < best.total_savings,
            };
            if cheaper {
                self.best_sufficient = Some(outcome.clone());
            }
        }
    }
}

/// Find the smallest uniform scale on the per-account contributions whose
/// median outcome meets the target end-of-life capital.
pub fn optimize_savings(
    payload: &SavingsOptimizationInput,
    seed: u64,
) -> Result<RecommendedSavingsResult> {
    optimize_savings_with_progress(payload, seed, &ProgressReporter::disabled())
}

/// Same as [`optimize_savings`], reporting each probe through the sink.
pub fn optimize_savings_with_progress(
    payload: &SavingsOptimizationInput,
    seed: u64,
    reporter: &ProgressReporter<'_>,
) -> Result<RecommendedSavingsResult> {
    payload.validate()?;

    let tolerance_capital = 100.0_f64.max(
        payload.target_final_capital.abs() * payload.settings.effective().tolerance_ratio,
    );
    let full_budget = payload.settings.max_iterations.max(MIN_MC_BUDGET);

    let mut search = Search {
        payload,
        reporter,
        root_seed: seed,
        tolerance_capital,
        steps: Vec::new(),
        best_candidate: None,
        best_sufficient: None,
    };

    // Baseline with real contributions; its curves are what the caller
    // displays regardless of the recommendation.
    let baseline = search.evaluate(1.0, full_budget)?;

    let mut saturated = false;
    let chosen = if !payload.calculate_minimum_savings {
        baseline.clone()
    } else {
        let zero = search.evaluate(0.0, full_budget)?;
        if zero.sufficient {
            zero
        } else {
            let (low, high) = bracket(&mut search, zero, baseline.clone(), &mut saturated)?;
            match high {
                Some(high) => bisect(&mut search, payload, low, high, full_budget)?,
                None => search
                    .best_candidate
                    .clone()
                    .unwrap_or_else(|| baseline.clone()),
            }
        }
    };

    // Precision pass: probes measured with a reduced budget get one full
    // re-evaluation at the chosen scale.
    let chosen = if chosen.mc_budget < full_budget {
        search.evaluate(chosen.scale, full_budget)?
    } else {
        chosen
    };

    reporter.report(
        "optimization",
        100.0,
        format!("recommended scale {:.4}", chosen.scale),
        true,
    );

    let target = payload.target_final_capital;
    let residual_error_ratio = if target != 0.0 {
        chosen.error / target.abs().max(1.0)
    } else {
        chosen.error / chosen.effective_final_capital.abs().max(1.0)
    };

    Ok(RecommendedSavingsResult {
        scale: chosen.scale,
        recommended_monthly_savings: chosen.total_savings.max(0.0),
        minimum_capital_at_retirement: chosen.accumulation.median_final_capital(),
        monte_carlo_result: baseline.accumulation,
        retirement_results: baseline.retirement,
        steps: search.steps,
        residual_error: chosen.error,
        residual_error_ratio,
        saturated,
    })
}

/// Double the scale from 1 until a sufficient probe appears. Returns the
/// last insufficient probe and the first sufficient one (`None` when the
/// search saturates).
fn bracket(
    search: &mut Search<'_>,
    zero: EvaluationOutcome,
    baseline: EvaluationOutcome,
    saturated: &mut bool,
) -> Result<(EvaluationOutcome, Option<EvaluationOutcome>)> {
    if baseline.sufficient {
        return Ok((zero, Some(baseline)));
    }

    let mut low = baseline;
    let mut attempts = 0;
    let mut scale = 1.0;

    while attempts < MAX_BRACKET_ATTEMPTS && scale < MAX_BRACKET_SCALE {
        scale *= 2.0;
        let probe = search.evaluate(scale, MIN_MC_BUDGET)?;
        if probe.sufficient {
            return Ok((low, Some(probe)));
        }
        low = probe;
        attempts += 1;
    }

    *saturated = true;
    Ok((low, None))
}

/// Narrow the bracket down to the cheapest sufficient scale.
fn bisect(
    search: &mut Search<'_>,
    payload: &SavingsOptimizationInput,
    mut low: EvaluationOutcome,
    mut high: EvaluationOutcome,
    full_budget: usize,
) -> Result<EvaluationOutcome> {
    let initial_width = (high.scale - low.scale).max(MIN_BRACKET_WIDTH);
    let remaining = payload.max_probes.saturating_sub(search.steps.len());

    for _ in 0..remaining {
        if high.scale - low.scale < MIN_BRACKET_WIDTH {
            break;
        }

        let mid_scale = (low.scale + high.scale) / 2.0;
        let width_ratio = (high.scale - low.scale) / initial_width;
        let mid = search.evaluate(mid_scale, adaptive_mc_budget(width_ratio, full_budget))?;

        if mid.sufficient {
            let close_enough = mid.error.abs() <= search.tolerance_capital;
            high = mid;
            if close_enough {
                break;
            }
        } else {
            low = mid;
        }
    }

    Ok(search.best_sufficient.clone().unwrap_or(high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptive_budget_ramp() {
        assert_eq!(adaptive_mc_budget(1.0, 8_000), 100);
        assert_eq!(adaptive_mc_budget(0.3, 8_000), 1_000);
        assert_eq!(adaptive_mc_budget(0.05, 8_000), 4_000);
        assert_eq!(adaptive_mc_budget(0.005, 8_000), 8_000);
        // Small configured budgets collapse onto the floor.
        assert_eq!(adaptive_mc_budget(0.3, 50), 100);
    }
}
