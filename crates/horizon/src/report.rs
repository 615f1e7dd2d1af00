//! Console summaries of engine results

use horizon_core::RecommendedSavingsResult;
use horizon_core::model::{
    CapitalizationResult, MonteCarloResult, PercentileBand, RetirementMonteCarloResult,
    SimulationWarning,
};

fn print_band(label: &str, band: &PercentileBand) {
    println!("{label}");
    println!("  p5  {:>14.2}", band.p5);
    println!("  p10 {:>14.2}", band.p10);
    println!("  p50 {:>14.2}", band.p50);
    println!("  p90 {:>14.2}", band.p90);
    println!("  p95 {:>14.2}", band.p95);
}

fn print_warnings(warnings: &[SimulationWarning]) {
    for warning in warnings {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
    }
}

pub fn preview(result: &CapitalizationResult) {
    println!("Deterministic capitalization preview");
    println!("  start capital        {:>14.2}", result.start_capital);
    println!("  total contributions  {:>14.2}", result.total_contributions);
    println!("  total gains          {:>14.2}", result.total_gains);
    println!("  end capital          {:>14.2}", result.end_capital);
    println!("  months simulated     {:>14}", result.monthly_series.len());
}

pub fn capitalization(result: &MonteCarloResult) {
    print_warnings(&result.warnings);

    println!(
        "Capitalization Monte Carlo: {} iterations, confidence {}",
        result.iterations,
        if result.confidence_reached {
            "reached"
        } else {
            "not reached"
        }
    );
    println!(
        "  mean {:.2}  stdev {:.2}  margin {:.2} ({:.2}%)",
        result.mean_final_capital,
        result.standard_deviation,
        result.error_margin,
        result.error_margin_ratio * 100.0
    );
    print_band("Final capital percentiles", &result.final_band);
}

pub fn retirement(result: &RetirementMonteCarloResult) {
    print_warnings(&result.warnings);

    println!(
        "Retirement Monte Carlo: {} iterations, confidence {}",
        result.iterations,
        if result.confidence_reached {
            "reached"
        } else {
            "not reached"
        }
    );
    print_band("End-of-life capital percentiles", &result.final_band);

    println!("Withdrawal taxation (reference path)");
    let mut kinds: Vec<_> = result.taxes_by_kind.iter().collect();
    kinds.sort_by_key(|(kind, _)| **kind);
    for (kind, breakdown) in kinds {
        println!(
            "  {:<14} gross {:>12.2}  tax {:>10.2}  net {:>12.2}",
            kind.label(),
            breakdown.gross_withdrawal,
            breakdown.income_tax + breakdown.social_contributions,
            breakdown.net_withdrawal
        );
    }
    println!(
        "  total income tax {:.2}, social contributions {:.2}",
        result.total_income_tax, result.total_social_contributions
    );
}

pub fn recommendation(result: &RecommendedSavingsResult) {
    println!("Savings recommendation");
    println!("  scale                     {:>10.4}", result.scale);
    println!(
        "  recommended monthly savings {:>10.2}",
        result.recommended_monthly_savings
    );
    println!(
        "  capital at retirement (median) {:.2}",
        result.minimum_capital_at_retirement
    );
    println!(
        "  residual error            {:>10.2} ({:.2}%)",
        result.residual_error,
        result.residual_error_ratio * 100.0
    );
    if result.saturated {
        tracing::warn!(
            "target unreachable by scaling savings alone; best-effort plan returned"
        );
    }

    println!("Optimization steps");
    for step in &result.steps {
        println!(
            "  #{:<3} scale {:>9.4}  savings {:>10.2}  effective {:>14.2}  depletion {:>3} months",
            step.iteration, step.scale, step.monthly_savings, step.effective_final_capital,
            step.depletion_months
        );
    }
}
