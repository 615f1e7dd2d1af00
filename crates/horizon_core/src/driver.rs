//! Batched Monte Carlo execution with confidence control
//!
//! The driver maps a single-path kernel over independent path indices in
//! batches, checks the mean-estimator confidence interval at batch
//! boundaries, and aggregates percentiles once sampling stops. Paths never
//! share mutable state; every path derives its own RNG seed from the root
//! seed and its index, so results are bit-identical for a given root seed
//! regardless of batch boundaries or thread scheduling.

use rustc_hash::FxHashSet;

use crate::model::{ABERRANT_VALUE_CAP, McSettings, PercentileBand, SimulationWarning};
use crate::progress::ProgressReporter;
use crate::stats::{self, Confidence};

#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Output of one simulated path.
pub(crate) struct PathSample<A> {
    pub final_capital: f64,
    pub monthly_totals: Vec<f64>,
    /// Phase-specific auxiliary series; the first path's value is kept as
    /// the reference for display.
    pub aux: A,
    pub warnings: Vec<SimulationWarning>,
}

/// Accumulated state of one driver invocation.
pub(crate) struct McOutcome<A> {
    pub finals: Vec<f64>,
    pub paths: Vec<Vec<f64>>,
    pub reference: Option<A>,
    pub confidence: Confidence,
    pub warnings: Vec<SimulationWarning>,
}

impl<A> McOutcome<A> {
    pub(crate) fn iterations(&self) -> usize {
        self.finals.len()
    }
}

/// Mix a path index into the root seed (SplitMix64 finalizer).
///
/// Seeds must depend only on (root, index) so that a path's draw sequence
/// is independent of batching and parallelism.
#[must_use]
pub(crate) fn derive_path_seed(root_seed: u64, path_index: u64) -> u64 {
    let mut z = root_seed
        .wrapping_add(path_index.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Run batches of `path_fn` until the confidence target or the iteration
/// ceiling is hit, whichever comes first.
///
/// `path_fn` receives a derived seed and must be pure with respect to it.
/// Cancellation is honored at batch boundaries; a cancelled run returns the
/// samples collected so far.
pub(crate) fn run_monte_carlo<A, F>(
    settings: &McSettings,
    root_seed: u64,
    reporter: &ProgressReporter<'_>,
    step_name: &str,
    path_fn: F,
) -> McOutcome<A>
where
    A: Send,
    F: Fn(u64) -> PathSample<A> + Sync,
{
    let settings = settings.effective();
    let max_iterations = settings.max_iterations;
    let batch_size = settings.batch_size;

    let mut finals: Vec<f64> = Vec::with_capacity(batch_size);
    let mut paths: Vec<Vec<f64>> = Vec::with_capacity(batch_size);
    let mut reference: Option<A> = None;
    let mut warnings: Vec<SimulationWarning> = Vec::new();
    let mut seen_warning_kinds = FxHashSet::default();
    let mut confidence = Confidence::undetermined();

    while finals.len() < max_iterations {
        if reporter.is_cancelled() {
            break;
        }

        let start = finals.len();
        let batch = batch_size.min(max_iterations - start);

        #[cfg(feature = "parallel")]
        let samples: Vec<PathSample<A>> = (start..start + batch)
            .into_par_iter()
            .map(|index| path_fn(derive_path_seed(root_seed, index as u64)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let samples: Vec<PathSample<A>> = (start..start + batch)
            .map(|index| path_fn(derive_path_seed(root_seed, index as u64)))
            .collect();

        for sample in samples {
            if reference.is_none() {
                reference = Some(sample.aux);
            }
            for warning in sample.warnings {
                if seen_warning_kinds.insert(warning.kind) {
                    warnings.push(warning);
                }
            }
            finals.push(sample.final_capital);
            paths.push(sample.monthly_totals);
        }

        reporter.add_completed(batch);
        reporter.report(
            step_name,
            finals.len() as f64 / max_iterations as f64 * 100.0,
            format!("{}/{} paths", finals.len(), max_iterations),
            false,
        );

        confidence =
            stats::check_confidence(&finals, settings.confidence_level, settings.tolerance_ratio);
        if confidence.reached {
            break;
        }
    }

    McOutcome {
        finals,
        paths,
        reference,
        confidence,
        warnings,
    }
}

/// Drop aberrant samples (negative or ≥ the cap) and sort ascending.
#[must_use]
pub(crate) fn filtered_sorted(values: &[f64]) -> Vec<f64> {
    let mut kept: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v >= 0.0 && *v < ABERRANT_VALUE_CAP)
        .collect();
    kept.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    kept
}

/// Percentile band of each month across all paths.
#[must_use]
pub(crate) fn monthly_bands(paths: &[Vec<f64>], total_months: usize) -> Vec<PercentileBand> {
    let mut bands = Vec::with_capacity(total_months);
    for month in 0..total_months {
        let values: Vec<f64> = paths
            .iter()
            .filter_map(|path| path.get(month).copied())
            .collect();
        bands.push(PercentileBand::from_sorted(&filtered_sorted(&values)));
    }
    bands
}

/// Final-sample statistics on the filtered sample set.
pub(crate) struct FinalStats {
    pub band: PercentileBand,
    pub mean: f64,
    pub std_dev: f64,
    pub confidence: Confidence,
}

pub(crate) fn final_stats(
    finals: &[f64],
    confidence_level: f64,
    tolerance_ratio: f64,
) -> FinalStats {
    let sorted = filtered_sorted(finals);
    FinalStats {
        band: PercentileBand::from_sorted(&sorted),
        mean: stats::mean(&sorted),
        std_dev: stats::population_std_dev(&sorted),
        confidence: stats::check_confidence(&sorted, confidence_level, tolerance_ratio),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressReporter;

    fn constant_path(value: f64) -> impl Fn(u64) -> PathSample<()> + Sync {
        move |_seed| PathSample {
            final_capital: value,
            monthly_totals: vec![value; 3],
            aux: (),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_seed_derivation_is_stable_and_spread() {
        assert_eq!(derive_path_seed(42, 0), derive_path_seed(42, 0));
        assert_ne!(derive_path_seed(42, 0), derive_path_seed(42, 1));
        assert_ne!(derive_path_seed(42, 0), derive_path_seed(43, 0));
    }

    #[test]
    fn test_constant_paths_converge_at_first_check() {
        let settings = McSettings {
            max_iterations: 10_000,
            batch_size: 100,
            ..McSettings::default()
        };
        let outcome = run_monte_carlo(
            &settings,
            1,
            &ProgressReporter::disabled(),
            "test",
            constant_path(500.0),
        );
        assert_eq!(outcome.iterations(), 100);
        assert!(outcome.confidence.reached);
    }

    #[test]
    fn test_iteration_ceiling_respected() {
        let settings = McSettings {
            max_iterations: 42,
            batch_size: 25,
            tolerance_ratio: 1e-4,
            ..McSettings::default()
        };
        // 42 is not a batch multiple; the last batch must shrink to fit.
        let outcome = run_monte_carlo(
            &settings,
            1,
            &ProgressReporter::disabled(),
            "test",
            constant_path(1.0),
        );
        assert_eq!(outcome.iterations(), 42);
    }

    #[test]
    fn test_cancellation_stops_at_batch_boundary() {
        use crate::progress::{NullProgress, RunControl};

        let control = RunControl::new();
        control.cancel();
        let sink = NullProgress;
        let reporter = ProgressReporter::new(&sink, &control, "task");

        let settings = McSettings {
            max_iterations: 1_000,
            batch_size: 100,
            ..McSettings::default()
        };
        let outcome = run_monte_carlo(&settings, 1, &reporter, "test", constant_path(1.0));
        assert_eq!(outcome.iterations(), 0);
        assert!(!outcome.confidence.reached);
    }

    #[test]
    fn test_filtered_sorted_drops_aberrant_values() {
        let values = vec![3.0, -1.0, 1e13, f64::NAN, 1.0, 2.0];
        assert_eq!(filtered_sorted(&values), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_monthly_bands_ordered() {
        let paths: Vec<Vec<f64>> = (0..100).map(|i| vec![f64::from(i); 2]).collect();
        let bands = monthly_bands(&paths, 2);
        for band in bands {
            assert!(band.p5 <= band.p10);
            assert!(band.p10 <= band.p50);
            assert!(band.p50 <= band.p90);
            assert!(band.p90 <= band.p95);
        }
    }
}
