//! Statistical helpers for Monte Carlo aggregation
//!
//! Percentiles use the nearest-rank convention (`index = ⌊p · (n − 1)⌋`) so
//! that aggregation is deterministic for a given sorted sample. The
//! confidence test bounds the half-width of the z-interval around the mean
//! estimator. The covariance math is small (5×5) and hand-rolled on purpose:
//! the fall-back-on-failure behavior is part of the sampling contract.

/// Minimum sample count before the confidence test is meaningful.
pub const MIN_CONFIDENCE_SAMPLES: usize = 50;

/// Placeholder margin reported while the sample is too small (kept finite
/// for serialization).
const UNDETERMINED_MARGIN: f64 = 1e10;

/// Nearest-rank percentile of an ascending-sorted slice, `p` in [0, 1].
#[must_use]
pub fn percentile_from_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let index = (p * (n - 1) as f64) as usize;
            sorted[index.min(n - 1)]
        }
    }
}

#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divisor `n`, matching the estimator used
/// by the confidence test).
#[must_use]
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Outcome of the interval-width confidence test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confidence {
    pub reached: bool,
    /// Absolute half-width of the confidence interval around the mean.
    pub margin: f64,
    /// Half-width relative to |mean|.
    pub margin_ratio: f64,
}

impl Confidence {
    /// State before enough samples have been collected.
    #[must_use]
    pub fn undetermined() -> Self {
        Self {
            reached: false,
            margin: UNDETERMINED_MARGIN,
            margin_ratio: 1.0,
        }
    }
}

/// Check whether the mean estimator is tight enough to stop sampling.
///
/// With n samples, mean μ and population stdev σ, the half-width is
/// `z · σ / √n`; sampling stops once it is ≤ `|μ| · tolerance_ratio`.
/// A zero mean only converges once the spread is zero as well. Fewer than
/// [`MIN_CONFIDENCE_SAMPLES`] samples never converge.
#[must_use]
pub fn check_confidence(values: &[f64], confidence_level: f64, tolerance_ratio: f64) -> Confidence {
    let n = values.len();
    if n < MIN_CONFIDENCE_SAMPLES {
        return Confidence::undetermined();
    }

    let mean_val = mean(values);
    let stdev_val = population_std_dev(values);

    if mean_val == 0.0 {
        return Confidence {
            reached: stdev_val == 0.0,
            margin: stdev_val,
            margin_ratio: if stdev_val == 0.0 { 0.0 } else { 1.0 },
        };
    }

    let Some(z) = z_value(confidence_level) else {
        return Confidence::undetermined();
    };

    let standard_error = stdev_val / (n as f64).sqrt();
    let margin = z * standard_error;
    let margin_ratio = margin / mean_val.abs();

    Confidence {
        reached: margin <= mean_val.abs() * tolerance_ratio,
        margin,
        margin_ratio,
    }
}

/// Two-sided z-score for a coverage probability, `None` outside the
/// supported (0.5, 0.9999) window.
#[must_use]
pub fn z_value(confidence_level: f64) -> Option<f64> {
    if !(0.5..0.9999).contains(&confidence_level) || confidence_level == 0.5 {
        return None;
    }
    Some(inverse_normal_cdf(0.5 + confidence_level / 2.0))
}

/// Inverse CDF of the standard normal distribution (Acklam's rational
/// approximation, |relative error| < 1.2e-9 over (0, 1)).
#[must_use]
fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_690e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

/// Cholesky decomposition of a symmetric matrix.
///
/// Returns the lower-triangular factor `L` with `L · Lᵀ = matrix`, or `None`
/// when the matrix is not positive-definite (the caller falls back to
/// independent draws).
#[must_use]
pub fn cholesky_decomposition<const N: usize>(matrix: &[[f64; N]; N]) -> Option<[[f64; N]; N]> {
    let mut lower = [[0.0; N]; N];

    for i in 0..N {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| lower[i][k] * lower[j][k]).sum();

            if i == j {
                let value = matrix[i][i] - sum;
                if value <= 0.0 {
                    return None;
                }
                lower[i][j] = value.sqrt();
            } else {
                if lower[j][j] == 0.0 {
                    return None;
                }
                lower[i][j] = (matrix[i][j] - sum) / lower[j][j];
            }
        }
    }

    Some(lower)
}
