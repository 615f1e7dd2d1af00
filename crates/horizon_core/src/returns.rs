//! Correlated monthly return sampling and per-account return blending
//!
//! One draw produces a real (inflation-adjusted) monthly return per asset
//! class. Correlation is imposed through the Cholesky factor of the monthly
//! covariance matrix; an ill-conditioned matrix degrades to independent
//! draws, which the caller surfaces as a warning. Account-level returns are
//! blended from the class draws, recentered on the account's expected
//! performance, clamped, and reduced by the kind's growth tax drag.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::model::{AssetClass, InvestmentAccount, MarketAssumptions};
use crate::stats::cholesky_decomposition;

/// Guard against pathological tail draws: per-month account returns are
/// clamped to ±30%. Shared by both simulation phases.
pub const MONTHLY_RETURN_CLAMP: f64 = 0.3;

/// One month of real returns, indexed by asset class.
#[derive(Debug, Clone, Copy)]
pub struct AssetReturns {
    values: [f64; AssetClass::COUNT],
}

impl AssetReturns {
    #[must_use]
    pub fn get(&self, class: AssetClass) -> f64 {
        self.values[class.index()]
    }
}

/// Monthly return sampler for one driver invocation.
///
/// The covariance matrix and its Cholesky factor depend only on the market
/// assumptions, so they are computed once and shared read-only across all
/// paths of a batch.
#[derive(Debug, Clone)]
pub struct ReturnSampler {
    means: [f64; AssetClass::COUNT],
    stds: [f64; AssetClass::COUNT],
    factor: Option<[[f64; AssetClass::COUNT]; AssetClass::COUNT]>,
    inflation: Option<(f64, f64)>,
}

impl ReturnSampler {
    #[must_use]
    pub fn new(market: &MarketAssumptions) -> Self {
        let mut means = [0.0; AssetClass::COUNT];
        let mut stds = [0.0; AssetClass::COUNT];
        for (i, class) in AssetClass::ALL.iter().enumerate() {
            means[i] = market.monthly_mean(*class);
            stds[i] = market.monthly_std(*class);
        }

        Self {
            means,
            stds,
            factor: cholesky_decomposition(&market.covariance_matrix()),
            inflation: market.monthly_inflation(),
        }
    }

    /// True when the covariance matrix was not positive-definite and the
    /// sampler degraded to independent draws.
    #[must_use]
    pub fn uses_independent_draws(&self) -> bool {
        self.factor.is_none()
    }

    /// Draw one month of correlated real returns.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> AssetReturns {
        let mut values = [0.0; AssetClass::COUNT];

        match &self.factor {
            Some(lower) => {
                // R = μ + L · Z with Z ~ N(0, I)
                let mut normals = [0.0; AssetClass::COUNT];
                for z in &mut normals {
                    *z = StandardNormal.sample(rng);
                }
                for i in 0..AssetClass::COUNT {
                    let correlated: f64 =
                        (0..=i).map(|k| lower[i][k] * normals[k]).sum();
                    values[i] = self.means[i] + correlated;
                }
            }
            None => {
                for i in 0..AssetClass::COUNT {
                    let z: f64 = StandardNormal.sample(rng);
                    values[i] = self.means[i] + self.stds[i] * z;
                }
            }
        }

        if let Some((mean, std)) = self.inflation {
            let z: f64 = StandardNormal.sample(rng);
            let shock = mean + std * z;
            for value in &mut values {
                *value -= shock;
            }
        }

        AssetReturns { values }
    }
}

/// Expected gross monthly return of an account (its target mean).
///
/// PEA and CTO track equities; PER and assurance-vie blend by allocation;
/// livrets track the regulated rate; crypto and autre honor the account's
/// own expected performance when set.
#[must_use]
pub fn account_expected_monthly_return(
    account: &InvestmentAccount,
    market: &MarketAssumptions,
) -> f64 {
    use crate::model::AccountKind::{AssuranceVie, Crypto, Cto, Livret, Pea, Per};

    match account.kind {
        Pea | Cto => market.monthly_mean(AssetClass::Equities),
        Per | AssuranceVie => {
            let (equities, bonds, other) = account.allocation_split();
            equities * market.monthly_mean(AssetClass::Equities)
                + bonds * market.monthly_mean(AssetClass::Bonds)
                + other * market.monthly_mean(AssetClass::Other)
        }
        Livret => market.monthly_mean(AssetClass::Livrets),
        Crypto => match account.expected_performance {
            Some(performance) => performance / 100.0 / 12.0,
            None => market.monthly_mean(AssetClass::Crypto),
        },
        _ => match account.expected_performance {
            Some(performance) => performance / 100.0 / 12.0,
            None => market.monthly_mean(AssetClass::Other),
        },
    }
}

/// Gross monthly return of an account for one sampled month.
///
/// The class draw is recentered from the class mean onto the account's
/// target mean, then clamped to ±[`MONTHLY_RETURN_CLAMP`].
#[must_use]
pub fn account_gross_return(
    account: &InvestmentAccount,
    sample: &AssetReturns,
    market: &MarketAssumptions,
) -> f64 {
    use crate::model::AccountKind::{AssuranceVie, Crypto, Cto, Livret, Pea, Per};

    let target_mean = account_expected_monthly_return(account, market);
    let (base, base_mean) = match account.kind {
        Pea | Cto => (
            sample.get(AssetClass::Equities),
            market.monthly_mean(AssetClass::Equities),
        ),
        Per | AssuranceVie => {
            let (equities, bonds, other) = account.allocation_split();
            let base = equities * sample.get(AssetClass::Equities)
                + bonds * sample.get(AssetClass::Bonds)
                + other * sample.get(AssetClass::Other);
            let base_mean = equities * market.monthly_mean(AssetClass::Equities)
                + bonds * market.monthly_mean(AssetClass::Bonds)
                + other * market.monthly_mean(AssetClass::Other);
            (base, base_mean)
        }
        Livret => (
            sample.get(AssetClass::Livrets),
            market.monthly_mean(AssetClass::Livrets),
        ),
        Crypto => (
            sample.get(AssetClass::Crypto),
            market.monthly_mean(AssetClass::Crypto),
        ),
        _ => (
            sample.get(AssetClass::Other),
            market.monthly_mean(AssetClass::Other),
        ),
    };

    let adjusted = base + (target_mean - base_mean);
    adjusted.clamp(-MONTHLY_RETURN_CLAMP, MONTHLY_RETURN_CLAMP)
}

/// Net monthly return for one sampled month, after the growth tax drag.
#[must_use]
pub fn account_net_return(
    account: &InvestmentAccount,
    sample: &AssetReturns,
    market: &MarketAssumptions,
) -> f64 {
    account_gross_return(account, sample, market) * (1.0 - account.kind.growth_tax_drag())
}

/// Net expected monthly return, used by the deterministic preview.
#[must_use]
pub fn account_net_expected_return(
    account: &InvestmentAccount,
    market: &MarketAssumptions,
) -> f64 {
    account_expected_monthly_return(account, market) * (1.0 - account.kind.growth_tax_drag())
}
