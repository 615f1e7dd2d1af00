//! Market assumptions: asset classes, returns, volatilities, correlations
//!
//! Annual rates are expressed in percent at the boundary (7.0 = 7%/yr) and
//! converted to monthly decimals inside the engine. Every per-class
//! assumption has a documented fallback so that an empty
//! [`MarketAssumptions`] still produces a usable market.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Asset classes recognized by the return sampler.
///
/// The declaration order is the fixed ordering used for the covariance
/// matrix and the Cholesky factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equities,
    Bonds,
    Livrets,
    Crypto,
    Other,
}

impl AssetClass {
    pub const COUNT: usize = 5;

    /// Fixed ordering for all matrix work.
    pub const ALL: [AssetClass; Self::COUNT] = [
        AssetClass::Equities,
        AssetClass::Bonds,
        AssetClass::Livrets,
        AssetClass::Crypto,
        AssetClass::Other,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            AssetClass::Equities => 0,
            AssetClass::Bonds => 1,
            AssetClass::Livrets => 2,
            AssetClass::Crypto => 3,
            AssetClass::Other => 4,
        }
    }

    /// Default expected annual return, in percent.
    #[must_use]
    pub fn default_annual_return(self) -> f64 {
        match self {
            AssetClass::Equities => 7.0,
            AssetClass::Bonds => 3.0,
            AssetClass::Livrets => 1.5,
            AssetClass::Crypto => 15.0,
            AssetClass::Other => 4.5,
        }
    }

    /// Default annual volatility, in percent.
    #[must_use]
    pub fn default_annual_volatility(self) -> f64 {
        match self {
            AssetClass::Equities => 15.0,
            AssetClass::Bonds => 6.0,
            AssetClass::Livrets => 0.5,
            AssetClass::Crypto => 80.0,
            AssetClass::Other => 10.0,
        }
    }
}

/// Historically observed cross-class correlations, used when the caller
/// provides none.
#[must_use]
fn default_correlation(a: AssetClass, b: AssetClass) -> f64 {
    use AssetClass::{Bonds, Crypto, Equities, Livrets, Other};
    match (a.min(b), a.max(b)) {
        (Equities, Bonds) => 0.3,
        (Equities, Livrets) => 0.05,
        (Equities, Crypto) => 0.4,
        (Equities, Other) => 0.6,
        (Bonds, Livrets) => 0.2,
        (Bonds, Crypto) => 0.1,
        (Bonds, Other) => 0.4,
        (Livrets, Crypto) => -0.05,
        (Livrets, Other) => 0.1,
        (Crypto, Other) => 0.5,
        _ => 1.0,
    }
}

/// Per-class return assumption, in percent per year.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssetAssumption {
    pub expected_return: f64,
    #[serde(default)]
    pub volatility: Option<f64>,
}

/// Container for every market-level hypothesis of a simulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketAssumptions {
    /// Expected annual inflation, in percent.
    #[serde(default)]
    pub inflation_mean: Option<f64>,
    /// Annual inflation volatility, in percent.
    #[serde(default)]
    pub inflation_volatility: Option<f64>,
    #[serde(default)]
    pub asset_classes: FxHashMap<AssetClass, AssetAssumption>,
    /// Correlation overrides, ρ ∈ [−1, 1]; missing pairs use the default
    /// table, self-correlation is always 1.
    #[serde(default)]
    pub correlations: FxHashMap<AssetClass, FxHashMap<AssetClass, f64>>,
}

impl MarketAssumptions {
    /// Expected annual return for a class, as a decimal (0.07 = 7%/yr).
    #[must_use]
    pub fn expected_annual_return(&self, class: AssetClass) -> f64 {
        match self.asset_classes.get(&class) {
            Some(assumption) => assumption.expected_return / 100.0,
            None => class.default_annual_return() / 100.0,
        }
    }

    /// Expected monthly return, μ_k = annual / 12.
    #[must_use]
    pub fn monthly_mean(&self, class: AssetClass) -> f64 {
        self.expected_annual_return(class) / 12.0
    }

    /// Monthly volatility, σ_k = annual / √12.
    #[must_use]
    pub fn monthly_std(&self, class: AssetClass) -> f64 {
        let annual = match self.asset_classes.get(&class) {
            Some(AssetAssumption {
                volatility: Some(vol),
                ..
            }) => vol / 100.0,
            _ => class.default_annual_volatility() / 100.0,
        };
        annual / 12.0_f64.sqrt()
    }

    /// Correlation between two classes: caller override (either order),
    /// then the default table, then 0.
    #[must_use]
    pub fn correlation(&self, a: AssetClass, b: AssetClass) -> f64 {
        if a == b {
            return 1.0;
        }
        if let Some(value) = self.correlations.get(&a).and_then(|row| row.get(&b)) {
            return *value;
        }
        if let Some(value) = self.correlations.get(&b).and_then(|row| row.get(&a)) {
            return *value;
        }
        default_correlation(a, b)
    }

    /// Monthly covariance matrix in the fixed class ordering,
    /// `C_ij = ρ_ij · σ_i · σ_j`.
    #[must_use]
    pub fn covariance_matrix(&self) -> [[f64; AssetClass::COUNT]; AssetClass::COUNT] {
        let stds: Vec<f64> = AssetClass::ALL
            .iter()
            .map(|class| self.monthly_std(*class))
            .collect();

        let mut matrix = [[0.0; AssetClass::COUNT]; AssetClass::COUNT];
        for (i, class_i) in AssetClass::ALL.iter().enumerate() {
            for (j, class_j) in AssetClass::ALL.iter().enumerate() {
                matrix[i][j] = if i == j {
                    stds[i] * stds[i]
                } else {
                    self.correlation(*class_i, *class_j) * stds[i] * stds[j]
                };
            }
        }
        matrix
    }

    /// Monthly inflation shock parameters `(mean, std)`, `None` when
    /// inflation is disabled (both mean and volatility absent or zero).
    #[must_use]
    pub fn monthly_inflation(&self) -> Option<(f64, f64)> {
        let mean = self.inflation_mean.unwrap_or(0.0);
        let vol = self.inflation_volatility.unwrap_or(0.0);
        if mean == 0.0 && vol == 0.0 {
            return None;
        }
        Some((mean / 100.0 / 12.0, vol.max(0.0) / 100.0 / 12.0_f64.sqrt()))
    }
}
