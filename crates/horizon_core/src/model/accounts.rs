//! Investment account definitions
//!
//! The account kind is a closed sum: it drives the growth blend used by the
//! return sampler, the tax regime applied on withdrawals, the immediate
//! growth tax drag, and the deposit ceiling. Both the sampler and the
//! taxation engine branch on the tag with a plain `match`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Pea,
    Per,
    AssuranceVie,
    Livret,
    Crypto,
    Cto,
    Autre,
}

impl AccountKind {
    /// Regulatory deposit ceiling applied to the total balance, if any.
    #[must_use]
    pub fn deposit_ceiling(self) -> Option<f64> {
        match self {
            AccountKind::Pea => Some(150_000.0),
            AccountKind::Livret => Some(22_950.0),
            _ => None,
        }
    }

    /// Flat tax rate applied monthly to gross growth.
    ///
    /// This models taxation of accrued gains during the holding period and
    /// is distinct from the withdrawal taxation in the taxation engine.
    /// Livrets are exempt; assurance-vie and autre defer everything to
    /// withdrawal.
    #[must_use]
    pub fn growth_tax_drag(self) -> f64 {
        match self {
            AccountKind::Pea | AccountKind::Per => 0.172,
            AccountKind::Cto | AccountKind::Crypto => 0.30,
            AccountKind::AssuranceVie | AccountKind::Livret | AccountKind::Autre => 0.0,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AccountKind::Pea => "pea",
            AccountKind::Per => "per",
            AccountKind::AssuranceVie => "assurance_vie",
            AccountKind::Livret => "livret",
            AccountKind::Crypto => "crypto",
            AccountKind::Cto => "cto",
            AccountKind::Autre => "autre",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentAccount {
    pub kind: AccountKind,
    #[serde(default)]
    pub label: Option<String>,
    pub current_balance: f64,
    #[serde(default)]
    pub monthly_contribution: Option<f64>,
    /// Share of the contribution pool, in percent; used when no account
    /// carries an explicit amount.
    #[serde(default)]
    pub monthly_contribution_share: Option<f64>,
    /// Equity share of the allocation, in percent (per / assurance-vie).
    #[serde(default)]
    pub allocation_equities: Option<f64>,
    /// Bond share of the allocation, in percent; the remainder goes to
    /// "other".
    #[serde(default)]
    pub allocation_bonds: Option<f64>,
    /// Account-specific expected annual performance, in percent.
    #[serde(default)]
    pub expected_performance: Option<f64>,
    /// Age at which the account was opened, for maturity-dependent tax
    /// regimes.
    #[serde(default)]
    pub opening_age: Option<f64>,
    /// Average acquisition cost of the current balance, if known.
    #[serde(default)]
    pub initial_cost_basis: Option<f64>,
}

impl InvestmentAccount {
    /// Account of the given kind and balance, everything else unset.
    #[must_use]
    pub fn new(kind: AccountKind, current_balance: f64) -> Self {
        Self {
            kind,
            label: None,
            current_balance,
            monthly_contribution: None,
            monthly_contribution_share: None,
            allocation_equities: None,
            allocation_bonds: None,
            expected_performance: None,
            opening_age: None,
            initial_cost_basis: None,
        }
    }

    /// Explicit monthly contribution, floored at zero.
    #[must_use]
    pub fn contribution(&self) -> f64 {
        self.monthly_contribution.unwrap_or(0.0).max(0.0)
    }

    /// Copy of the account with the explicit contribution scaled.
    #[must_use]
    pub fn with_scaled_contribution(&self, scale: f64) -> Self {
        Self {
            monthly_contribution: Some((self.contribution() * scale).max(0.0)),
            ..self.clone()
        }
    }

    /// Allocation split `(equities, bonds, other)` as decimals summing to 1.
    #[must_use]
    pub fn allocation_split(&self) -> (f64, f64, f64) {
        let equities = self.allocation_equities.unwrap_or(0.0) / 100.0;
        let bonds = self.allocation_bonds.unwrap_or(0.0) / 100.0;
        let other = (1.0 - equities - bonds).max(0.0);
        (equities, bonds, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceilings() {
        assert_eq!(AccountKind::Pea.deposit_ceiling(), Some(150_000.0));
        assert_eq!(AccountKind::Livret.deposit_ceiling(), Some(22_950.0));
        assert_eq!(AccountKind::AssuranceVie.deposit_ceiling(), None);
        assert_eq!(AccountKind::Cto.deposit_ceiling(), None);
    }

    #[test]
    fn test_allocation_remainder_goes_to_other() {
        let account = InvestmentAccount {
            allocation_equities: Some(60.0),
            allocation_bonds: Some(30.0),
            ..InvestmentAccount::new(AccountKind::AssuranceVie, 1_000.0)
        };
        let (equities, bonds, other) = account.allocation_split();
        assert!((equities - 0.6).abs() < 1e-12);
        assert!((bonds - 0.3).abs() < 1e-12);
        assert!((other - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_scaled_contribution_never_negative() {
        let account = InvestmentAccount {
            monthly_contribution: Some(200.0),
            ..InvestmentAccount::new(AccountKind::Pea, 0.0)
        };
        assert_eq!(
            account.with_scaled_contribution(0.5).contribution(),
            100.0
        );
        assert_eq!(account.with_scaled_contribution(0.0).contribution(), 0.0);
    }
}
