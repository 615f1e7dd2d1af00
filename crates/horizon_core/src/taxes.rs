//! Withdrawal taxation and cost-basis accounting
//!
//! Gains are tracked with the weighted-average acquisition price (PMP): the
//! cost basis is reweighted on every contribution and left untouched by
//! withdrawals until the balance empties. Withdrawal taxation branches on
//! the account kind; all rates are fractional.

use crate::model::{AccountKind, InvestmentAccount, TaxParameters};

/// Social contributions on investment gains.
pub const SOCIAL_CONTRIBUTIONS_RATE: f64 = 0.172;

/// Flat income tax on investment gains (PFU).
pub const FLAT_TAX_RATE: f64 = 0.128;

/// Assurance-vie yearly abatement after eight years, single household.
pub const ASSURANCE_VIE_ABATEMENT_SINGLE: f64 = 4_600.0;

/// Assurance-vie yearly abatement after eight years, couple.
pub const ASSURANCE_VIE_ABATEMENT_COUPLE: f64 = 9_200.0;

/// Assurance-vie income tax rate past the abatement, after eight years.
pub const ASSURANCE_VIE_RATE_AFTER_8Y: f64 = 0.075;

const PEA_MATURITY_YEARS: f64 = 5.0;
const ASSURANCE_VIE_MATURITY_YEARS: f64 = 8.0;

/// Assumed share of an opening balance that is principal when the caller
/// does not provide a cost basis.
const ESTIMATED_COST_BASIS_RATIO: f64 = 0.7;

/// Check a deposit against the account kind's ceiling.
///
/// The ceiling applies to the total balance, interest included. Returns
/// whether any amount may be deposited and the admissible amount (which may
/// be smaller than the proposal).
#[must_use]
pub fn check_deposit_limit(
    kind: AccountKind,
    current_balance: f64,
    proposed: f64,
) -> (bool, f64) {
    let Some(ceiling) = kind.deposit_ceiling() else {
        return (true, proposed);
    };
    if current_balance + proposed <= ceiling {
        return (true, proposed);
    }
    let allowed = (ceiling - current_balance).max(0.0);
    (allowed > 0.0, allowed)
}

/// Per-account fiscal state, owned by a single simulation path.
#[derive(Debug, Clone)]
pub struct AccountTaxState {
    pub kind: AccountKind,
    pub balance: f64,
    /// Weighted-average acquisition price of the current balance (PMP).
    pub cost_basis: f64,
    pub total_contributions: f64,
    pub opening_age: f64,
}

impl AccountTaxState {
    /// Initial state at simulator entry.
    ///
    /// An unknown opening age means the account opens now; an unknown cost
    /// basis is estimated at 70% of the balance so that withdrawals are
    /// taxed realistically even without user-provided acquisition data.
    #[must_use]
    pub fn new(account: &InvestmentAccount, current_age: f64) -> Self {
        let cost_basis = match account.initial_cost_basis {
            Some(basis) if basis > 0.0 => basis,
            _ if account.current_balance > 0.0 => {
                account.current_balance * ESTIMATED_COST_BASIS_RATIO
            }
            _ => 0.0,
        };
        Self {
            kind: account.kind,
            balance: account.current_balance,
            cost_basis,
            total_contributions: account.current_balance,
            opening_age: account.opening_age.unwrap_or(current_age),
        }
    }

    /// Reweight the PMP for a contribution:
    /// `new = (old · balance + contribution) / (balance + contribution)`.
    pub fn record_contribution(&mut self, contribution: f64) {
        let new_balance = self.balance + contribution;
        self.cost_basis = if new_balance > 0.0 {
            (self.cost_basis * self.balance + contribution) / new_balance
        } else {
            0.0
        };
        self.balance = new_balance;
        self.total_contributions += contribution;
    }

    /// Debit a gross withdrawal. The PMP is unchanged until the balance
    /// empties, at which point it resets to zero.
    pub fn record_withdrawal(&mut self, gross: f64) {
        self.balance = (self.balance - gross).max(0.0);
        if self.balance == 0.0 {
            self.cost_basis = 0.0;
        }
    }

    /// Taxable gain realized by a gross withdrawal.
    ///
    /// With no recorded acquisition cost the whole withdrawal is gain;
    /// otherwise the balance's gain ratio applies.
    #[must_use]
    pub fn realized_gain(&self, gross: f64) -> f64 {
        if self.cost_basis <= 0.0 {
            return gross;
        }
        if self.balance <= 0.0 {
            return 0.0;
        }
        let gain_ratio = ((self.balance - self.cost_basis) / self.balance).max(0.0);
        gross * gain_ratio
    }
}

/// Outcome of taxing one gross withdrawal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WithdrawalTax {
    pub gross_withdrawal: f64,
    pub capital_gain: f64,
    pub income_tax: f64,
    pub social_contributions: f64,
    pub net_withdrawal: f64,
    pub effective_rate: f64,
}

/// Tax a gross withdrawal according to the account kind's regime.
#[must_use]
pub fn withdrawal_tax(
    state: &AccountTaxState,
    gross: f64,
    current_age: f64,
    params: &TaxParameters,
) -> WithdrawalTax {
    let account_age_years = current_age - state.opening_age;
    let gain = state.realized_gain(gross);

    let (income_tax, social_contributions) = match state.kind {
        AccountKind::Pea => pea_tax(gain, account_age_years),
        AccountKind::Per => flat_tax(gain),
        AccountKind::AssuranceVie => {
            assurance_vie_tax(gain, account_age_years, params.is_couple)
        }
        AccountKind::Livret => (0.0, 0.0),
        AccountKind::Cto | AccountKind::Crypto | AccountKind::Autre => flat_tax(gain),
    };

    let total_tax = income_tax + social_contributions;
    WithdrawalTax {
        gross_withdrawal: gross,
        capital_gain: gain,
        income_tax,
        social_contributions,
        net_withdrawal: gross - total_tax,
        effective_rate: if gross > 0.0 { total_tax / gross } else { 0.0 },
    }
}

/// PEA: flat tax before five years, social contributions only afterwards.
fn pea_tax(gain: f64, account_age_years: f64) -> (f64, f64) {
    let income_tax = if account_age_years < PEA_MATURITY_YEARS {
        gain * FLAT_TAX_RATE
    } else {
        0.0
    };
    (income_tax, gain * SOCIAL_CONTRIBUTIONS_RATE)
}

/// PFU on the gain plus social contributions (PER, CTO, crypto, autre).
fn flat_tax(gain: f64) -> (f64, f64) {
    (gain * FLAT_TAX_RATE, gain * SOCIAL_CONTRIBUTIONS_RATE)
}

/// Assurance-vie: flat tax before eight years; afterwards an abatement then
/// the reduced rate. Social contributions always apply.
fn assurance_vie_tax(gain: f64, account_age_years: f64, is_couple: bool) -> (f64, f64) {
    let income_tax = if account_age_years < ASSURANCE_VIE_MATURITY_YEARS {
        gain * FLAT_TAX_RATE
    } else {
        let abatement = if is_couple {
            ASSURANCE_VIE_ABATEMENT_COUPLE
        } else {
            ASSURANCE_VIE_ABATEMENT_SINGLE
        };
        (gain - abatement).max(0.0) * ASSURANCE_VIE_RATE_AFTER_8Y
    };
    (income_tax, gain * SOCIAL_CONTRIBUTIONS_RATE)
}
