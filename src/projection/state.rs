//! Running account balances for a single lifecycle run

use serde::{Deserialize, Serialize};

use crate::member::AccountRates;

/// The four sub-account balances, owned by one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub ordinary: f64,
    pub special: f64,
    pub medical: f64,
    /// Populated by the consolidation event and post-consolidation routing
    pub retirement: f64,
}

impl AccountState {
    /// All balances at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all four balances
    pub fn total(&self) -> f64 {
        self.ordinary + self.special + self.medical + self.retirement
    }

    /// Credit one year of compound interest to every account.
    /// Returns the total interest credited.
    pub fn credit_annual_interest(&mut self, rates: &AccountRates) -> f64 {
        let before = self.total();
        self.ordinary *= 1.0 + rates.ordinary;
        self.special *= 1.0 + rates.special;
        self.medical *= 1.0 + rates.medical;
        self.retirement *= 1.0 + rates.retirement;
        self.total() - before
    }

    /// Smallest balance across the four accounts
    pub fn min_balance(&self) -> f64 {
        self.ordinary
            .min(self.special)
            .min(self.medical)
            .min(self.retirement)
    }
}
