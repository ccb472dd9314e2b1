//! Projection of the accounts left outside the annuity

use serde::{Deserialize, Serialize};

use super::state::AccountState;
use crate::member::ParameterSet;

/// Balances of the non-annuitized accounts at end age
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalValue {
    pub ordinary: f64,
    pub medical: f64,
    /// Special balance left over after consolidation
    pub special: f64,
    /// Medical excess moved to ordinary over the horizon
    pub medical_overflow: f64,
    pub total: f64,
}

/// Compound ordinary, medical and any residual special balance annually
/// from payout start to end age.
///
/// Medical stays under the frozen cohort cap every year; the excess moves to
/// ordinary because the retirement pool is already being paid out.
pub fn project_terminal_value(params: &ParameterSet, state: &AccountState) -> TerminalValue {
    let mut ordinary = state.ordinary;
    let mut medical = state.medical;
    let mut special = state.special;
    let mut medical_overflow = 0.0;

    for age in params.retirement_age..params.end_age {
        let cap = params.medical_cap_at(age).max(0.0);
        ordinary *= 1.0 + params.rates.ordinary;
        special *= 1.0 + params.rates.special;
        medical *= 1.0 + params.rates.medical;

        if medical > cap {
            let excess = medical - cap;
            medical = cap;
            ordinary += excess;
            medical_overflow += excess;
        }
    }

    TerminalValue {
        ordinary,
        medical,
        special,
        medical_overflow,
        total: ordinary + medical + special,
    }
}
