//! One-time transfer that seeds the retirement account

use super::cashflows::ConsolidationOutcome;
use super::state::AccountState;
use crate::member::ParameterSet;

/// Target amount for the retirement account in the consolidation year
pub fn consolidation_target(params: &ParameterSet) -> f64 {
    let year = params.year_at_age(params.consolidation_age);
    let published = params.statutory.retirement_target.at(year);
    params.target.resolve(published).max(0.0)
}

/// Move special, then ordinary, balances into the retirement account until
/// the target is met, then optionally cash out what is left in ordinary.
///
/// Money already in the retirement account (post-consolidation overflow in
/// the same year) counts towards the target.
pub fn consolidate(params: &ParameterSet, state: &mut AccountState) -> ConsolidationOutcome {
    let target = consolidation_target(params);
    let mut shortfall = (target - state.retirement).max(0.0);

    let from_special = state.special.min(shortfall);
    state.special -= from_special;
    state.retirement += from_special;
    shortfall -= from_special;

    let from_ordinary = state.ordinary.min(shortfall);
    state.ordinary -= from_ordinary;
    state.retirement += from_ordinary;

    let cash_withdrawn = if params.allow_cash_withdrawal && state.ordinary > 0.0 {
        let cash = state.ordinary;
        state.ordinary = 0.0;
        cash
    } else {
        0.0
    };

    let outcome = ConsolidationOutcome {
        year: params.year_at_age(params.consolidation_age),
        age: params.consolidation_age,
        target,
        from_special,
        from_ordinary,
        moved_to_retirement: from_special + from_ordinary,
        retirement_balance: state.retirement,
        ordinary_remaining: state.ordinary,
        special_remaining: state.special,
        cash_withdrawn,
    };

    log::info!(
        "Consolidation at age {}: target {:.2}, moved {:.2} (special {:.2}, ordinary {:.2}), cash {:.2}",
        outcome.age,
        outcome.target,
        outcome.moved_to_retirement,
        outcome.from_special,
        outcome.from_ordinary,
        outcome.cash_withdrawn
    );

    outcome
}
