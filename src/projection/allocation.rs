//! Yearly contribution allocation and the medical-cap overflow cascade

use super::cashflows::YearResult;
use super::state::AccountState;
use crate::member::ParameterSet;

/// Destination of money that cannot go to the medical account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowTarget {
    Special,
    Retirement,
}

/// Enforces the medical cap and redirects the excess
///
/// Below the consolidation age the excess goes to the special account, from
/// the consolidation age on it goes to the retirement account. The same rule
/// serves allocation-time and post-interest overflow.
#[derive(Debug, Clone, Copy)]
pub struct OverflowCascade {
    pub consolidation_age: u32,
}

impl OverflowCascade {
    pub fn new(consolidation_age: u32) -> Self {
        Self { consolidation_age }
    }

    pub fn target_for(&self, age: u32) -> OverflowTarget {
        if age < self.consolidation_age {
            OverflowTarget::Special
        } else {
            OverflowTarget::Retirement
        }
    }

    /// Amount `apply` would move for the given inputs
    pub fn redirected(state: &AccountState, amount: f64, cap: f64) -> f64 {
        amount.max(0.0) + (state.medical - cap.max(0.0)).max(0.0)
    }

    /// Redirect `amount` plus any medical balance above `cap`.
    ///
    /// Afterwards the medical balance is `min(previous medical, cap)`. A
    /// second call with a zero amount changes nothing.
    pub fn apply(&self, state: &mut AccountState, amount: f64, age: u32, cap: f64) {
        let cap = cap.max(0.0);
        let mut excess = 0.0;
        if state.medical > cap {
            excess = state.medical - cap;
            state.medical = cap;
        }

        let total = amount.max(0.0) + excess;
        if total <= 0.0 {
            return;
        }

        match self.target_for(age) {
            OverflowTarget::Special => state.special += total,
            OverflowTarget::Retirement => state.retirement += total,
        }
    }
}

/// Splits one year's salary into contributions and credits the accounts
pub struct ContributionAllocator<'a> {
    params: &'a ParameterSet,
    cascade: OverflowCascade,
}

impl<'a> ContributionAllocator<'a> {
    pub fn new(params: &'a ParameterSet) -> Self {
        Self {
            params,
            cascade: OverflowCascade::new(params.consolidation_age),
        }
    }

    pub fn cascade(&self) -> &OverflowCascade {
        &self.cascade
    }

    /// Run one working year: contribute, allocate, credit interest, re-check the cap
    pub fn allocate_year(&self, state: &mut AccountState, age: u32, salary: f64) -> YearResult {
        let params = self.params;
        let statutory = &params.statutory;
        let mut row = YearResult::new(params.year_at_age(age), age);
        let cap = params.medical_cap_at(age).max(0.0);

        row.salary = salary;
        row.medical_cap = cap;

        // Contribution base is clamped to the ceiling
        row.contribution_base = salary.max(0.0).min(params.contribution_ceiling);

        let rates = statutory.contribution_rates.for_age(age);
        row.employee_contribution = row.contribution_base * rates.employee;
        row.employer_contribution = row.contribution_base * rates.employer;
        row.total_contribution = row.employee_contribution + row.employer_contribution;

        let band = statutory.allocation.for_age(age);
        let ordinary = row.total_contribution * band.ordinary;
        let special = row.total_contribution * band.special;
        // Medical takes the remainder so the three shares add up exactly
        let medical = row.total_contribution - ordinary - special;

        state.ordinary += ordinary;
        row.ordinary_allocation = ordinary;

        state.special += special;
        row.special_allocation += special;

        let headroom = (cap - state.medical).max(0.0);
        let to_medical = medical.min(headroom);
        let allocation_overflow = medical - to_medical;
        state.medical += to_medical;
        row.medical_allocation = to_medical;

        let redirected = OverflowCascade::redirected(state, allocation_overflow, cap);
        self.cascade.apply(state, allocation_overflow, age, cap);
        match self.cascade.target_for(age) {
            OverflowTarget::Special => row.special_allocation += allocation_overflow,
            OverflowTarget::Retirement => row.retirement_allocation += allocation_overflow,
        }

        row.interest_credited = state.credit_annual_interest(&params.rates);

        // Interest alone can push medical above the cap
        let interest_overflow = OverflowCascade::redirected(state, 0.0, cap);
        self.cascade.apply(state, 0.0, age, cap);

        row.overflow = redirected + interest_overflow;
        record_balances(&mut row, state);

        log::debug!(
            "age {} ({}): base {:.2}, contribution {:.2}, overflow {:.2}, medical {:.2}/{:.2}",
            age,
            row.year,
            row.contribution_base,
            row.total_contribution,
            row.overflow,
            state.medical,
            cap
        );

        row
    }
}

/// Copy end-of-year balances into a row
pub(crate) fn record_balances(row: &mut YearResult, state: &AccountState) {
    row.ordinary_balance = state.ordinary;
    row.special_balance = state.special;
    row.medical_balance = state.medical;
    row.retirement_balance = state.retirement;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::ScheduleFn;
    use crate::member::{AccountRates, SalaryPath};
    use approx::assert_relative_eq;

    fn flat_params(cap: f64) -> ParameterSet {
        let mut params = ParameterSet {
            salary: SalaryPath::Growth { start: 60_000.0, rate: 0.0 },
            ..ParameterSet::standard()
        };
        params.statutory.medical_cap = ScheduleFn::constant(cap);
        params
    }

    #[test]
    fn test_overflow_below_consolidation_goes_to_special() {
        let cascade = OverflowCascade::new(55);
        let mut state = AccountState { medical: 120.0, ..AccountState::new() };

        cascade.apply(&mut state, 30.0, 40, 100.0);

        assert_eq!(state.medical, 100.0);
        assert_eq!(state.special, 50.0);
        assert_eq!(state.retirement, 0.0);
    }

    #[test]
    fn test_overflow_from_consolidation_goes_to_retirement() {
        let cascade = OverflowCascade::new(55);
        let mut state = AccountState { medical: 120.0, ..AccountState::new() };

        cascade.apply(&mut state, 10.0, 55, 100.0);

        assert_eq!(state.medical, 100.0);
        assert_eq!(state.retirement, 30.0);
        assert_eq!(state.special, 0.0);
    }

    #[test]
    fn test_overflow_is_idempotent() {
        let cascade = OverflowCascade::new(55);
        let mut state = AccountState { medical: 150.0, ..AccountState::new() };

        cascade.apply(&mut state, 0.0, 40, 100.0);
        let once = state;
        cascade.apply(&mut state, 0.0, 40, 100.0);

        assert_eq!(state, once);
    }

    #[test]
    fn test_overflow_leaves_medical_below_cap_untouched() {
        let cascade = OverflowCascade::new(55);
        let mut state = AccountState { medical: 80.0, ..AccountState::new() };

        cascade.apply(&mut state, 0.0, 40, 100.0);

        assert_eq!(state.medical, 80.0);
        assert_eq!(state.special, 0.0);
    }

    #[test]
    fn test_contribution_split() {
        let params = flat_params(1e12);
        let allocator = ContributionAllocator::new(&params);
        let mut state = AccountState::new();

        let row = allocator.allocate_year(&mut state, 30, 60_000.0);

        assert_relative_eq!(row.contribution_base, 60_000.0);
        assert_relative_eq!(row.employee_contribution, 12_000.0);
        assert_relative_eq!(row.employer_contribution, 10_200.0);
        assert_relative_eq!(row.total_contribution, 22_200.0);
        assert_relative_eq!(row.ordinary_allocation, 22_200.0 * 0.6217, epsilon = 1e-9);
        assert_relative_eq!(row.total_allocated(), row.total_contribution, epsilon = 1e-9);
        assert_eq!(row.overflow, 0.0);
    }

    #[test]
    fn test_ceiling_clamps_base() {
        let params = flat_params(1e12);
        let allocator = ContributionAllocator::new(&params);
        let mut state = AccountState::new();

        let row = allocator.allocate_year(&mut state, 30, 500_000.0);

        assert_eq!(row.contribution_base, params.contribution_ceiling);
    }

    #[test]
    fn test_allocation_overflow_redirected() {
        let params = flat_params(1_000.0);
        let allocator = ContributionAllocator::new(&params);
        let mut state = AccountState { medical: 900.0, ..AccountState::new() };

        let row = allocator.allocate_year(&mut state, 40, 60_000.0);

        assert_relative_eq!(row.medical_allocation, 100.0, epsilon = 1e-9);
        assert_eq!(state.medical, 1_000.0);
        assert!(row.overflow > 0.0);
        assert_relative_eq!(row.total_allocated(), row.total_contribution, epsilon = 1e-9);
    }

    #[test]
    fn test_interest_overflow_clamps_to_cap() {
        let mut params = flat_params(1_000.0);
        params.rates = AccountRates { medical: 0.10, ..AccountRates::default() };
        params.salary = SalaryPath::Growth { start: 0.0, rate: 0.0 };
        let allocator = ContributionAllocator::new(&params);
        let mut state = AccountState { medical: 1_000.0, ..AccountState::new() };

        let row = allocator.allocate_year(&mut state, 40, 0.0);

        // 10% interest on the full cap goes to special
        assert_eq!(state.medical, 1_000.0);
        assert_relative_eq!(row.overflow, 100.0, epsilon = 1e-9);
        assert_relative_eq!(state.special, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_special_allocation_stays_in_special_after_consolidation() {
        let params = flat_params(1e12);
        let allocator = ContributionAllocator::new(&params);
        let mut state = AccountState::new();

        let row = allocator.allocate_year(&mut state, 58, 60_000.0);

        let band = params.statutory.allocation.for_age(58);
        assert_relative_eq!(row.special_allocation, row.total_contribution * band.special, max_relative = 1e-12);
        assert_eq!(row.retirement_allocation, 0.0);
        assert_eq!(row.overflow, 0.0);
        assert_eq!(state.retirement, 0.0);
        assert_relative_eq!(state.special, row.special_allocation * 1.04, max_relative = 1e-12);
    }

    #[test]
    fn test_only_overflow_reaches_retirement_after_consolidation() {
        let params = flat_params(1_000.0);
        let allocator = ContributionAllocator::new(&params);
        let mut state = AccountState { medical: 1_000.0, ..AccountState::new() };

        let row = allocator.allocate_year(&mut state, 58, 60_000.0);

        let band = params.statutory.allocation.for_age(58);
        assert_relative_eq!(row.special_allocation, row.total_contribution * band.special, max_relative = 1e-12);
        assert_eq!(row.medical_allocation, 0.0);
        // Medical share plus interest on the capped balance
        let medical_share = row.total_contribution - row.ordinary_allocation - row.special_allocation;
        assert_relative_eq!(row.retirement_allocation, medical_share, max_relative = 1e-12);
        assert_relative_eq!(state.retirement, medical_share * 1.04 + 40.0, max_relative = 1e-9);
    }
}
