//! Lifecycle engine: working years, consolidation, payouts, return on contributions

use super::allocation::{record_balances, ContributionAllocator};
use super::annuity::{decumulate, AnnuityTerms};
use super::cashflows::{ComprehensiveResult, ConsolidationOutcome, YearResult};
use super::consolidation::consolidate;
use super::irr::{calculate_irr, npv_at_annual_rate};
use super::state::AccountState;
use super::terminal::project_terminal_value;
use super::validation::validate;
use crate::error::ConfigError;
use crate::member::{CashflowView, ParameterSet};

/// Cash-flow periods per year (monthly)
pub const PERIODS_PER_YEAR: u32 = 12;

/// Runs one member's lifecycle.
///
/// The engine only borrows the parameter set; every call to [`run`] starts
/// from fresh, zeroed account state, so one engine can be reused and runs
/// never share balances.
///
/// [`run`]: LifecycleEngine::run
pub struct LifecycleEngine<'a> {
    params: &'a ParameterSet,
}

impl<'a> LifecycleEngine<'a> {
    /// Check the parameter set and create an engine for it
    pub fn new(params: &'a ParameterSet) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &ParameterSet {
        self.params
    }

    /// Run the full lifecycle
    pub fn run(&self) -> Result<ComprehensiveResult, ConfigError> {
        let params = self.params;
        let mut state = AccountState::new();

        let (years, consolidation) = self.run_working_years(&mut state)?;

        // Payout pool is the retirement balance at payout start
        let terms = AnnuityTerms::from_params(params);
        let annuity = decumulate(state.retirement, &terms);
        state.retirement = 0.0;

        let terminal = project_terminal_value(params, &state);

        let total_employee_contribution: f64 = years.iter().map(|y| y.employee_contribution).sum();
        let total_employer_contribution: f64 = years.iter().map(|y| y.employer_contribution).sum();
        let total_contribution = total_employee_contribution + total_employer_contribution;

        let cashflows = self.assemble_cashflows(&years, &consolidation, &annuity.payouts, terminal.total);

        let personal_irr = calculate_irr(&cashflows, PERIODS_PER_YEAR);
        if personal_irr.is_none() {
            log::warn!("No personal IRR for this cash-flow sequence");
        }
        let npv_at_reference = npv_at_annual_rate(&cashflows, params.reference_discount_rate, PERIODS_PER_YEAR);

        let validation = validate(&years, total_contribution);

        let result = ComprehensiveResult {
            plan: params.plan,
            total_benefits: annuity.total_paid + terminal.total,
            terminal_value: terminal.total,
            cash_withdrawn: consolidation.cash_withdrawn,
            years,
            consolidation,
            annuity,
            terminal,
            total_employee_contribution,
            total_employer_contribution,
            total_contribution,
            personal_irr,
            reference_discount_rate: params.reference_discount_rate,
            npv_at_reference,
            cashflows,
            validation,
        };

        log::info!(
            "Run complete: plan {}, contributions {:.2}, pool {:.2}, benefits {:.2}, IRR {}",
            result.plan,
            result.total_contribution,
            result.annuity.pool,
            result.total_benefits,
            result
                .personal_irr
                .map(|s| format!("{:.4}%", s.annual_rate * 100.0))
                .unwrap_or_else(|| "n/a".to_string())
        );

        Ok(result)
    }

    /// Contribution years from start age up to payout start.
    ///
    /// In the consolidation year the event runs after that year's
    /// allocation, interest and post-interest overflow, so overflow from that
    /// year has already reached the retirement account.
    fn run_working_years(
        &self,
        state: &mut AccountState,
    ) -> Result<(Vec<YearResult>, ConsolidationOutcome), ConfigError> {
        let params = self.params;
        let allocator = ContributionAllocator::new(params);
        let mut years = Vec::with_capacity(params.working_years() as usize);
        let mut consolidation = None;

        for (index, age) in (params.start_age..params.retirement_age).enumerate() {
            let salary = params.salary.salary_for(index as u32);
            let mut row = allocator.allocate_year(state, age, salary);

            if age == params.consolidation_age {
                consolidation = Some(consolidate(params, state));
                record_balances(&mut row, state);
            }

            years.push(row);
        }

        let consolidation = consolidation.ok_or(ConfigError::InvalidAges {
            start: params.start_age,
            consolidation: params.consolidation_age,
            retirement: params.retirement_age,
            end: params.end_age,
        })?;

        Ok((years, consolidation))
    }

    /// Monthly signed flows: contributions out, consolidation cash and
    /// payouts in, terminal value added to the last month
    fn assemble_cashflows(
        &self,
        years: &[YearResult],
        consolidation: &ConsolidationOutcome,
        payouts: &[f64],
        terminal_value: f64,
    ) -> Vec<f64> {
        let periods = PERIODS_PER_YEAR as usize;
        let mut cashflows = Vec::with_capacity(years.len() * periods + payouts.len());

        for row in years {
            let outflow = match self.params.cashflow_view {
                CashflowView::Employee => row.employee_contribution,
                CashflowView::Combined => row.total_contribution,
            };
            let monthly = -outflow / PERIODS_PER_YEAR as f64;
            cashflows.extend(std::iter::repeat(monthly).take(periods));

            if row.age == consolidation.age {
                if let Some(last) = cashflows.last_mut() {
                    *last += consolidation.cash_withdrawn;
                }
            }
        }

        cashflows.extend_from_slice(payouts);
        if let Some(last) = cashflows.last_mut() {
            *last += terminal_value;
        }

        cashflows
    }
}

/// Validate `params` and run one lifecycle
pub fn simulate(params: &ParameterSet) -> Result<ComprehensiveResult, ConfigError> {
    LifecycleEngine::new(params)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::ScheduleFn;
    use crate::member::{AnnuityPlan, SalaryPath, TargetPolicy};
    use approx::assert_relative_eq;

    #[test]
    fn test_projection_runs() {
        let params = ParameterSet::standard();
        let result = simulate(&params).unwrap();

        assert_eq!(result.years.len(), 35);
        assert_eq!(result.years[0].age, 30);
        assert_eq!(result.years[0].year, 2025);
        assert_eq!(result.annuity.payouts.len(), 300);
        assert_eq!(result.cashflows.len(), 35 * 12 + 300);
        assert!(result.validation.is_valid, "{:?}", result.validation.violations);
        assert!(result.personal_irr.is_some());
    }

    #[test]
    fn test_pool_is_retirement_balance_at_payout_start() {
        let params = ParameterSet::standard();
        let result = simulate(&params).unwrap();

        let last = result.years.last().unwrap();
        assert_eq!(result.annuity.pool, last.retirement_balance);
        assert!(result.annuity.pool > result.consolidation.target);
    }

    #[test]
    fn test_consolidation_recorded_in_its_year() {
        let params = ParameterSet::standard();
        let result = simulate(&params).unwrap();

        let row = result.years.iter().find(|y| y.age == 55).unwrap();
        assert_eq!(result.consolidation.year, row.year);
        assert_eq!(row.retirement_balance, result.consolidation.retirement_balance);
        assert_eq!(row.special_balance, result.consolidation.special_remaining);
    }

    #[test]
    fn test_consolidation_year_interest_overflow_goes_to_retirement() {
        let mut params = ParameterSet {
            salary: SalaryPath::Growth { start: 60_000.0, rate: 0.0 },
            target: TargetPolicy::Custom(0.0),
            ..ParameterSet::standard()
        };
        params.statutory.medical_cap = ScheduleFn::constant(10_000.0);

        let result = simulate(&params).unwrap();

        let before = result.years.iter().find(|y| y.age == 54).unwrap();
        let row = result.years.iter().find(|y| y.age == 55).unwrap();

        // Medical sits at the cap, so the whole medical share overflows and
        // the year's interest on the cap overflows after crediting
        assert_eq!(before.retirement_balance, 0.0);
        assert_eq!(row.medical_allocation, 0.0);
        assert_eq!(result.consolidation.moved_to_retirement, 0.0);
        assert_relative_eq!(
            row.retirement_balance,
            row.retirement_allocation * 1.04 + 10_000.0 * 0.04,
            max_relative = 1e-9
        );
        // Special keeps its own allocation and nothing else
        assert!(row.special_allocation > 0.0);
        assert_relative_eq!(
            row.special_balance,
            (before.special_balance + row.special_allocation) * 1.04,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_cash_withdrawal_enters_cashflows() {
        let params = ParameterSet {
            allow_cash_withdrawal: true,
            target: TargetPolicy::Basic,
            ..ParameterSet::standard()
        };
        let result = simulate(&params).unwrap();

        assert!(result.cash_withdrawn > 0.0);
        let month = (55 - 30 + 1) * 12 - 1;
        let contribution = result.years[25].employee_contribution / 12.0;
        assert_relative_eq!(
            result.cashflows[month],
            result.cash_withdrawn - contribution,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_combined_view_lowers_irr() {
        let employee = simulate(&ParameterSet::standard()).unwrap();
        let combined = simulate(&ParameterSet {
            cashflow_view: CashflowView::Combined,
            ..ParameterSet::standard()
        })
        .unwrap();

        let e = employee.personal_irr.unwrap().annual_rate;
        let c = combined.personal_irr.unwrap().annual_rate;
        assert!(c < e);
    }

    #[test]
    fn test_config_error_before_run() {
        let params = ParameterSet {
            consolidation_age: 70,
            ..ParameterSet::standard()
        };
        assert!(matches!(simulate(&params), Err(ConfigError::InvalidAges { .. })));
    }

    #[test]
    fn test_all_plans_run() {
        for plan in AnnuityPlan::ALL {
            let params = ParameterSet { plan, ..ParameterSet::standard() };
            let result = simulate(&params).unwrap();
            assert_eq!(result.annuity.plan, plan);
            assert!(result.validation.is_valid);
        }
    }

    #[test]
    fn test_terminal_value_on_last_cashflow() {
        let result = simulate(&ParameterSet::standard()).unwrap();
        let last_payout = *result.annuity.payouts.last().unwrap();
        assert_relative_eq!(
            *result.cashflows.last().unwrap(),
            last_payout + result.terminal_value,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            result.total_benefits,
            result.annuity.total_paid + result.terminal_value,
            max_relative = 1e-12
        );
    }
}
