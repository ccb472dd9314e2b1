//! Output structures for lifecycle runs

use serde::{Deserialize, Serialize};

use super::annuity::AnnuityResult;
use super::irr::IrrSolution;
use super::terminal::TerminalValue;
use super::validation::ValidationReport;
use crate::member::AnnuityPlan;

/// Snapshot of one working year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearResult {
    // Timing
    pub year: i32,
    pub age: u32,

    // Contributions
    pub salary: f64,
    pub contribution_base: f64,
    pub employee_contribution: f64,
    pub employer_contribution: f64,
    pub total_contribution: f64,

    // Allocations actually applied (after overflow)
    pub ordinary_allocation: f64,
    pub special_allocation: f64,
    pub medical_allocation: f64,
    pub retirement_allocation: f64,

    pub interest_credited: f64,

    // End-of-year balances
    pub ordinary_balance: f64,
    pub special_balance: f64,
    pub medical_balance: f64,
    pub retirement_balance: f64,

    /// Medical cap applied this year
    pub medical_cap: f64,
    /// Amount redirected away from the medical account this year
    pub overflow: f64,
}

impl YearResult {
    pub fn new(year: i32, age: u32) -> Self {
        Self {
            year,
            age,
            salary: 0.0,
            contribution_base: 0.0,
            employee_contribution: 0.0,
            employer_contribution: 0.0,
            total_contribution: 0.0,
            ordinary_allocation: 0.0,
            special_allocation: 0.0,
            medical_allocation: 0.0,
            retirement_allocation: 0.0,
            interest_credited: 0.0,
            ordinary_balance: 0.0,
            special_balance: 0.0,
            medical_balance: 0.0,
            retirement_balance: 0.0,
            medical_cap: 0.0,
            overflow: 0.0,
        }
    }

    /// Sum of the four applied allocations
    pub fn total_allocated(&self) -> f64 {
        self.ordinary_allocation + self.special_allocation + self.medical_allocation + self.retirement_allocation
    }

    pub fn balances(&self) -> [f64; 4] {
        [
            self.ordinary_balance,
            self.special_balance,
            self.medical_balance,
            self.retirement_balance,
        ]
    }
}

/// What the consolidation event moved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationOutcome {
    pub year: i32,
    pub age: u32,
    /// Target amount for the retirement account
    pub target: f64,
    pub from_special: f64,
    pub from_ordinary: f64,
    /// Total moved into the retirement account by the event
    pub moved_to_retirement: f64,
    pub retirement_balance: f64,
    pub ordinary_remaining: f64,
    pub special_remaining: f64,
    /// Ordinary balance paid out as cash (0 when not permitted)
    pub cash_withdrawn: f64,
}

/// Aggregate outcome of one lifecycle run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveResult {
    pub plan: AnnuityPlan,

    /// Working-year trace
    pub years: Vec<YearResult>,
    pub consolidation: ConsolidationOutcome,
    pub annuity: AnnuityResult,
    pub terminal: TerminalValue,

    pub total_employee_contribution: f64,
    pub total_employer_contribution: f64,
    pub total_contribution: f64,

    /// Annuity payouts plus terminal value
    pub total_benefits: f64,
    pub terminal_value: f64,
    /// Cash taken at consolidation, reported separately from benefits
    pub cash_withdrawn: f64,

    /// Personal rate of return, `None` when no root exists
    pub personal_irr: Option<IrrSolution>,
    pub reference_discount_rate: f64,
    pub npv_at_reference: f64,

    /// Monthly signed cash flows used for IRR and NPV
    pub cashflows: Vec<f64>,

    pub validation: ValidationReport,
}

impl ComprehensiveResult {
    /// Get summary statistics
    pub fn summary(&self) -> RunSummary {
        let final_year = self.years.last();
        RunSummary {
            plan: self.plan,
            working_years: self.years.len() as u32,
            payout_months: self.annuity.payouts.len() as u32,
            total_contribution: self.total_contribution,
            total_employee_contribution: self.total_employee_contribution,
            retirement_pool: self.annuity.pool,
            first_payout: self.annuity.payouts.first().copied().unwrap_or(0.0),
            last_payout: self.annuity.payouts.last().copied().unwrap_or(0.0),
            total_paid: self.annuity.total_paid,
            terminal_value: self.terminal_value,
            total_benefits: self.total_benefits,
            cash_withdrawn: self.cash_withdrawn,
            final_medical_balance: final_year.map(|y| y.medical_balance).unwrap_or(0.0),
            annual_irr: self.personal_irr.as_ref().map(|s| s.annual_rate),
            npv_at_reference: self.npv_at_reference,
            is_valid: self.validation.is_valid,
        }
    }
}

/// Headline figures for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub plan: AnnuityPlan,
    pub working_years: u32,
    pub payout_months: u32,
    pub total_contribution: f64,
    pub total_employee_contribution: f64,
    pub retirement_pool: f64,
    pub first_payout: f64,
    pub last_payout: f64,
    pub total_paid: f64,
    pub terminal_value: f64,
    pub total_benefits: f64,
    pub cash_withdrawn: f64,
    pub final_medical_balance: f64,
    pub annual_irr: Option<f64>,
    pub npv_at_reference: f64,
    pub is_valid: bool,
}
