//! Post-run invariant checks over the working-year trace
//!
//! Breaches are reported as data so the caller decides whether they are
//! fatal; nothing here panics or returns an error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cashflows::YearResult;

/// Absolute tolerance for all comparisons
pub const VALIDATION_TOLERANCE: f64 = 1e-6;

/// A single invariant breach
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Violation {
    #[error("Year {year} (age {age}): medical balance {balance:.2} exceeds cap {cap:.2}")]
    MedicalAboveCap { year: i32, age: u32, balance: f64, cap: f64 },

    #[error("Year {year} (age {age}): {account} balance is negative ({balance:.6})")]
    NegativeBalance { year: i32, age: u32, account: &'static str, balance: f64 },

    #[error("Year {year} (age {age}): allocations {allocated:.2} do not match contribution {contributed:.2}")]
    AllocationMismatch { year: i32, age: u32, allocated: f64, contributed: f64 },

    #[error("Recorded contributions {recorded:.2} do not match reported total {reported:.2}")]
    ContributionTotalMismatch { recorded: f64, reported: f64 },
}

/// Outcome of validating one run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub violations: Vec<String>,
}

impl ValidationReport {
    fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            is_valid: violations.is_empty(),
            violations: violations.iter().map(ToString::to_string).collect(),
        }
    }
}

const ACCOUNT_NAMES: [&str; 4] = ["ordinary", "special", "medical", "retirement"];

/// Collect every invariant breach in the trace
pub fn find_violations(years: &[YearResult], reported_total_contribution: f64) -> Vec<Violation> {
    let mut violations = Vec::new();

    for row in years {
        if row.medical_balance > row.medical_cap + VALIDATION_TOLERANCE {
            violations.push(Violation::MedicalAboveCap {
                year: row.year,
                age: row.age,
                balance: row.medical_balance,
                cap: row.medical_cap,
            });
        }

        for (account, balance) in ACCOUNT_NAMES.into_iter().zip(row.balances()) {
            if balance < -VALIDATION_TOLERANCE {
                violations.push(Violation::NegativeBalance {
                    year: row.year,
                    age: row.age,
                    account,
                    balance,
                });
            }
        }

        let allocated = row.total_allocated();
        if (allocated - row.total_contribution).abs() > VALIDATION_TOLERANCE {
            violations.push(Violation::AllocationMismatch {
                year: row.year,
                age: row.age,
                allocated,
                contributed: row.total_contribution,
            });
        }
    }

    let recorded: f64 = years.iter().map(|r| r.total_contribution).sum();
    let tolerance = VALIDATION_TOLERANCE * recorded.abs().max(1.0);
    if (recorded - reported_total_contribution).abs() > tolerance {
        violations.push(Violation::ContributionTotalMismatch {
            recorded,
            reported: reported_total_contribution,
        });
    }

    violations
}

/// Validate the trace against the reported contribution total
pub fn validate(years: &[YearResult], reported_total_contribution: f64) -> ValidationReport {
    let violations = find_violations(years, reported_total_contribution);
    for v in &violations {
        log::warn!("Validation: {}", v);
    }
    ValidationReport::from_violations(violations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_row(age: u32) -> YearResult {
        let mut row = YearResult::new(2025 + age as i32, age);
        row.total_contribution = 100.0;
        row.ordinary_allocation = 60.0;
        row.special_allocation = 20.0;
        row.medical_allocation = 20.0;
        row.ordinary_balance = 60.0;
        row.special_balance = 20.0;
        row.medical_balance = 20.0;
        row.medical_cap = 50.0;
        row
    }

    #[test]
    fn test_clean_trace() {
        let years = vec![good_row(30), good_row(31)];
        let report = validate(&years, 200.0);
        assert!(report.is_valid);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_cap_breach_reported() {
        let mut row = good_row(30);
        row.medical_balance = 51.0;
        let violations = find_violations(&[row], 100.0);
        assert_eq!(violations.len(), 1);
        assert!(matches!(violations[0], Violation::MedicalAboveCap { age: 30, .. }));
    }

    #[test]
    fn test_cap_within_tolerance_is_fine() {
        let mut row = good_row(30);
        row.medical_balance = 50.0 + 1e-9;
        assert!(find_violations(&[row], 100.0).is_empty());
    }

    #[test]
    fn test_negative_balance_reported() {
        let mut row = good_row(30);
        row.retirement_balance = -1.0;
        let report = validate(&[row], 100.0);
        assert!(!report.is_valid);
        assert!(report.violations[0].contains("retirement"));
    }

    #[test]
    fn test_total_mismatch_reported() {
        let years = vec![good_row(30)];
        let violations = find_violations(&years, 150.0);
        assert_eq!(
            violations,
            vec![Violation::ContributionTotalMismatch { recorded: 100.0, reported: 150.0 }]
        );
    }

    #[test]
    fn test_allocation_mismatch_reported() {
        let mut row = good_row(30);
        row.special_allocation = 0.0;
        let violations = find_violations(&[row], 100.0);
        assert!(matches!(violations[0], Violation::AllocationMismatch { .. }));
    }
}
